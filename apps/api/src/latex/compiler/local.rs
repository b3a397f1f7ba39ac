//! Host pdflatex toolchain.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::process::{run_with_timeout, ProcessOutput};
use super::{CompileError, Toolchain, MAIN_TEX};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct PdfLatex {
    binary: PathBuf,
    timeout: Duration,
}

impl PdfLatex {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.pdflatex_path, config.local_timeout)
    }
}

#[async_trait]
impl Toolchain for PdfLatex {
    fn name(&self) -> &str {
        "pdflatex"
    }

    async fn invoke(&self, workdir: &Path) -> Result<ProcessOutput, CompileError> {
        let mut output_dir = OsString::from("-output-directory=");
        output_dir.push(workdir);

        let mut cmd = Command::new(&self.binary);
        cmd.arg(output_dir)
            .arg("-interaction=nonstopmode")
            .arg("-no-shell-escape")
            .arg(MAIN_TEX)
            .current_dir(workdir);

        Ok(run_with_timeout(cmd, self.name(), self.timeout).await?)
    }

    fn pdf_path(&self, workdir: &Path) -> PathBuf {
        workdir.join("main.pdf")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::latex::compiler::test_support::{entries, write_script, SERIAL};
    use crate::latex::compiler::LatexCompiler;
    use crate::latex::templates::SELF_TEST_DOCUMENT;

    /// Behaves like pdflatex for well-formed input and like a failed run
    /// when `\end{document}` is missing.
    const FAKE_PDFLATEX: &str = r#"
for arg in "$@"; do
  case "$arg" in
    -output-directory=*) out="${arg#-output-directory=}" ;;
  esac
done
if ! grep -q 'end{document}' "$out/main.tex"; then
  echo "! Emergency stop."
  echo "*** (job aborted, no legal end found)"
  exit 1
fi
printf '%%PDF-1.4 fake\n' > "$out/main.pdf"
echo "Output written on main.pdf (1 page)."
"#;

    fn compiler(bin: &Path, root: &Path, timeout: Duration) -> LatexCompiler {
        LatexCompiler::new(root, Arc::new(PdfLatex::new(bin, timeout)))
    }

    #[tokio::test]
    async fn test_compiles_valid_document() {
        let _guard = SERIAL.lock().await;
        let bin_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let bin = write_script(bin_dir.path(), "pdflatex", FAKE_PDFLATEX);

        let pdf = compiler(&bin, root.path(), Duration::from_secs(10))
            .compile(SELF_TEST_DOCUMENT)
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_end_document_fails_with_log() {
        let _guard = SERIAL.lock().await;
        let bin_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let bin = write_script(bin_dir.path(), "pdflatex", FAKE_PDFLATEX);

        let broken = SELF_TEST_DOCUMENT.replace(r"\end{document}", "");
        let err = compiler(&bin, root.path(), Duration::from_secs(10))
            .compile(&broken)
            .await
            .unwrap_err();

        assert!(matches!(err, CompileError::Toolchain { .. }));
        assert!(err.to_string().contains("Emergency stop"));
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_timeout_kills_compiler() {
        let _guard = SERIAL.lock().await;
        let bin_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let bin = write_script(bin_dir.path(), "pdflatex", "sleep 10\n");

        let err = compiler(&bin, root.path(), Duration::from_millis(300))
            .compile(SELF_TEST_DOCUMENT)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let _guard = SERIAL.lock().await;
        let root = tempfile::tempdir().unwrap();
        let err = compiler(
            Path::new("/definitely/not/pdflatex"),
            root.path(),
            Duration::from_secs(1),
        )
        .compile(SELF_TEST_DOCUMENT)
        .await
        .unwrap_err();

        assert!(matches!(err, CompileError::Spawn { .. }));
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_source_is_passed_by_file_only() {
        let _guard = SERIAL.lock().await;
        let bin_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let args_log = bin_dir.path().join("args.log");
        let script = format!(
            "echo \"$@\" > '{}'\nout=\"$(pwd)\"\nprintf '%%PDF' > \"$out/main.pdf\"\n",
            args_log.display()
        );
        let bin = write_script(bin_dir.path(), "pdflatex", &script);

        compiler(&bin, root.path(), Duration::from_secs(10))
            .compile(r"\documentclass{article}$(echo injected)\begin{document}x\end{document}")
            .await
            .unwrap();

        let args = std::fs::read_to_string(args_log).unwrap();
        assert!(args.contains("-interaction=nonstopmode"));
        assert!(args.trim_end().ends_with("main.tex"));
        assert!(!args.contains("documentclass"));
    }
}
