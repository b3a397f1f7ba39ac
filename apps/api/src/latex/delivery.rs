//! Delivery of tailored output.
//!
//! The tailored resume and cover letter arrive from upstream as opaque text.
//! When the user's original resume was LaTeX, both are compiled to PDF in the
//! container; if either compilation fails, both are handed back as text so
//! the caller always receives something usable.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::latex::compiler::LatexCompiler;
use crate::resume::is_latex_content;

/// One delivered document: compiled PDF (base64) or the text as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum Deliverable {
    Pdf(String),
    Text(String),
}

impl Deliverable {
    pub fn pdf(bytes: &[u8]) -> Self {
        Deliverable::Pdf(STANDARD.encode(bytes))
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Deliverable::Pdf(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedOutput {
    pub tailored_resume: Deliverable,
    pub cover_letter: Deliverable,
}

/// Compiles the tailored documents when `original_resume` is LaTeX.
/// Never fails: compile errors are logged and the text is returned instead.
pub async fn finalize(
    compiler: &LatexCompiler,
    original_resume: &str,
    tailored_resume: &str,
    cover_letter: &str,
) -> FinalizedOutput {
    let as_text = || FinalizedOutput {
        tailored_resume: Deliverable::Text(tailored_resume.to_string()),
        cover_letter: Deliverable::Text(cover_letter.to_string()),
    };

    if !is_latex_content(original_resume) {
        return as_text();
    }

    info!("Original resume is LaTeX, compiling tailored output");
    let compiled = tokio::try_join!(
        compiler.compile(tailored_resume),
        compiler.compile(cover_letter)
    );

    match compiled {
        Ok((resume_pdf, letter_pdf)) => FinalizedOutput {
            tailored_resume: Deliverable::pdf(&resume_pdf),
            cover_letter: Deliverable::pdf(&letter_pdf),
        },
        Err(e) => {
            error!("Failed to compile tailored output, returning text: {}", e);
            as_text()
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::latex::compiler::test_support::{write_script, SERIAL};
    use crate::latex::compiler::PdfLatex;

    const LATEX: &str = "\\documentclass{article}\n\\begin{document}\nHi\n\\end{document}";

    /// Writes a PDF only for documents that close `document`.
    const FAKE_PDFLATEX: &str = r#"
grep -q 'end{document}' main.tex || { echo "! Emergency stop."; exit 1; }
printf '%%PDF-1.4' > main.pdf
"#;

    fn compiler(bin_dir: &Path, root: &Path) -> LatexCompiler {
        let bin = write_script(bin_dir, "pdflatex", FAKE_PDFLATEX);
        LatexCompiler::new(root, Arc::new(PdfLatex::new(bin, Duration::from_secs(10))))
    }

    #[tokio::test]
    async fn test_plain_original_returns_text() {
        let root = tempfile::tempdir().unwrap();
        let compiler = LatexCompiler::new(
            root.path(),
            Arc::new(PdfLatex::new("/definitely/not/pdflatex", Duration::from_secs(1))),
        );

        let out = finalize(&compiler, "Jane Doe\nEXPERIENCE", LATEX, "Dear team").await;
        assert_eq!(out.tailored_resume, Deliverable::Text(LATEX.to_string()));
        assert_eq!(out.cover_letter, Deliverable::Text("Dear team".to_string()));
    }

    #[tokio::test]
    async fn test_latex_original_compiles_both() {
        let _guard = SERIAL.lock().await;
        let bin_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();

        let out = finalize(&compiler(bin_dir.path(), root.path()), LATEX, LATEX, LATEX).await;
        assert_eq!(out.tailored_resume, Deliverable::pdf(b"%PDF-1.4"));
        assert!(out.cover_letter.is_pdf());
    }

    #[tokio::test]
    async fn test_one_failure_falls_back_to_text() {
        let _guard = SERIAL.lock().await;
        let bin_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let broken_letter = "\\documentclass{letter}\n\\begin{document}\nDear team";

        let out = finalize(&compiler(bin_dir.path(), root.path()), LATEX, LATEX, broken_letter).await;
        assert_eq!(out.tailored_resume, Deliverable::Text(LATEX.to_string()));
        assert_eq!(out.cover_letter, Deliverable::Text(broken_letter.to_string()));
    }

    #[test]
    fn test_deliverable_wire_shape() {
        let json = serde_json::to_value(Deliverable::pdf(b"%PDF")).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "pdf", "content": "JVBERg==" }));
    }
}
