//! Compiler Interface: turns LaTeX source into PDF bytes.
//!
//! Every compilation runs through the same stages:
//!
//! 1. PREPARING: create a unique scratch directory and write `main.tex`
//! 2. provision the toolchain (a no-op for the host install)
//! 3. COMPILING: run the toolchain with a timeout, capturing its output
//! 4. SUCCEEDED when it exits zero *and* the PDF exists, FAILED otherwise
//!
//! The scratch directory is removed after both outcomes.
//!
//! Two toolchains exist: [`PdfLatex`] runs a host install, [`DockerLatex`]
//! runs a container image it can build on first use.

pub mod container;
pub mod local;
pub mod process;
pub mod scratch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};

pub use container::DockerLatex;
pub use local::PdfLatex;
pub use process::{ProcessError, ProcessOutput};
pub use scratch::ScratchDir;

use crate::latex::templates::SELF_TEST_DOCUMENT;

/// Name of the source file written into every scratch directory.
pub const MAIN_TEX: &str = "main.tex";

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Failed to prepare scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with status {code:?}. Output: {output}")]
    Toolchain {
        program: String,
        code: Option<i32>,
        output: String,
    },

    #[error("PDF was not created. Output: {output}")]
    MissingPdf { output: String },

    #[error("{program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("Toolchain provisioning failed: {0}")]
    Provisioning(#[from] ProvisionError),

    #[error("Failed to read compiled PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
}

impl CompileError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_provisioning(&self) -> bool {
        matches!(self, Self::Provisioning(_))
    }
}

impl From<ProcessError> for CompileError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Spawn { program, source } => Self::Spawn { program, source },
            ProcessError::Timeout { program, after } => Self::Timeout { program, after },
        }
    }
}

/// Failures while making a toolchain ready to compile.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Build definition not found at {}", .0.display())]
    MissingBuildDefinition(PathBuf),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Image build exited with status {code:?}. Output: {output}")]
    BuildFailed { code: Option<i32>, output: String },

    #[error("Image build timed out after {after:?}")]
    BuildTimeout { after: Duration },
}

// ────────────────────────────────────────────────────────────────────────────
// Toolchain seam
// ────────────────────────────────────────────────────────────────────────────

/// Something that can compile `main.tex` inside a working directory.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Short name for logs and error messages.
    fn name(&self) -> &str;

    /// Makes the toolchain ready. Called before every compilation, so
    /// implementations should be cheap when already provisioned.
    async fn provision(&self) -> Result<(), ProvisionError> {
        Ok(())
    }

    /// Compiles `workdir/main.tex`. A non-zero exit is returned as output,
    /// not as an error.
    async fn invoke(&self, workdir: &Path) -> Result<ProcessOutput, CompileError>;

    /// Where the compiled PDF is expected after [`Toolchain::invoke`].
    fn pdf_path(&self, workdir: &Path) -> PathBuf;
}

// ────────────────────────────────────────────────────────────────────────────
// Compiler
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct LatexCompiler {
    scratch_root: PathBuf,
    toolchain: Arc<dyn Toolchain>,
}

impl std::fmt::Debug for LatexCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatexCompiler")
            .field("scratch_root", &self.scratch_root)
            .field("toolchain", &self.toolchain.name())
            .finish()
    }
}

impl LatexCompiler {
    pub fn new(scratch_root: impl Into<PathBuf>, toolchain: Arc<dyn Toolchain>) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            toolchain,
        }
    }

    pub fn toolchain_name(&self) -> &str {
        self.toolchain.name()
    }

    /// Compiles `latex` and returns the PDF bytes.
    ///
    /// Compilations are independent; concurrent calls never share a
    /// scratch directory.
    pub async fn compile(&self, latex: &str) -> Result<Vec<u8>, CompileError> {
        let scratch = ScratchDir::create(&self.scratch_root)
            .await
            .map_err(CompileError::Scratch)?;

        let outcome = self.compile_in(&scratch, latex).await;
        match &outcome {
            Ok(pdf) => info!(
                "{} compilation succeeded ({} bytes)",
                self.toolchain.name(),
                pdf.len()
            ),
            Err(e) => warn!("{} compilation failed: {}", self.toolchain.name(), e),
        }

        scratch.cleanup().await;
        outcome
    }

    async fn compile_in(&self, scratch: &ScratchDir, latex: &str) -> Result<Vec<u8>, CompileError> {
        scratch
            .write(MAIN_TEX, latex)
            .await
            .map_err(CompileError::Scratch)?;

        self.toolchain.provision().await?;

        let workdir = scratch.path();
        let output = self.toolchain.invoke(workdir).await?;
        if !output.success() {
            return Err(CompileError::Toolchain {
                program: self.toolchain.name().to_string(),
                code: output.code(),
                output: output.combined(),
            });
        }

        match tokio::fs::read(self.toolchain.pdf_path(workdir)).await {
            Ok(pdf) => Ok(pdf),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CompileError::MissingPdf {
                output: output.combined(),
            }),
            Err(e) => Err(CompileError::ReadPdf(e)),
        }
    }

    /// Compiles a minimal known-good document; `true` means the toolchain works.
    pub async fn self_test(&self) -> bool {
        match self.compile(SELF_TEST_DOCUMENT).await {
            Ok(_) => {
                info!("{} self-test passed", self.toolchain.name());
                true
            }
            Err(e) => {
                error!("{} self-test failed: {}", self.toolchain.name(), e);
                false
            }
        }
    }
}
