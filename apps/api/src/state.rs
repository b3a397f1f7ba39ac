use std::sync::Arc;

use crate::config::Config;
use crate::latex::compiler::{DockerLatex, LatexCompiler, PdfLatex};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
    /// Host pdflatex.
    pub local: LatexCompiler,
    /// Containerized pdflatex; builds its image on first use.
    pub container: LatexCompiler,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let local = LatexCompiler::new(&config.scratch_dir, Arc::new(PdfLatex::from_config(&config)));
        let container =
            LatexCompiler::new(&config.scratch_dir, Arc::new(DockerLatex::from_config(&config)));
        Self {
            config,
            local,
            container,
        }
    }
}
