use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub pdflatex_path: PathBuf,
    /// Parent directory of the per-compilation scratch directories.
    pub scratch_dir: PathBuf,
    pub local_timeout: Duration,
    pub docker_binary: PathBuf,
    pub docker_image: String,
    pub dockerfile: PathBuf,
    pub docker_context: PathBuf,
    pub container_timeout: Duration,
    pub image_build_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let cwd = std::env::current_dir().context("Cannot determine working directory")?;
        Self::from_lookup(cwd, |key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source, resolving
    /// relative defaults against `cwd`.
    pub fn from_lookup(cwd: PathBuf, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path_or = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);

        Ok(Config {
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            pdflatex_path: path_or("PDFLATEX_PATH", PathBuf::from("pdflatex")),
            scratch_dir: path_or("LATEX_SCRATCH_DIR", cwd.join("temp")),
            local_timeout: seconds(&lookup, "LATEX_LOCAL_TIMEOUT_SECS", 30)?,
            docker_binary: path_or("DOCKER_BINARY", PathBuf::from("docker")),
            docker_image: lookup("LATEX_DOCKER_IMAGE")
                .unwrap_or_else(|| "resume-builder-latex".to_string()),
            dockerfile: path_or("LATEX_DOCKERFILE", cwd.join("Dockerfile.latex")),
            docker_context: path_or("LATEX_DOCKER_CONTEXT", cwd.clone()),
            container_timeout: seconds(&lookup, "LATEX_CONTAINER_TIMEOUT_SECS", 60)?,
            image_build_timeout: seconds(&lookup, "LATEX_IMAGE_BUILD_TIMEOUT_SECS", 300)?,
        })
    }
}

fn seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<Duration> {
    let secs = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}
