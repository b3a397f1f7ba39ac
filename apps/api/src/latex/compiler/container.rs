//! Containerized toolchain: runs pdflatex inside a Docker image.
//!
//! The image is checked before every compilation and built from the
//! configured Dockerfile when absent. The scratch directory is mounted at
//! `/workspace`; the image's entrypoint reads `MAIN_LATEX_FILE` and writes
//! the PDF into `OUTPUT_DIR`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use super::process::{run_with_timeout, ProcessError, ProcessOutput};
use super::{CompileError, ProvisionError, Toolchain, MAIN_TEX};
use crate::config::Config;

/// Bound on the short housekeeping calls (`image inspect`, `rm -f`).
const INSPECT_TIMEOUT: Duration = Duration::from_secs(10);
const WORKSPACE: &str = "/workspace";
const OUTPUT_SUBDIR: &str = "output";

#[derive(Debug, Clone)]
pub struct DockerLatex {
    docker: PathBuf,
    image: String,
    dockerfile: PathBuf,
    build_context: PathBuf,
    compile_timeout: Duration,
    build_timeout: Duration,
}

impl DockerLatex {
    pub fn new(
        docker: impl Into<PathBuf>,
        image: impl Into<String>,
        dockerfile: impl Into<PathBuf>,
        build_context: impl Into<PathBuf>,
    ) -> Self {
        Self {
            docker: docker.into(),
            image: image.into(),
            dockerfile: dockerfile.into(),
            build_context: build_context.into(),
            compile_timeout: Duration::from_secs(60),
            build_timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeouts(mut self, compile: Duration, build: Duration) -> Self {
        self.compile_timeout = compile;
        self.build_timeout = build;
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.docker_binary,
            config.docker_image.clone(),
            &config.dockerfile,
            &config.docker_context,
        )
        .with_timeouts(config.container_timeout, config.image_build_timeout)
    }

    async fn image_exists(&self) -> bool {
        let mut cmd = Command::new(&self.docker);
        cmd.args(["image", "inspect"]).arg(&self.image);

        match run_with_timeout(cmd, "docker image inspect", INSPECT_TIMEOUT).await {
            Ok(output) => output.success(),
            Err(e) => {
                warn!("Image probe for {} failed: {}", self.image, e);
                false
            }
        }
    }

    async fn build_image(&self) -> Result<(), ProvisionError> {
        if !tokio::fs::try_exists(&self.dockerfile).await.unwrap_or(false) {
            return Err(ProvisionError::MissingBuildDefinition(self.dockerfile.clone()));
        }

        info!(
            "Building image {} from {}",
            self.image,
            self.dockerfile.display()
        );
        let mut cmd = Command::new(&self.docker);
        cmd.arg("build")
            .arg("-f")
            .arg(&self.dockerfile)
            .arg("-t")
            .arg(&self.image)
            .arg(&self.build_context);

        let output = run_with_timeout(cmd, "docker build", self.build_timeout)
            .await
            .map_err(|e| match e {
                ProcessError::Spawn { program, source } => ProvisionError::Spawn { program, source },
                ProcessError::Timeout { after, .. } => ProvisionError::BuildTimeout { after },
            })?;

        if !output.success() {
            return Err(ProvisionError::BuildFailed {
                code: output.code(),
                output: output.combined(),
            });
        }
        info!("Image {} built", self.image);
        Ok(())
    }

    /// Force-removes a container left running after its client was killed.
    async fn remove_container(&self, name: &str) {
        let mut cmd = Command::new(&self.docker);
        cmd.args(["rm", "-f", name]);

        match run_with_timeout(cmd, "docker rm", INSPECT_TIMEOUT).await {
            Ok(output) if output.success() => info!("Removed timed-out container {name}"),
            Ok(output) => warn!(
                "Could not remove container {name}: {}",
                output.combined()
            ),
            Err(e) => warn!("Could not remove container {name}: {e}"),
        }
    }
}

#[async_trait]
impl Toolchain for DockerLatex {
    fn name(&self) -> &str {
        "docker"
    }

    async fn provision(&self) -> Result<(), ProvisionError> {
        if self.image_exists().await {
            return Ok(());
        }
        info!("Image {} not found locally", self.image);
        self.build_image().await
    }

    async fn invoke(&self, workdir: &Path) -> Result<ProcessOutput, CompileError> {
        // Bind mounts need an absolute host path.
        let host_dir = tokio::fs::canonicalize(workdir)
            .await
            .unwrap_or_else(|_| workdir.to_path_buf());
        tokio::fs::create_dir_all(host_dir.join(OUTPUT_SUBDIR))
            .await
            .map_err(CompileError::Scratch)?;

        // Killing the docker client does not stop the container, so it is
        // named after the scratch directory and removed by name on timeout.
        let name = container_name(&host_dir);
        let mut mount = host_dir.into_os_string();
        mount.push(format!(":{WORKSPACE}"));

        let mut cmd = Command::new(&self.docker);
        cmd.args(["run", "--rm", "--name", name.as_str(), "--network", "none", "-v"])
            .arg(mount)
            .arg("-e")
            .arg(env_pair("OUTPUT_DIR", &format!("{WORKSPACE}/{OUTPUT_SUBDIR}")))
            .arg("-e")
            .arg(env_pair("MAIN_LATEX_FILE", MAIN_TEX))
            .arg("-e")
            .arg(env_pair("TOC", "false"))
            .arg(&self.image);

        match run_with_timeout(cmd, self.name(), self.compile_timeout).await {
            Ok(output) => Ok(output),
            Err(e @ ProcessError::Timeout { .. }) => {
                self.remove_container(&name).await;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn pdf_path(&self, workdir: &Path) -> PathBuf {
        workdir.join(OUTPUT_SUBDIR).join("main.pdf")
    }
}

/// Scratch directory names (`latex_<ms>_<alnum>`) are valid container names.
fn container_name(workdir: &Path) -> String {
    workdir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("latex_{}", std::process::id()))
}

fn env_pair(key: &str, value: &str) -> OsString {
    OsString::from(format!("{key}={value}"))
}
