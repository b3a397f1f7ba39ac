//! Timeout-bounded subprocess execution.
//!
//! Commands are built as argument vectors; nothing goes through a shell, and
//! document content only ever reaches the toolchain through files on disk.

use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// stdout followed by stderr, for error messages.
    pub fn combined(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", "") => String::new(),
            (out, "") => out.to_string(),
            ("", err) => err.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },
}

/// Runs `cmd` to completion, killing it if it outlives `timeout`.
///
/// `program` is only used for logs and errors.
pub async fn run_with_timeout(
    mut cmd: Command,
    program: &str,
    timeout: Duration,
) -> Result<ProcessOutput, ProcessError> {
    cmd.stdin(std::process::Stdio::null()).kill_on_drop(true);
    info!("Running {:?} (timeout {:?})", cmd.as_std(), timeout);

    // Dropping the `output()` future on timeout drops the child, and
    // `kill_on_drop` makes that a hard kill.
    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(ProcessError::Spawn {
                program: program.to_string(),
                source,
            })
        }
        Err(_) => {
            warn!("{program} exceeded {timeout:?}, killed");
            return Err(ProcessError::Timeout {
                program: program.to_string(),
                after: timeout,
            });
        }
    };

    let captured = ProcessOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    if !captured.stderr.trim().is_empty() {
        warn!("{program} stderr: {}", captured.stderr.trim());
    }
    Ok(captured)
}
