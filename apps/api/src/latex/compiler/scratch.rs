//! Per-compilation scratch directories.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::TempDir;
use tracing::{debug, warn};

/// A uniquely named directory under the scratch root, removed by [`ScratchDir::cleanup`].
///
/// If a caller forgets to clean up, `TempDir`'s drop still removes the
/// directory, just without logging a failure.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub async fn create(root: &Path) -> io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;
        let prefix = format!("latex_{}_", Utc::now().timestamp_millis());
        let root = root.to_path_buf();
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(&prefix)
                .rand_bytes(8)
                .tempdir_in(&root)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;
        debug!("Created scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `name` inside the scratch directory.
    pub async fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }

    /// Removes the directory off the runtime threads. Failures are logged,
    /// never returned.
    pub async fn cleanup(self) {
        let path = self.dir.path().to_path_buf();
        let dir = self.dir;
        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => debug!("Removed scratch directory {}", path.display()),
            Ok(Err(e)) => warn!("Failed to remove scratch directory {}: {}", path.display(), e),
            Err(e) => warn!("Scratch cleanup task for {} failed: {}", path.display(), e),
        }
    }
}
