//! Per-attempt scratch directories.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use amux_models::JobId;

/// Isolated working directory owned by a single render attempt.
///
/// Every attempt gets a fresh directory with a random suffix, so retries
/// and concurrent renders never share files. The directory is removed when
/// the area is closed or dropped, whichever comes first.
#[derive(Debug)]
pub struct ScratchArea {
    dir: TempDir,
}

impl ScratchArea {
    /// Create a new area under `root`, creating `root` if needed.
    pub async fn create(root: &Path, job_id: &JobId) -> io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("render-{}-", job_id))
            .tempdir_in(root)?;
        debug!(path = %dir.path().display(), "Created scratch area");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for the `position`-th materialized input.
    pub fn input_path(&self, position: usize) -> PathBuf {
        self.dir.path().join(format!("chunk_{:06}.bin", position))
    }

    /// Remove the directory now, reporting failures.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove scratch area");
        }
    }
}
