//! Staged upload lifecycle
//!
//! Uploaded bytes are written to a request-scoped file so the
//! plausibility gate and the classifier can operate on a stable path.
//! The file is removed when the guard drops, which covers every exit
//! path of the pipeline: success, rejection, error, and panic.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Staged files always carry this extension, independent of the upload's
/// original name.
const STAGED_EXTENSION: &str = "jpg";

/// RAII guard over one staged upload file
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
}

impl StagedUpload {
    /// Write `bytes` under a collision-resistant random name inside
    /// `dir`, creating the directory if needed. Concurrent requests can
    /// never alias the same path.
    pub fn create(dir: &Path, bytes: &[u8]) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let name = format!("{}.{}", uuid::Uuid::new_v4().simple(), STAGED_EXTENSION);
        let path = dir.join(name);
        fs::write(&path, bytes)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Staged path as a string, for persistence in history records
    pub fn path_string(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        // Best-effort cleanup; a failure here must never override the
        // request's result, so it is only logged.
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("failed to remove staged upload {}: {}", self.path.display(), e);
        }
    }
}
