use duckytie_core::{DuckytieError, PlatformProfile, Result};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Removes played audio files unless the caller keeps them.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleCleaner {
    profile: PlatformProfile,
}

impl LifecycleCleaner {
    pub fn new(profile: PlatformProfile) -> Self {
        Self { profile }
    }

    /// Delete `path` when `must_delete` is set. A file that is already gone is
    /// an error, since the caller asked for something specific to be removed.
    pub async fn cleanup(&self, path: &Path, must_delete: bool) -> Result<()> {
        self.profile.check_extension(path)?;
        if !must_delete {
            debug!(target = "cleanup", path = ?path, "Keeping audio file");
            return Ok(());
        }
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!(target = "cleanup", path = ?path, "Deleted audio file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(DuckytieError::MissingFile(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
