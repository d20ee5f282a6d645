//! Local directory adapter (secondary/driven adapter)
//!
//! Implements [`ILocalDirectory`] using `tokio::fs`.
//!
//! ## Design Decisions
//!
//! - **Symlinks are followed**: an entry counts as a regular file when its
//!   target is one.
//! - **Local time**: modification times are converted to the local wall
//!   clock before they become part of a token.
//! - **Unusable entries are skipped**: names that are not UTF-8 and entries
//!   whose metadata cannot be read are logged and left out of the listing.
//! - **Name order**: candidates are returned sorted by file name.

use std::path::Path;

use albumsync_core::{
    domain::LocalCandidate,
    ports::local_directory::{FileContent, ILocalDirectory},
};
use chrono::{DateTime, Local, NaiveDateTime};
use tracing::{debug, instrument, warn};

use crate::SyncError;

/// Adapter that bridges the [`ILocalDirectory`] port to the real filesystem
#[derive(Debug, Clone, Default)]
pub struct LocalDirectoryAdapter;

impl LocalDirectoryAdapter {
    /// Create a new `LocalDirectoryAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Local wall-clock time of a filesystem timestamp
fn local_naive(time: std::time::SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

#[async_trait::async_trait]
impl ILocalDirectory for LocalDirectoryAdapter {
    #[instrument(skip(self), fields(dir = %dir.display()))]
    async fn list_candidates(&self, dir: &Path) -> anyhow::Result<Vec<LocalCandidate>> {
        let dir_error = |source| SyncError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(dir_error)?;
        let mut candidates = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
            let path = entry.path();

            let metadata = match tokio::fs::metadata(&path).await {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping entry without metadata");
                    continue;
                }
            };

            let modified = match metadata.modified() {
                Ok(t) => local_naive(t),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping entry without mtime");
                    continue;
                }
            };

            match LocalCandidate::new(&path, modified, metadata.is_file()) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping entry"),
            }
        }

        candidates.sort_by(|a, b| a.file_name().cmp(b.file_name()));
        debug!(entries = candidates.len(), "directory listed");
        Ok(candidates)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn open_file(&self, path: &Path) -> anyhow::Result<FileContent> {
        let file_error = |source| SyncError::FileRead {
            path: path.to_path_buf(),
            source,
        };

        let file = tokio::fs::File::open(path).await.map_err(file_error)?;
        let len = file.metadata().await.map_err(file_error)?.len();
        debug!(bytes = len, "file opened");
        Ok(FileContent {
            len,
            reader: Box::new(file),
        })
    }
}
