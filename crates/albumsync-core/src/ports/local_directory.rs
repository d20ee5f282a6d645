//! Local directory port (driven/secondary port)
//!
//! Enumerates the configured upload directory (non-recursive) and opens
//! individual candidates so their content can be streamed.

use std::fmt;
use std::path::Path;

use tokio::io::AsyncRead;

use crate::domain::LocalCandidate;

/// An opened file whose content is read while it is sent
pub struct FileContent {
    /// Size in bytes when the file was opened
    pub len: u64,
    /// Reader positioned at the start of the file
    pub reader: Box<dyn AsyncRead + Send + Sync + Unpin>,
}

impl fmt::Debug for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileContent").field("len", &self.len).finish_non_exhaustive()
    }
}

/// Port trait for the local upload directory
#[async_trait::async_trait]
pub trait ILocalDirectory: Send + Sync {
    /// Lists the direct entries of `dir`
    ///
    /// Entries whose name cannot be represented are left out; failing to
    /// read the directory itself is an error.
    async fn list_candidates(&self, dir: &Path) -> anyhow::Result<Vec<LocalCandidate>>;

    /// Opens a file for streaming
    async fn open_file(&self, path: &Path) -> anyhow::Result<FileContent>;
}
