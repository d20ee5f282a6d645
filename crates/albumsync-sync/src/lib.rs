//! albumsync Sync - upload pass and polling driver
//!
//! Provides:
//! - Local directory scanning with canonical tokens
//! - The upload decision and execution pass
//! - The retry/poll driver that runs passes until stopped
//!
//! ## Modules
//!
//! - [`driver`] - Initial listing retry and the polling loop
//! - [`engine`] - One upload pass over the target directory
//! - [`filesystem`] - Local directory adapter (`tokio::fs`)

pub mod driver;
pub mod engine;
pub mod filesystem;

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the local side of synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// The target directory could not be listed; ends the driver
    #[error("Cannot read directory {path}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single file could not be read; the file is skipped for this pass
    #[error("Cannot read file {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
