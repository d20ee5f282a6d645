//! Album provider port (driven/secondary port)
//!
//! This module defines the interface for the remote photo album: listing
//! the titles already uploaded and posting a new photo.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific.
//! - Uses `#[async_trait]` for async trait methods.
//! - Implementations must already carry valid credentials; obtaining them is
//!   the job of the authentication adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CanonicalToken, RemoteIdentifierSet};
use crate::ports::local_directory::FileContent;

// ============================================================================
// Tokens
// ============================================================================

/// OAuth tokens received from the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    /// Bearer token for authenticating API requests
    pub access_token: String,
    /// Token for refreshing the access token without user interaction
    pub refresh_token: Option<String>,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
}

impl Tokens {
    /// Returns true if the access token will expire within the given duration
    pub fn expires_within(&self, duration: chrono::Duration) -> bool {
        Utc::now() + duration >= self.expires_at
    }
}

// ============================================================================
// UploadReceipt
// ============================================================================

/// Result of an upload request that reached the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReceipt {
    /// HTTP status code returned by the album endpoint
    pub status: u16,
}

impl UploadReceipt {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// IAlbumProvider trait
// ============================================================================

/// Port trait for the remote album
///
/// ## Implementation Notes
///
/// - `list_titles` returns every title in the album; failures are transient
///   from the caller's point of view and are retried by the driver.
/// - `upload_photo` returns `Ok` whenever the server answered, whatever the
///   status; `Err` means the request could not be completed.
#[async_trait::async_trait]
pub trait IAlbumProvider: Send + Sync {
    /// Lists the titles of all items currently in the album
    async fn list_titles(&self) -> anyhow::Result<RemoteIdentifierSet>;

    /// Uploads one photo, using `slug` as its remote title
    ///
    /// # Arguments
    /// * `slug` - Canonical token sent as the item title
    /// * `content_type` - Media type of the file (e.g. `image/jpeg`)
    /// * `file` - Opened file, streamed as the request body
    async fn upload_photo(
        &self,
        slug: &CanonicalToken,
        content_type: &str,
        file: FileContent,
    ) -> anyhow::Result<UploadReceipt>;
}
