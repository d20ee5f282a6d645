//! albumsync Picasa - Picasa Web Albums data API client
//!
//! Provides async client for:
//! - OAuth2 authentication (Authorization Code with PKCE and client secret)
//! - Listing an album feed with a bounded-memory title scanner
//! - Uploading photos into an album
//!
//! ## Modules
//!
//! - [`auth`] - OAuth2 flow components and token storage
//! - [`client`] - Album feed HTTP client
//! - [`listing`] - Chunked listing scanner for album feeds
//! - [`upload`] - Photo upload request
//! - [`provider`] - [`IAlbumProvider`](albumsync_core::ports::album_provider::IAlbumProvider) implementation

pub mod auth;
pub mod client;
pub mod listing;
pub mod provider;
pub mod upload;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when communicating with the album feed API
#[derive(Debug, Error)]
pub enum PicasaError {
    /// Authentication credentials are invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested album
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The user or album does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A server-side error occurred (5xx)
    #[error("Server error ({status}): {body}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Any other non-success status
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Reading the response body failed part way through
    #[error("Failed to read response body after {bytes_read} bytes: {source}")]
    BodyRead {
        /// Bytes successfully read before the failure
        bytes_read: u64,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Longest response body kept in an error message
const MAX_ERROR_BODY: usize = 512;

impl PicasaError {
    /// Classifies a non-success HTTP status
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = truncate_body(body);
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(body),
            StatusCode::FORBIDDEN => Self::Forbidden(body),
            StatusCode::NOT_FOUND => Self::NotFound(body),
            s if s.is_server_error() => Self::ServerError {
                status: s.as_u16(),
                body,
            },
            s => Self::UnexpectedStatus {
                status: s.as_u16(),
                body,
            },
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
