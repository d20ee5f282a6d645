//! Album feed API client
//!
//! Provides an HTTP client for the Picasa Web Albums data feed. Handles the
//! bearer authorization header and endpoint construction.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use albumsync_picasa::client::PicasaClient;
//! use reqwest::Method;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = PicasaClient::new("access-token-here");
//! let path = PicasaClient::album_path("alice", "5842");
//! let response = client.request(Method::GET, &path).send().await?;
//! println!("listing status: {}", response.status());
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Method, RequestBuilder};
use tracing::debug;

/// Base URL of the Picasa Web Albums data feed API
pub const PICASA_BASE_URL: &str = "https://picasaweb.google.com/data/feed/api";

/// HTTP client for album feed calls
///
/// Wraps `reqwest::Client` with the bearer token and base URL. No request
/// timeout is configured; a stalled endpoint blocks the caller.
pub struct PicasaClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Current OAuth2 access token
    access_token: String,
}

impl PicasaClient {
    /// Creates a new client with the given access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, PICASA_BASE_URL)
    }

    /// Creates a new client with a custom base URL (useful for testing)
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Path of an album feed relative to the base URL
    pub fn album_path(user_id: &str, album_id: &str) -> String {
        format!("/user/{}/albumid/{}", user_id, album_id)
    }

    /// Updates the access token (e.g., after a token refresh)
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
        debug!("Updated PicasaClient access token");
    }

    /// Returns a reference to the current access token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL (e.g. `/user/alice/albumid/5842`)
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }
}
