//! PicasaAlbumProvider - IAlbumProvider implementation for the album feed API
//!
//! Wraps the [`PicasaClient`] and delegates to the listing and upload
//! modules to fulfil the [`IAlbumProvider`] port contract.
//!
//! ## Design Notes
//!
//! - Uses `tokio::sync::Mutex` because `IAlbumProvider` methods take `&self`
//!   while `PicasaClient::set_access_token` requires `&mut self`.
//! - With a [`TokenSession`] attached, the access token is checked (and
//!   refreshed if needed) before every request.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::debug;

use albumsync_core::config::Config;
use albumsync_core::domain::{CanonicalToken, MatchMode, RemoteIdentifierSet};
use albumsync_core::ports::album_provider::{IAlbumProvider, UploadReceipt};
use albumsync_core::ports::local_directory::FileContent;

use crate::auth::TokenSession;
use crate::client::PicasaClient;
use crate::listing::{self, DEFAULT_BUFFER_SIZE};
use crate::upload;

/// Album provider implementation backed by one album feed
pub struct PicasaAlbumProvider {
    /// The underlying client, protected by a mutex
    client: Mutex<PicasaClient>,
    /// `/user/{userId}/albumid/{albumId}`
    album_path: String,
    buffer_size: usize,
    match_mode: MatchMode,
    session: Option<Arc<TokenSession>>,
}

impl PicasaAlbumProvider {
    /// Creates a provider for the album of `user_id` identified by `album_id`
    pub fn new(client: PicasaClient, user_id: &str, album_id: &str) -> Self {
        Self {
            client: Mutex::new(client),
            album_path: PicasaClient::album_path(user_id, album_id),
            buffer_size: DEFAULT_BUFFER_SIZE,
            match_mode: MatchMode::default(),
            session: None,
        }
    }

    /// Creates a provider from the album and sync sections of `config`
    pub fn from_config(config: &Config, access_token: impl Into<String>) -> Self {
        let client = PicasaClient::with_base_url(access_token, &config.album.base_url);
        Self::new(client, &config.album.user_id, &config.album.album_id)
            .with_buffer_size(config.sync.listing_buffer_size)
            .with_match_mode(config.sync.match_mode)
    }

    /// Sets the read size for listing bodies
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Sets how local tokens are matched against remote titles
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Attaches a session that keeps the access token fresh
    pub fn with_session(mut self, session: Arc<TokenSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Album feed path used for both listing and upload
    pub fn album_path(&self) -> &str {
        &self.album_path
    }

    async fn authorized_client(&self) -> Result<tokio::sync::MutexGuard<'_, PicasaClient>> {
        let mut client = self.client.lock().await;
        if let Some(session) = &self.session {
            let token = session.access_token().await?;
            if token != client.access_token() {
                client.set_access_token(token);
            }
        }
        Ok(client)
    }
}

#[async_trait::async_trait]
impl IAlbumProvider for PicasaAlbumProvider {
    /// Delegates to [`listing::fetch_titles`].
    async fn list_titles(&self) -> Result<RemoteIdentifierSet> {
        let client = self.authorized_client().await?;
        debug!(path = %self.album_path, "PicasaAlbumProvider::list_titles");
        listing::fetch_titles(&client, &self.album_path, self.buffer_size, self.match_mode).await
    }

    /// Delegates to [`upload::upload_photo`].
    async fn upload_photo(
        &self,
        slug: &CanonicalToken,
        content_type: &str,
        file: FileContent,
    ) -> Result<UploadReceipt> {
        let client = self.authorized_client().await?;
        debug!(slug = %slug, "PicasaAlbumProvider::upload_photo");
        upload::upload_photo(&client, &self.album_path, slug, content_type, file).await
    }
}
