//! Authorization - obtains album API tokens before anything else runs
//!
//! Reuses stored tokens when possible, otherwise runs the interactive OAuth2
//! flow through [`PicasaAuthAdapter`]. The token store (system keyring or a
//! JSON file) is chosen by `auth.token_storage`.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use albumsync_core::config::{Config, TokenStorageKind};
use albumsync_core::ports::album_provider::Tokens;
use albumsync_picasa::auth::{
    FileTokenStorage, KeyringTokenStorage, OAuth2Config, PicasaAuthAdapter, TokenStorage,
};

use crate::output::OutputFormatter;

/// Everything needed to keep talking to the API after authorization
pub struct Authorization {
    pub adapter: PicasaAuthAdapter,
    pub storage: Arc<dyn TokenStorage>,
    pub tokens: Tokens,
}

/// OAuth2 client settings from the `auth` section
pub fn oauth_config(config: &Config) -> Result<OAuth2Config> {
    let client_id = config
        .auth
        .client_id
        .clone()
        .context("auth.client_id is not set")?;
    let client_secret = config
        .auth
        .client_secret
        .clone()
        .context("auth.client_secret is not set")?;

    Ok(OAuth2Config::new(client_id, client_secret).with_redirect_uri(&config.auth.redirect_uri))
}

/// Token store selected by `auth.token_storage`
pub fn token_storage(config: &Config) -> Arc<dyn TokenStorage> {
    match config.auth.token_storage {
        TokenStorageKind::Keyring => Arc::new(KeyringTokenStorage::new(&config.album.user_id)),
        TokenStorageKind::File => Arc::new(FileTokenStorage::new(config.auth.token_file.clone())),
    }
}

/// Returns valid tokens, running the browser flow if nothing usable is stored
pub async fn authorize(config: &Config, fmt: &dyn OutputFormatter) -> Result<Authorization> {
    let adapter = PicasaAuthAdapter::new(oauth_config(config)?);
    let storage = token_storage(config);

    info!(storage = ?config.auth.token_storage, "Authorizing album access");
    fmt.info("Checking stored authorization...");

    let tokens = adapter
        .authorized_tokens(storage.as_ref())
        .await
        .context("OAuth2 authorization failed")?;

    info!(expires_at = %tokens.expires_at, "Authorized");

    Ok(Authorization {
        adapter,
        storage,
        tokens,
    })
}
