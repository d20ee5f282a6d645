//! Upload loop - wires the adapters together and runs the driver
//!
//! 1. Authorizes (see [`super::auth`])
//! 2. Builds the album provider with a self-refreshing token session
//! 3. Runs the [`Driver`] until `--once` completes or a signal arrives

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use albumsync_core::config::Config;
use albumsync_picasa::auth::TokenSession;
use albumsync_picasa::provider::PicasaAlbumProvider;
use albumsync_sync::driver::{Driver, DriverOptions};
use albumsync_sync::engine::UploadEngine;
use albumsync_sync::filesystem::LocalDirectoryAdapter;

use super::auth::{authorize, Authorization};
use crate::output::OutputFormatter;

/// Authorizes only; tokens are stored for later runs
pub async fn auth_only(config: &Config, fmt: &dyn OutputFormatter) -> Result<()> {
    authorize(config, fmt).await?;
    fmt.success("Authorization stored");
    Ok(())
}

/// Authorizes, then uploads until stopped (or for one pass with `once`)
pub async fn run(config: &Config, once: bool, fmt: &dyn OutputFormatter) -> Result<()> {
    let Authorization {
        adapter,
        storage,
        tokens,
    } = authorize(config, fmt).await?;

    let access_token = tokens.access_token.clone();
    let session = Arc::new(TokenSession::new(adapter, storage, tokens));
    let provider =
        Arc::new(PicasaAlbumProvider::from_config(config, access_token).with_session(session));

    let engine = UploadEngine::new(
        provider.clone(),
        Arc::new(LocalDirectoryAdapter::new()),
        &config.upload,
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    info!(
        album = %provider.album_path(),
        dir = %config.upload.target_dir.display(),
        "Watching directory"
    );

    let mut driver = Driver::new(
        provider,
        engine,
        DriverOptions::from_config(&config.sync, once),
        shutdown,
    );
    let report = driver.run().await?;

    fmt.report(&report);
    Ok(())
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}
