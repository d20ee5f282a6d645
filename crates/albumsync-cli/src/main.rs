//! albumsync CLI - uploads new photos from a directory into an online album
//!
//! Authorizes against the album API, lists the titles already in the album,
//! then keeps uploading every new `.JPG` of the target directory until
//! interrupted.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use albumsync_core::config::Config;

mod commands;
mod output;

use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "albumsync",
    version,
    about = "Uploads new photos from a local directory into an online album"
)]
pub struct Cli {
    /// Use alternate config file (YAML, or the flat settings.json layout)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Authorize, store the tokens and exit
    #[arg(long)]
    auth_only: bool,

    /// Run a single upload pass and exit
    #[arg(long, conflicts_with = "auth_only")]
    once: bool,

    /// Print results and logs as JSON
    #[arg(long)]
    json: bool,
}

/// Log filter: `-v` beats the configured level; `RUST_LOG` beats both
fn filter_directive(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_tracing(directive: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(Config::default_path);
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(|e| format!("  {e}")).collect();
        anyhow::bail!(
            "Invalid configuration in {}:\n{}",
            path.display(),
            details.join("\n")
        );
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.clone())?;
    init_tracing(&filter_directive(cli.verbose, &config.logging.level), cli.json);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let fmt = get_formatter(format);

    info!(
        user_id = %config.album.user_id,
        album_id = %config.album.album_id,
        "albumsync starting"
    );

    let result = if cli.auth_only {
        commands::run::auth_only(&config, &*fmt).await
    } else {
        commands::run::run(&config, cli.once, &*fmt).await
    };

    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "albumsync exiting with error");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["albumsync"]).unwrap();
        assert!(cli.config.is_none());
        assert_eq!(cli.verbose, 0);
        assert!(!cli.auth_only);
        assert!(!cli.once);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_flags() {
        let cli =
            Cli::try_parse_from(["albumsync", "--config", "/etc/albumsync.yaml", "-vv", "--once"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/albumsync.yaml")));
        assert_eq!(cli.verbose, 2);
        assert!(cli.once);
    }

    #[test]
    fn test_cli_once_conflicts_with_auth_only() {
        assert!(Cli::try_parse_from(["albumsync", "--once", "--auth-only"]).is_err());
    }

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(0, "warn"), "warn");
        assert_eq!(filter_directive(1, "warn"), "debug");
        assert_eq!(filter_directive(5, "warn"), "trace");
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));
    }

    #[test]
    fn test_load_config_reports_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "album:\n  user_id: alice\n").unwrap();

        let err = load_config(Some(path)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("album.album_id"));
        assert!(message.contains("auth.client_id"));
    }

    #[test]
    fn test_load_flat_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let json = serde_json::json!({
            "user_id": "alice",
            "album_id": "5842",
            "client_id": "cid",
            "client_secret": "secret",
            "target_dir": dir.path(),
        });
        std::fs::write(&path, json.to_string()).unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.album.user_id, "alice");
        assert_eq!(config.upload.target_dir, dir.path());
    }
}
