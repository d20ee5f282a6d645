//! Configuration module for albumsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//!
//! The flat `settings.json` layout (`user_id`, `album_id`, `client_id`,
//! `client_secret`, `target_dir`) is also accepted and mapped onto the
//! sectioned layout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::MatchMode;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for albumsync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub album: AlbumConfig,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Remote album coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlbumConfig {
    /// Owner of the album.
    pub user_id: String,
    /// Album identifier within the owner's account.
    pub album_id: String,
    /// Feed API root; the album path is appended to it.
    pub base_url: String,
}

/// Where OAuth tokens are persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStorageKind {
    /// System keyring (Secret Service, macOS Keychain, ...).
    #[default]
    Keyring,
    /// Plain JSON file at `auth.token_file`.
    File,
}

/// Authentication / OAuth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth client ID. `None` until configured.
    pub client_id: Option<String>,
    /// OAuth client secret issued with the client ID.
    pub client_secret: Option<String>,
    /// Loopback redirect URI the local callback server listens on.
    pub redirect_uri: String,
    /// Token persistence backend.
    pub token_storage: TokenStorageKind,
    /// Token file used when `token_storage` is `file`.
    pub token_file: PathBuf,
}

/// Local directory and upload request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory scanned (non-recursively) for new photos.
    pub target_dir: PathBuf,
    /// Accepted file suffix, compared case-sensitively (e.g. `.JPG`).
    pub extension: String,
    /// Media type sent with every upload.
    pub content_type: String,
    /// Record an upload as done whatever HTTP status the server returned.
    pub accept_any_status: bool,
}

/// Polling and reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds to sleep between upload passes.
    pub poll_interval_secs: u64,
    /// Seconds to wait before retrying a failed album listing.
    pub retry_delay_secs: u64,
    /// Read size in bytes used when scanning the listing response.
    pub listing_buffer_size: usize,
    /// How local tokens are compared with remote titles.
    pub match_mode: MatchMode,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Flat settings file layout: one object with five string fields.
#[derive(Debug, Deserialize)]
struct LegacySettings {
    user_id: String,
    album_id: String,
    client_id: String,
    client_secret: String,
    target_dir: PathBuf,
}

impl From<LegacySettings> for Config {
    fn from(legacy: LegacySettings) -> Self {
        let mut config = Config::default();
        config.album.user_id = legacy.user_id;
        config.album.album_id = legacy.album_id;
        config.auth.client_id = Some(legacy.client_id);
        config.auth.client_secret = Some(legacy.client_secret);
        config.upload.target_dir = legacy.target_dir;
        config
    }
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML (or JSON) file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str_any(&content)
    }

    /// Parse either the sectioned layout or the flat settings layout.
    pub fn from_str_any(content: &str) -> anyhow::Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        let is_flat = value
            .as_mapping()
            .map(|m| m.contains_key("user_id") && !m.contains_key("album"))
            .unwrap_or(false);

        let config: Config = if is_flat {
            let legacy: LegacySettings = serde_yaml::from_value(value)?;
            legacy.into()
        } else {
            serde_yaml::from_value(value)?
        };
        Ok(config.with_expanded_paths())
    }

    /// Replaces a leading `~` in every path setting with the home directory.
    pub fn with_expanded_paths(mut self) -> Self {
        self.upload.target_dir = expand_tilde(&self.upload.target_dir);
        self.auth.token_file = expand_tilde(&self.auth.token_file);
        self
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/albumsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| expand_tilde(Path::new("~/.config")))
            .join("albumsync")
            .join("config.yaml")
    }
}

/// Expand tilde (~) in a path to the user's home directory
///
/// Paths without a leading `~`, and every path when the home directory is
/// unknown, are returned unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for AlbumConfig {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            album_id: String::new(),
            base_url: "https://picasaweb.google.com/data/feed/api".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| expand_tilde(Path::new("~/.local/share")))
            .join("albumsync");
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: "http://127.0.0.1:8400/callback".to_string(),
            token_storage: TokenStorageKind::default(),
            token_file: data_dir.join("token_cached.json"),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            target_dir: dirs::picture_dir()
                .unwrap_or_else(|| expand_tilde(Path::new("~/Pictures"))),
            extension: ".JPG".to_string(),
            content_type: "image/jpeg".to_string(),
            accept_any_status: false,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1,
            retry_delay_secs: 5,
            listing_buffer_size: 256,
            match_mode: MatchMode::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"album.user_id"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- album ---
        if self.album.user_id.trim().is_empty() {
            errors.push(ValidationError {
                field: "album.user_id".into(),
                message: "must not be empty".into(),
            });
        }
        if self.album.album_id.trim().is_empty() {
            errors.push(ValidationError {
                field: "album.album_id".into(),
                message: "must not be empty".into(),
            });
        }
        if !self.album.base_url.starts_with("http://") && !self.album.base_url.starts_with("https://")
        {
            errors.push(ValidationError {
                field: "album.base_url".into(),
                message: format!("not an http(s) URL: {}", self.album.base_url),
            });
        }

        // --- auth ---
        if self.auth.client_id.as_deref().map_or(true, str::is_empty) {
            errors.push(ValidationError {
                field: "auth.client_id".into(),
                message: "must be set".into(),
            });
        }
        if self.auth.client_secret.as_deref().map_or(true, str::is_empty) {
            errors.push(ValidationError {
                field: "auth.client_secret".into(),
                message: "must be set".into(),
            });
        }

        // --- upload ---
        let target_dir = expand_tilde(&self.upload.target_dir);
        if !target_dir.is_dir() {
            errors.push(ValidationError {
                field: "upload.target_dir".into(),
                message: format!("directory does not exist: {}", target_dir.display()),
            });
        }
        if !self.upload.extension.starts_with('.') || self.upload.extension.len() < 2 {
            errors.push(ValidationError {
                field: "upload.extension".into(),
                message: format!(
                    "must be a dot followed by a suffix, got '{}'",
                    self.upload.extension
                ),
            });
        }
        if self.upload.content_type.is_empty() {
            errors.push(ValidationError {
                field: "upload.content_type".into(),
                message: "must not be empty".into(),
            });
        }

        // --- sync ---
        if self.sync.poll_interval_secs == 0 {
            errors.push(ValidationError {
                field: "sync.poll_interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.retry_delay_secs == 0 {
            errors.push(ValidationError {
                field: "sync.retry_delay_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.listing_buffer_size == 0 {
            errors.push(ValidationError {
                field: "sync.listing_buffer_size".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use albumsync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .album("alice", "5842")
///     .target_dir(PathBuf::from("/home/alice/Camera"))
///     .poll_interval_secs(10)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- album ---

    pub fn album(mut self, user_id: impl Into<String>, album_id: impl Into<String>) -> Self {
        self.config.album.user_id = user_id.into();
        self.config.album.album_id = album_id.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.album.base_url = url.into();
        self
    }

    // --- auth ---

    pub fn client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.config.auth.client_id = Some(client_id.into());
        self.config.auth.client_secret = Some(client_secret.into());
        self
    }

    pub fn token_storage(mut self, kind: TokenStorageKind) -> Self {
        self.config.auth.token_storage = kind;
        self
    }

    pub fn token_file(mut self, path: PathBuf) -> Self {
        self.config.auth.token_file = expand_tilde(&path);
        self
    }

    // --- upload ---

    pub fn target_dir(mut self, dir: PathBuf) -> Self {
        self.config.upload.target_dir = expand_tilde(&dir);
        self
    }

    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.config.upload.extension = ext.into();
        self
    }

    pub fn accept_any_status(mut self, accept: bool) -> Self {
        self.config.upload.accept_any_status = accept;
        self
    }

    // --- sync ---

    pub fn poll_interval_secs(mut self, seconds: u64) -> Self {
        self.config.sync.poll_interval_secs = seconds;
        self
    }

    pub fn retry_delay_secs(mut self, seconds: u64) -> Self {
        self.config.sync.retry_delay_secs = seconds;
        self
    }

    pub fn listing_buffer_size(mut self, bytes: usize) -> Self {
        self.config.sync.listing_buffer_size = bytes;
        self
    }

    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.config.sync.match_mode = mode;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
