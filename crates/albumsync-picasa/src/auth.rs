//! OAuth2 authorization for the album feed API
//!
//! Implements the Authorization Code flow (client secret plus PKCE, RFC 7636)
//! against Google's identity endpoints, and keeps the resulting tokens
//! between runs so the interactive step happens only once.
//!
//! ## Components
//!
//! - [`OAuth2Config`] - Configuration for the OAuth2 flow
//! - [`TokenStorage`] - Persistence of tokens ([`KeyringTokenStorage`], [`FileTokenStorage`])
//! - [`AuthCodeFlow`] - Authorization URL, code exchange and refresh
//! - [`LocalCallbackServer`] - Minimal HTTP server for the OAuth redirect
//! - [`PicasaAuthAdapter`] - Orchestrates the full authentication flow
//! - [`TokenSession`] - Hands out a fresh access token for every request

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use albumsync_core::ports::album_provider::Tokens;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use oauth2::{
    basic::{BasicClient, BasicTokenResponse},
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken, Scope, TokenResponse,
    TokenUrl,
};
use tracing::{debug, info, warn};

/// Google OAuth2 authorization endpoint
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth2 token endpoint
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Default redirect URI for the local callback server
const REDIRECT_URI: &str = "http://127.0.0.1:8400/callback";

/// Keyring service name for storing tokens
const KEYRING_SERVICE: &str = "albumsync";

/// Scope granting read/write access to the album feeds
const DEFAULT_SCOPES: &[&str] = &["https://picasaweb.google.com/data/"];

/// Refresh this long before the access token actually expires
const REFRESH_MARGIN_SECS: i64 = 60;

// ============================================================================
// OAuth2Config
// ============================================================================

/// Configuration for the OAuth2 authorization code flow
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Redirect URI for receiving the authorization code
    pub redirect_uri: String,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
    /// Authorization endpoint the browser is sent to
    pub auth_url: String,
    /// Endpoint for code exchange and refresh
    pub token_url: String,
}

impl OAuth2Config {
    /// Creates a new OAuth2Config with the given credentials and default settings
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Creates a config with custom scopes
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Creates a config with a custom redirect URI
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    /// Creates a config talking to another authorization server
    pub fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self
    }
}

// ============================================================================
// Token storage
// ============================================================================

/// Persistence of OAuth tokens between runs
pub trait TokenStorage: Send + Sync {
    /// Loads stored tokens; `None` if nothing was stored yet
    fn load(&self) -> Result<Option<Tokens>>;

    /// Stores tokens, replacing any previous ones
    fn store(&self, tokens: &Tokens) -> Result<()>;

    /// Removes stored tokens; succeeds when there is nothing to remove
    fn clear(&self) -> Result<()>;
}

/// Stores tokens in the system keyring
///
/// Tokens are serialized as JSON under the service name `albumsync` with the
/// album owner's user ID as the keyring username.
pub struct KeyringTokenStorage {
    username: String,
}

impl KeyringTokenStorage {
    /// Storage slot for the given user
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, &self.username)
            .context("Failed to create keyring entry")
    }
}

impl TokenStorage for KeyringTokenStorage {
    fn load(&self) -> Result<Option<Tokens>> {
        match self.entry()?.get_password() {
            Ok(json) => {
                let tokens: Tokens = serde_json::from_str(&json)
                    .context("Failed to deserialize tokens from keyring")?;
                debug!("Loaded tokens from keyring for user: {}", self.username);
                Ok(Some(tokens))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No tokens found in keyring for user: {}", self.username);
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    fn store(&self, tokens: &Tokens) -> Result<()> {
        let json = serde_json::to_string(tokens).context("Failed to serialize tokens")?;
        self.entry()?
            .set_password(&json)
            .context("Failed to store tokens in keyring")?;
        debug!("Stored tokens in keyring for user: {}", self.username);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                info!("Cleared tokens from keyring for user: {}", self.username);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}

/// Stores tokens as a JSON file, readable only by the owner on Unix
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    /// Storage backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the token file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<Tokens>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No token file");
                return Ok(None);
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!(
                    "Failed to read token file {}",
                    self.path.display()
                )))
            }
        };
        let tokens = serde_json::from_str(&json)
            .with_context(|| format!("Error while loading saved token {}", self.path.display()))?;
        Ok(Some(tokens))
    }

    fn store(&self, tokens: &Tokens) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(tokens).context("Failed to serialize tokens")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write token file {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to restrict token file permissions")?;
        }

        debug!(path = %self.path.display(), "Stored tokens in file");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to remove token file")),
        }
    }
}

// ============================================================================
// AuthCodeFlow
// ============================================================================

/// OAuth2 authorization code flow using the `oauth2` crate
pub struct AuthCodeFlow {
    client: BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>,
    scopes: Vec<String>,
}

impl AuthCodeFlow {
    /// Creates a new flow with the given configuration
    pub fn new(config: &OAuth2Config) -> Result<Self> {
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(config.auth_url.clone()).context("Invalid authorization URL")?,
            )
            .set_token_uri(TokenUrl::new(config.token_url.clone()).context("Invalid token URL")?)
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_uri.clone()).context("Invalid redirect URI")?,
            );

        Ok(Self {
            client,
            scopes: config.scopes.clone(),
        })
    }

    /// Generates an authorization URL with a PKCE challenge
    ///
    /// Offline access is requested so the response carries a refresh token.
    ///
    /// # Returns
    /// A tuple of `(authorization_url, csrf_token, pkce_verifier)`.
    pub fn generate_auth_url(&self) -> (String, CsrfToken, PkceCodeVerifier) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");

        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token) = auth_request.set_pkce_challenge(pkce_challenge).url();

        debug!("Generated authorization URL");
        (auth_url.to_string(), csrf_token, pkce_verifier)
    }

    /// Exchanges an authorization code for OAuth tokens
    pub async fn exchange_code(
        &self,
        code: String,
        pkce_verifier: PkceCodeVerifier,
    ) -> Result<Tokens> {
        info!("Exchanging authorization code for tokens");

        let http_client = reqwest::Client::new();
        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&http_client)
            .await
            .context("exchange error")?;

        info!("Successfully obtained OAuth tokens");
        Ok(tokens_from_response(&token_result, None))
    }

    /// Refreshes an access token using a refresh token
    ///
    /// Google usually omits the refresh token from refresh responses; the
    /// previous one is kept in that case.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Tokens> {
        info!("Refreshing access token");

        let http_client = reqwest::Client::new();
        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&http_client)
            .await
            .context("Failed to refresh token")?;

        info!("Successfully refreshed access token");
        Ok(tokens_from_response(&token_result, Some(refresh_token)))
    }
}

fn tokens_from_response(response: &BasicTokenResponse, previous_refresh: Option<&str>) -> Tokens {
    let expires_at = response
        .expires_in()
        .map(|d| Utc::now() + Duration::seconds(d.as_secs() as i64))
        .unwrap_or_else(|| Utc::now() + Duration::hours(1));

    Tokens {
        access_token: response.access_token().secret().to_string(),
        refresh_token: response
            .refresh_token()
            .map(|t| t.secret().to_string())
            .or_else(|| previous_refresh.map(str::to_string)),
        expires_at,
    }
}

// ============================================================================
// LocalCallbackServer
// ============================================================================

/// Minimal HTTP server that listens on the loopback redirect address.
///
/// Serves connections until one carries an authorization code, answers it
/// with a success page and returns the parameters.
pub struct LocalCallbackServer;

/// Parameters extracted from the OAuth2 callback
#[derive(Debug)]
pub struct CallbackParams {
    /// The authorization code
    pub code: String,
    /// The CSRF state parameter
    pub state: String,
}

impl LocalCallbackServer {
    /// Listens on the host and port of `redirect_uri` and waits for the redirect
    pub async fn start(redirect_uri: &str) -> Result<CallbackParams> {
        use http_body_util::Full;
        use hyper::body::Bytes;
        use hyper::header::{HeaderValue, CONTENT_TYPE};
        use hyper::server::conn::http1;
        use hyper::service::service_fn;
        use hyper::{Request, Response, StatusCode};
        use hyper_util::rt::TokioIo;
        use tokio::net::TcpListener;
        use tokio::sync::{oneshot, Mutex};

        let addr = callback_addr(redirect_uri)?;
        info!(%addr, "Starting local OAuth callback server");

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind callback server to {addr}"))?;

        let (tx, mut rx) = oneshot::channel::<CallbackParams>();
        let tx = Arc::new(Mutex::new(Some(tx)));

        loop {
            tokio::select! {
                params = &mut rx => {
                    let params = params
                        .context("Callback server channel closed without receiving parameters")?;
                    info!("Received OAuth callback with authorization code");
                    return Ok(params);
                }
                accepted = listener.accept() => {
                    let (stream, _peer) = accepted
                        .context("Failed to accept connection on callback server")?;
                    let io = TokioIo::new(stream);
                    let tx_conn = tx.clone();

                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let tx_inner = tx_conn.clone();
                        async move {
                            let uri = req.uri().to_string();
                            debug!("Callback server received request: {}", uri);

                            let (status, html) = match parse_callback_params(&uri) {
                                Some(params) => {
                                    if let Some(sender) = tx_inner.lock().await.take() {
                                        let _ = sender.send(params);
                                    }
                                    (StatusCode::OK, success_html())
                                }
                                None => (
                                    StatusCode::BAD_REQUEST,
                                    error_html("Missing authorization code in callback"),
                                ),
                            };

                            let mut response = Response::new(Full::new(Bytes::from(html)));
                            *response.status_mut() = status;
                            response.headers_mut().insert(
                                CONTENT_TYPE,
                                HeaderValue::from_static("text/html; charset=utf-8"),
                            );
                            Ok::<_, hyper::Error>(response)
                        }
                    });

                    tokio::spawn(async move {
                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            warn!("Callback server connection error: {}", e);
                        }
                    });
                }
            }
        }
    }
}

/// Socket address the callback server binds for a redirect URI
fn callback_addr(redirect_uri: &str) -> Result<SocketAddr> {
    let url = url::Url::parse(redirect_uri).context("Invalid redirect URI")?;
    let host = url.host_str().context("Redirect URI has no host")?;
    let host = if host == "localhost" { "127.0.0.1" } else { host };
    let port = url
        .port_or_known_default()
        .context("Redirect URI has no port")?;
    format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Redirect URI host is not a loopback IP: {host}"))
}

/// Parses the authorization code and state from a callback URI
fn parse_callback_params(uri: &str) -> Option<CallbackParams> {
    let url = url::Url::parse(&format!("http://localhost{}", uri)).ok()?;
    let mut code = None;
    let mut state = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            _ => {}
        }
    }

    Some(CallbackParams {
        code: code?,
        state: state.unwrap_or_default(),
    })
}

/// Returns the HTML for a successful authentication page
fn success_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>albumsync - Authentication Successful</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Authentication Successful</h1>
    <p>albumsync may now upload to your albums.</p>
    <p>You can close this window.</p>
</body>
</html>"#
        .to_string()
}

/// Returns the HTML for an authentication error page
fn error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>albumsync - Authentication Error</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Authentication Error</h1>
    <p>{}</p>
    <p>Please close this window and try again.</p>
</body>
</html>"#,
        message
    )
}

// ============================================================================
// PicasaAuthAdapter
// ============================================================================

/// High-level authentication adapter
///
/// 1. Generates the authorization URL
/// 2. Opens the user's browser (or prints the URL when that fails)
/// 3. Waits for the redirect on the local callback server
/// 4. Checks the CSRF state and exchanges the code for tokens
pub struct PicasaAuthAdapter {
    config: OAuth2Config,
}

impl PicasaAuthAdapter {
    /// Creates a new adapter with the given configuration
    pub fn new(config: OAuth2Config) -> Self {
        Self { config }
    }

    /// Returns a reference to the current configuration
    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    /// Performs the full interactive login flow
    pub async fn login(&self) -> Result<Tokens> {
        info!("Starting OAuth2 login flow");

        let flow = AuthCodeFlow::new(&self.config)?;
        let (auth_url, csrf_token, pkce_verifier) = flow.generate_auth_url();

        // Headless machines have no browser; the URL can be opened elsewhere.
        if let Err(e) = webbrowser::open(&auth_url) {
            warn!(error = %e, "Could not open a browser");
        }
        eprintln!("Open this URL to authorize albumsync:\n{auth_url}");

        let callback = LocalCallbackServer::start(&self.config.redirect_uri).await?;
        if callback.state != *csrf_token.secret() {
            anyhow::bail!("OAuth callback state does not match the authorization request");
        }

        let tokens = flow.exchange_code(callback.code, pkce_verifier).await?;
        info!("OAuth2 login completed successfully");
        Ok(tokens)
    }

    /// Refreshes an expired access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<Tokens> {
        let flow = AuthCodeFlow::new(&self.config)?;
        flow.refresh_token(refresh_token).await
    }

    /// Returns usable tokens, reusing stored ones whenever possible
    ///
    /// Stored tokens are returned as is while valid, refreshed when expired,
    /// and replaced through the interactive [`login`](Self::login) when
    /// nothing usable is stored. New tokens are written back to `storage`.
    pub async fn authorized_tokens(&self, storage: &dyn TokenStorage) -> Result<Tokens> {
        let stored = storage.load()?;

        if let Some(tokens) = stored {
            if !tokens.expires_within(Duration::seconds(REFRESH_MARGIN_SECS)) {
                debug!("Using stored access token");
                return Ok(tokens);
            }
            if let Some(refresh_token) = tokens.refresh_token.as_deref() {
                match self.refresh(refresh_token).await {
                    Ok(fresh) => {
                        storage.store(&fresh)?;
                        return Ok(fresh);
                    }
                    Err(e) => warn!(error = %format!("{e:#}"), "Token refresh failed, logging in again"),
                }
            }
        }

        let tokens = self.login().await?;
        storage.store(&tokens)?;
        Ok(tokens)
    }
}

// ============================================================================
// TokenSession
// ============================================================================

/// Keeps the current tokens of a long-running process fresh
///
/// The poll loop runs for days while access tokens live about an hour;
/// [`access_token`](Self::access_token) refreshes shortly before expiry and
/// writes the result back to storage.
pub struct TokenSession {
    adapter: PicasaAuthAdapter,
    storage: Arc<dyn TokenStorage>,
    tokens: tokio::sync::Mutex<Tokens>,
}

impl TokenSession {
    /// Starts a session from already authorized tokens
    pub fn new(adapter: PicasaAuthAdapter, storage: Arc<dyn TokenStorage>, tokens: Tokens) -> Self {
        Self {
            adapter,
            storage,
            tokens: tokio::sync::Mutex::new(tokens),
        }
    }

    /// Current access token, refreshed first if it is about to expire
    pub async fn access_token(&self) -> Result<String> {
        let mut tokens = self.tokens.lock().await;

        if tokens.expires_within(Duration::seconds(REFRESH_MARGIN_SECS)) {
            match tokens.refresh_token.clone() {
                Some(refresh_token) => {
                    let fresh = self.adapter.refresh(&refresh_token).await?;
                    if let Err(e) = self.storage.store(&fresh) {
                        warn!(error = %format!("{e:#}"), "Failed to persist refreshed tokens");
                    }
                    *tokens = fresh;
                }
                None => warn!("Access token expired and no refresh token is available"),
            }
        }

        Ok(tokens.access_token.clone())
    }
}
