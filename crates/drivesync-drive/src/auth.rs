//! OAuth2 PKCE authentication flow for the Google Drive API
//!
//! Implements the installed-application Authorization Code flow with PKCE
//! (RFC 7636) against Google's OAuth 2.0 endpoints, using a loopback
//! redirect on an OS-chosen port.
//!
//! ## Components
//!
//! - [`ClientCredentials`] - Client ID/secret read from the Google console JSON
//! - [`OAuth2Config`] - Configuration for the OAuth2 flow
//! - [`FileTokenStorage`] - JSON file persistence of the credential
//! - [`PKCEFlow`] - OAuth2 PKCE challenge/exchange logic
//! - [`LocalCallbackServer`] - Minimal HTTP server for the OAuth redirect
//! - [`GoogleAuthenticator`] - Orchestrates the full authentication flow

use std::convert::Infallible;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken, Scope,
    TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use drivesync_core::config::DRIVE_READONLY_SCOPE;
use drivesync_core::ports::{IAuthenticator, ITokenStorage, Tokens};

use crate::DriveError;

/// Google OAuth2 authorization endpoint
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google OAuth2 token endpoint
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Default host of the loopback redirect listener
const CALLBACK_HOST: &str = "127.0.0.1";

/// Lifetime assumed when the token response carries no `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

// ============================================================================
// ClientCredentials
// ============================================================================

/// OAuth client registration downloaded from the Google Cloud console
///
/// The console file wraps the fields in an `installed` (desktop app) or
/// `web` object; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientCredentials {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret, absent for public clients
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Authorization endpoint
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    /// Token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    TOKEN_URL.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientCredentials>,
    web: Option<ClientCredentials>,
}

impl ClientCredentials {
    /// Parses the console JSON document
    pub fn parse(json: &str) -> std::result::Result<Self, DriveError> {
        let file: ClientSecretFile = serde_json::from_str(json)
            .map_err(|e| DriveError::InvalidClientSecret(e.to_string()))?;

        let credentials = file.installed.or(file.web).ok_or_else(|| {
            DriveError::InvalidClientSecret(
                "expected an 'installed' or 'web' client section".to_string(),
            )
        })?;

        if credentials.client_id.trim().is_empty() {
            return Err(DriveError::InvalidClientSecret(
                "client_id is empty".to_string(),
            ));
        }
        Ok(credentials)
    }

    /// Reads and parses the console JSON file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read client secret {}", path.display()))?;
        let credentials = Self::parse(&json)
            .with_context(|| format!("Failed to parse client secret {}", path.display()))?;
        debug!("Loaded OAuth client {}", credentials.client_id);
        Ok(credentials)
    }
}

// ============================================================================
// OAuth2Config
// ============================================================================

/// Configuration for the OAuth2 PKCE authentication flow
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// Client registration
    pub credentials: ClientCredentials,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
    /// Address the redirect listener binds to
    pub callback_host: String,
    /// Port of the redirect listener, `0` for any free port
    pub callback_port: u16,
    /// Whether to open the consent page in a browser
    pub open_browser: bool,
}

impl OAuth2Config {
    /// Creates a new OAuth2Config with read-only Drive access and default settings
    pub fn new(credentials: ClientCredentials) -> Self {
        Self {
            credentials,
            scopes: vec![DRIVE_READONLY_SCOPE.to_string()],
            callback_host: CALLBACK_HOST.to_string(),
            callback_port: 0,
            open_browser: true,
        }
    }

    /// Creates a config with custom scopes
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Creates a config with a custom redirect listener address
    pub fn with_callback(mut self, host: impl Into<String>, port: u16) -> Self {
        self.callback_host = host.into();
        self.callback_port = port;
        self
    }

    /// Enables or disables launching the browser
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }
}

// ============================================================================
// FileTokenStorage
// ============================================================================

/// Stores the OAuth credential as a JSON file
///
/// The file is written with owner-only permissions on Unix.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    /// Creates a storage backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credential file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ITokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<Tokens>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No credential file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read {}", self.path.display())))
            }
        };

        let tokens: Tokens = serde_json::from_str(&json)
            .with_context(|| format!("Failed to decode credential {}", self.path.display()))?;
        debug!("Credential file {} found", self.path.display());
        Ok(Some(tokens))
    }

    fn store(&self, tokens: &Tokens) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create credential directory {}", parent.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(tokens).context("Failed to serialize tokens")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict {}", self.path.display()))?;
        }

        debug!("Stored credential in {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed credential file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No credential file to remove");
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Failed to remove {}", self.path.display()))),
        }
    }
}

// ============================================================================
// PKCEFlow
// ============================================================================

/// OAuth2 PKCE flow implementation using the `oauth2` crate
///
/// Handles generating authorization URLs with PKCE challenges,
/// exchanging authorization codes for tokens, and refreshing tokens.
pub struct PKCEFlow {
    client: BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>,
    scopes: Vec<String>,
    http_client: reqwest::Client,
}

impl PKCEFlow {
    /// Creates a new PKCEFlow
    ///
    /// # Arguments
    /// * `config` - Client registration and scopes
    /// * `redirect_uri` - Loopback redirect, required for the authorization step only
    pub fn new(config: &OAuth2Config, redirect_uri: Option<&str>) -> Result<Self> {
        let credentials = &config.credentials;
        let mut client = BasicClient::new(ClientId::new(credentials.client_id.clone()))
            .set_auth_uri(
                AuthUrl::new(credentials.auth_uri.clone()).context("Invalid authorization URL")?,
            )
            .set_token_uri(
                TokenUrl::new(credentials.token_uri.clone()).context("Invalid token URL")?,
            )
            .set_auth_type(AuthType::RequestBody);

        if let Some(secret) = &credentials.client_secret {
            client = client.set_client_secret(ClientSecret::new(secret.clone()));
        }
        if let Some(uri) = redirect_uri {
            client = client
                .set_redirect_uri(RedirectUrl::new(uri.to_string()).context("Invalid redirect URI")?);
        }

        // The token endpoint must not be followed through redirects
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            scopes: config.scopes.clone(),
            http_client,
        })
    }

    /// Generates an authorization URL with a PKCE challenge
    ///
    /// Offline access is requested with forced consent so that Google
    /// issues a refresh token on every authorization.
    ///
    /// # Returns
    /// A tuple of `(authorization_url, csrf_token, pkce_verifier)`.
    /// The `pkce_verifier` must be kept until the code exchange step.
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
    ///
    /// # Arguments
    /// * `code` - The authorization code received from the callback
    /// * `pkce_verifier` - The PKCE verifier generated alongside the auth URL
    pub async fn exchange_code(
        &self,
        code: String,
        pkce_verifier: PkceCodeVerifier,
    ) -> Result<Tokens> {
        info!("Exchanging authorization code for tokens");

        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http_client)
            .await
            .context("Failed to exchange authorization code")?;

        Ok(tokens_from_response(&token_result))
    }

    /// Refreshes an expired access token using a refresh token
    ///
    /// The returned tokens carry no refresh token unless Google rotated it.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Tokens> {
        info!("Refreshing access token");

        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http_client)
            .await
            .context("Failed to refresh token")?;

        Ok(tokens_from_response(&token_result))
    }
}

fn tokens_from_response(response: &BasicTokenResponse) -> Tokens {
    let lifetime = response
        .expires_in()
        .and_then(|d| Duration::from_std(d).ok())
        .unwrap_or_else(|| Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS));

    Tokens {
        access_token: response.access_token().secret().to_string(),
        refresh_token: response.refresh_token().map(|t| t.secret().to_string()),
        expires_at: Utc::now() + lifetime,
    }
}

// ============================================================================
// LocalCallbackServer
// ============================================================================

/// Parameters extracted from the OAuth2 callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    /// The authorization code
    pub code: String,
    /// The CSRF state parameter
    pub state: String,
}

/// What a request to the redirect listener carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The user granted access
    Code(CallbackParams),
    /// The consent page reported an error, e.g. `access_denied`
    Error(String),
}

/// Minimal HTTP server that listens on the loopback interface for the OAuth2
/// redirect callback.
///
/// The listener is bound before the consent URL is built so that the
/// OS-chosen port can go into the redirect URI. Requests that carry neither
/// a code nor an error (a browser asking for `/favicon.ico`) are answered
/// with 404 and the server keeps waiting.
pub struct LocalCallbackServer {
    listener: TcpListener,
    host: String,
    port: u16,
}

impl LocalCallbackServer {
    /// Binds the listener; port `0` lets the OS choose
    pub async fn bind(host: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("Failed to bind callback server to {host}:{port}"))?;
        let port = listener
            .local_addr()
            .context("Failed to read callback server address")?
            .port();

        info!("Started local OAuth callback server on {host}:{port}");
        Ok(Self {
            listener,
            host: host.to_string(),
            port,
        })
    }

    /// The port actually bound
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Redirect URI to register in the authorization request
    pub fn redirect_uri(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    /// Waits for the OAuth redirect
    ///
    /// # Returns
    /// The callback parameters (code and state) extracted from the redirect URL
    pub async fn wait(self) -> Result<CallbackParams> {
        use hyper::server::conn::http1;
        use hyper::service::service_fn;
        use hyper_util::rt::TokioIo;

        let (tx, mut rx) = mpsc::channel::<CallbackOutcome>(1);

        loop {
            tokio::select! {
                outcome = rx.recv() => {
                    return match outcome {
                        Some(CallbackOutcome::Code(params)) => {
                            info!("Received OAuth callback with authorization code");
                            Ok(params)
                        }
                        Some(CallbackOutcome::Error(error)) => {
                            Err(DriveError::AuthorizationDenied(error).into())
                        }
                        None => Err(anyhow!("Callback server channel closed")),
                    };
                }
                accepted = self.listener.accept() => {
                    let (stream, addr) =
                        accepted.context("Failed to accept connection on callback server")?;
                    debug!("Callback server connection from {addr}");

                    let tx = tx.clone();
                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let tx = tx.clone();
                        async move { Ok::<_, Infallible>(handle_callback(&req.uri().to_string(), &tx)) }
                    });

                    tokio::spawn(async move {
                        if let Err(e) = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await
                        {
                            warn!("Callback server connection error: {}", e);
                        }
                    });
                }
            }
        }
    }
}

fn handle_callback(uri: &str, tx: &mpsc::Sender<CallbackOutcome>) -> Response<Full<Bytes>> {
    debug!("Callback server received request: {}", uri);

    match parse_callback(uri) {
        Some(outcome @ CallbackOutcome::Code(_)) => {
            let _ = tx.try_send(outcome);
            html_response(StatusCode::OK, success_html())
        }
        Some(CallbackOutcome::Error(error)) => {
            let page = error_html(&error);
            let _ = tx.try_send(CallbackOutcome::Error(error));
            html_response(StatusCode::BAD_REQUEST, page)
        }
        None => html_response(
            StatusCode::NOT_FOUND,
            error_html("Missing authorization code in callback"),
        ),
    }
}

/// Parses the authorization code and state, or the error, from a callback URI
pub fn parse_callback(uri: &str) -> Option<CallbackOutcome> {
    let url = url::Url::parse(&format!("http://localhost{}", uri)).ok()?;
    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut error_description = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => error = Some(value.to_string()),
            "error_description" => error_description = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(CallbackOutcome::Error(match error_description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        }));
    }

    Some(CallbackOutcome::Code(CallbackParams {
        code: code?,
        state: state.unwrap_or_default(),
    }))
}

fn html_response(status: StatusCode, html: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(html)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

/// Returns the HTML for a successful authentication page
fn success_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>drivesync - Authentication Successful</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Authentication Successful</h1>
    <p>drivesync can now read your Google Drive files.</p>
    <p>You can close this window and return to the terminal.</p>
</body>
</html>"#
        .to_string()
}

/// Returns the HTML for an authentication error page
fn error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>drivesync - Authentication Error</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Authentication Error</h1>
    <p>{}</p>
    <p>Please close this window and try again.</p>
</body>
</html>"#,
        html_escape(message)
    )
}

/// Escapes text for use inside HTML element content or attribute values
fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// GoogleAuthenticator
// ============================================================================

/// Authenticator that orchestrates the full OAuth2 PKCE flow.
///
/// Combines [`PKCEFlow`], [`LocalCallbackServer`], and browser launching to
/// provide a complete interactive authentication experience:
///
/// 1. Binds the loopback redirect listener
/// 2. Generates the PKCE authorization URL and logs it
/// 3. Opens the user's browser at the Google consent page
/// 4. Waits for the redirect and checks its CSRF state
/// 5. Exchanges the authorization code for tokens
pub struct GoogleAuthenticator {
    config: OAuth2Config,
}

impl GoogleAuthenticator {
    /// Creates a new GoogleAuthenticator with the given configuration
    pub fn new(config: OAuth2Config) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl IAuthenticator for GoogleAuthenticator {
    async fn authorize(&self) -> Result<Tokens> {
        info!("Starting OAuth2 PKCE login flow");

        let server =
            LocalCallbackServer::bind(&self.config.callback_host, self.config.callback_port)
                .await?;
        let redirect_uri = server.redirect_uri();
        let flow = PKCEFlow::new(&self.config, Some(&redirect_uri))?;

        let (auth_url, csrf_token, pkce_verifier) = flow.generate_auth_url();
        info!("Please visit this URL to authorize this application: {auth_url}");

        if self.config.open_browser {
            if let Err(e) = webbrowser::open(&auth_url) {
                warn!("Failed to open browser: {e}");
            }
        }

        let callback = server.wait().await?;
        if callback.state != *csrf_token.secret() {
            return Err(DriveError::CsrfMismatch.into());
        }

        let tokens = flow.exchange_code(callback.code, pkce_verifier).await?;
        info!("OAuth2 PKCE login completed successfully");
        Ok(tokens)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Tokens> {
        let flow = PKCEFlow::new(&self.config, None)?;
        flow.refresh_token(refresh_token).await
    }
}
