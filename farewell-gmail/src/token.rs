//! File-backed OAuth token store.
//!
//! The lifecycle is deliberately simple: the token is created on first
//! consent, refreshed when it nears expiry, and deleted by the user to
//! force re-authorization. The store is an explicit value passed into the
//! transport rather than ambient global state.

use std::path::{Path, PathBuf};

use oauth2::{
    AuthUrl, ClientId, CsrfToken, PkceCodeChallenge, RedirectUrl, Scope, TokenUrl,
    basic::BasicClient,
};
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use tracing::{debug, info, warn};

use crate::error::{GmailError, Result};

/// OAuth scopes: send permission plus metadata for profile access.
pub const GMAIL_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.metadata",
];

/// Default client-secret filename (downloaded from Google Cloud Console).
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Default persisted-token filename (written by this tool).
pub const TOKEN_FILE: &str = "token.json";

/// Refresh when the token expires within this many seconds.
const REFRESH_WINDOW_SECS: i64 = 300;

/// The `installed` section of a Google client-secret file.
#[derive(Debug, Clone, Deserialize)]
struct InstalledSecrets {
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
}

#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: Option<InstalledSecrets>,
    web: Option<InstalledSecrets>,
}

/// Persisted OAuth tokens (`token.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    /// Bearer token for API requests.
    pub access_token: String,
    /// Refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,
    /// Expiry as a Unix timestamp.
    pub expires_at: Option<i64>,
    /// Scopes granted.
    pub scopes: Vec<String>,
}

impl StoredToken {
    /// Returns `true` if the token is missing expiry information or
    /// expires within the refresh window.
    #[must_use]
    pub fn should_refresh(&self) -> bool {
        self.expires_at.is_none_or(|expires_at| {
            chrono::Utc::now().timestamp() + REFRESH_WINDOW_SECS >= expires_at
        })
    }
}

/// Wire shape of Google's token endpoint responses.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

/// File-backed OAuth token store for the Gmail transport.
#[derive(Debug)]
pub struct TokenStore {
    token_path: PathBuf,
    secrets: InstalledSecrets,
}

impl TokenStore {
    /// Loads the client secrets, failing fast if `credentials.json` is
    /// missing or malformed.
    ///
    /// # Errors
    ///
    /// Returns [`GmailError::CredentialsMissing`] or
    /// [`GmailError::CredentialsInvalid`].
    pub fn load(credentials_path: &Path, token_path: &Path) -> Result<Self> {
        if !credentials_path.exists() {
            return Err(GmailError::CredentialsMissing(credentials_path.to_path_buf()));
        }

        let raw = std::fs::read_to_string(credentials_path)?;
        let file: SecretsFile = serde_json::from_str(&raw)
            .map_err(|e| GmailError::CredentialsInvalid(e.to_string()))?;

        let secrets = file
            .installed
            .or(file.web)
            .ok_or_else(|| {
                GmailError::CredentialsInvalid(
                    "expected an 'installed' (Desktop app) client secret".to_string(),
                )
            })?;

        Ok(Self {
            token_path: token_path.to_path_buf(),
            secrets,
        })
    }

    /// Returns a usable access token: the persisted one if still valid,
    /// a refreshed one if expired, or a brand-new one via the interactive
    /// consent flow. The result is persisted to `token.json`.
    ///
    /// `open_url` is invoked with the authorization URL when user consent
    /// is required; the caller decides how to surface it.
    ///
    /// # Errors
    ///
    /// Returns an error if every path to a valid token fails.
    pub async fn ensure_token(&self, open_url: impl FnOnce(&str)) -> Result<StoredToken> {
        if let Some(stored) = self.read_stored()? {
            if !stored.should_refresh() {
                debug!("Using persisted OAuth token");
                return Ok(stored);
            }

            if let Some(refresh_token) = stored.refresh_token.clone() {
                info!("Refreshing expired OAuth token");
                match self.refresh(&refresh_token).await {
                    Ok(token) => {
                        self.persist(&token)?;
                        return Ok(token);
                    }
                    Err(e) => {
                        warn!("Could not refresh token: {e}");
                    }
                }
            }
        }

        let token = self.authorize_interactive(open_url).await?;
        self.persist(&token)?;
        info!(path = %self.token_path.display(), "Token saved for future use");
        Ok(token)
    }

    /// Loads `token.json` if present.
    fn read_stored(&self) -> Result<Option<StoredToken>> {
        if !self.token_path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&self.token_path)?;
        match serde_json::from_str(&raw) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                warn!("Ignoring unreadable token file: {e}");
                Ok(None)
            }
        }
    }

    /// Persists the token to `token.json`.
    fn persist(&self, token: &StoredToken) -> Result<()> {
        std::fs::write(&self.token_path, serde_json::to_string_pretty(token)?)?;
        Ok(())
    }

    /// Exchanges a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<StoredToken> {
        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = reqwest::Client::new()
            .post(&self.secrets.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| GmailError::RefreshFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GmailError::RefreshFailed(error_text));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| GmailError::RefreshFailed(e.to_string()))?;

        Ok(self.stored_from_response(token_response, Some(refresh_token)))
    }

    /// Runs the installed-app consent flow: loopback redirect listener,
    /// browser authorization with PKCE, then code exchange.
    async fn authorize_interactive(&self, open_url: impl FnOnce(&str)) -> Result<StoredToken> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| GmailError::ConsentFlow(format!("could not bind redirect port: {e}")))?;
        let redirect_uri = format!("http://127.0.0.1:{}", listener.local_addr()?.port());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let client = BasicClient::new(ClientId::new(self.secrets.client_id.clone()))
            .set_auth_uri(
                AuthUrl::new(self.secrets.auth_uri.clone())
                    .map_err(|e| GmailError::ConsentFlow(e.to_string()))?,
            )
            .set_token_uri(
                TokenUrl::new(self.secrets.token_uri.clone())
                    .map_err(|e| GmailError::ConsentFlow(e.to_string()))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(redirect_uri.clone())
                    .map_err(|e| GmailError::ConsentFlow(e.to_string()))?,
            );

        let (auth_url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(GMAIL_SCOPES.iter().map(|s| Scope::new((*s).to_string())))
            .set_pkce_challenge(pkce_challenge)
            // Google needs access_type=offline for a refresh token
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();

        open_url(auth_url.as_str());

        let (code, state) = wait_for_redirect(&listener).await?;
        if state != *csrf_token.secret() {
            return Err(GmailError::StateMismatch);
        }

        self.exchange_code(&code, pkce_verifier.secret(), &redirect_uri)
            .await
    }

    /// Exchanges the authorization code for tokens.
    async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
        redirect_uri: &str,
    ) -> Result<StoredToken> {
        let params = [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", pkce_verifier),
            ("redirect_uri", redirect_uri),
        ];

        let response = reqwest::Client::new()
            .post(&self.secrets.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| GmailError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GmailError::TokenExchange(error_text));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| GmailError::TokenExchange(e.to_string()))?;

        Ok(self.stored_from_response(token_response, None))
    }

    fn stored_from_response(
        &self,
        response: TokenResponse,
        previous_refresh_token: Option<&str>,
    ) -> StoredToken {
        let expires_at = response
            .expires_in
            .map(|secs| chrono::Utc::now().timestamp() + i64::try_from(secs).unwrap_or(0));

        // Some refresh responses omit the refresh token; keep the old one
        let refresh_token = response
            .refresh_token
            .or_else(|| previous_refresh_token.map(ToString::to_string));

        StoredToken {
            access_token: response.access_token,
            refresh_token,
            expires_at,
            scopes: GMAIL_SCOPES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Waits for the single authorization redirect and extracts `code` and
/// `state` from its query string.
async fn wait_for_redirect(listener: &TcpListener) -> Result<(String, String)> {
    let (mut stream, _peer) = listener
        .accept()
        .await
        .map_err(|e| GmailError::ConsentFlow(format!("redirect listener failed: {e}")))?;

    let mut buffer = vec![0u8; 8192];
    let n = stream.read(&mut buffer).await?;
    let request = String::from_utf8_lossy(&buffer[..n]);

    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| GmailError::ConsentFlow("malformed redirect request".to_string()))?;

    let url = url::Url::parse(&format!("http://127.0.0.1{target}"))
        .map_err(|e| GmailError::ConsentFlow(format!("malformed redirect target: {e}")))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Err(GmailError::ConsentFlow(format!(
                    "authorization denied: {value}"
                )));
            }
            _ => {}
        }
    }

    let body = "Authorization received. You can close this tab and return to the terminal.";
    let reply = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(reply.as_bytes()).await;

    match (code, state) {
        (Some(code), Some(state)) => Ok((code, state)),
        _ => Err(GmailError::ConsentFlow(
            "redirect did not include code and state".to_string(),
        )),
    }
}
