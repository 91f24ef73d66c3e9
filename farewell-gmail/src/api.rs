//! Gmail REST API client for sending and retrieving messages.

use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::URL_SAFE_NO_PAD},
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::{GmailError, Result},
    token::{StoredToken, TokenStore},
};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Gmail returns URL-safe base64 that may or may not carry padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(rename = "emailAddress")]
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    raw: Option<String>,
}

/// A message accepted by the Gmail API.
#[derive(Debug, Clone)]
pub struct SentGmailMessage {
    /// Gmail's message id.
    pub id: String,
    /// The message bytes to export.
    pub raw: Vec<u8>,
    /// Whether `raw` is the provider's canonical copy (headers may have
    /// been rewritten server-side) or the locally composed fallback.
    pub canonical: bool,
}

/// An authenticated Gmail API session.
pub struct GmailTransport {
    http: reqwest::Client,
    access_token: String,
    email_address: String,
}

impl GmailTransport {
    /// Authenticates via the token store and resolves the account's email
    /// address from the profile endpoint.
    ///
    /// `open_url` is forwarded to the token store for the consent flow.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid token can be obtained or the profile
    /// lookup fails.
    pub async fn connect(store: &TokenStore, open_url: impl FnOnce(&str)) -> Result<Self> {
        let token: StoredToken = store.ensure_token(open_url).await?;
        let http = reqwest::Client::new();

        let profile = fetch_profile(&http, &token.access_token).await?;
        debug!(email = %profile.email_address, "Gmail OAuth session established");

        Ok(Self {
            http,
            access_token: token.access_token,
            email_address: profile.email_address,
        })
    }

    /// The authenticated account's email address.
    #[must_use]
    pub fn email_address(&self) -> &str {
        &self.email_address
    }

    /// Submits the raw message and retrieves the provider's canonical copy.
    ///
    /// The server may rewrite headers, so the canonical copy is what the
    /// DKIM-based verifier must see. If retrieval fails (e.g. scope does
    /// not permit reading), the locally composed bytes are exported
    /// instead, with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the send itself fails.
    pub async fn send(&self, raw_message: &[u8]) -> Result<SentGmailMessage> {
        let encoded = URL_SAFE_NO_PAD.encode(raw_message);

        let response = self
            .http
            .post(format!("{GMAIL_API_BASE}/users/me/messages/send"))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "raw": encoded }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GmailError::Api { status, message });
        }

        let sent: SendResponse = response.json().await?;
        debug!(id = %sent.id, "Message accepted by Gmail API");

        match self.fetch_raw(&sent.id).await {
            Ok(Some(canonical)) => Ok(SentGmailMessage {
                id: sent.id,
                raw: canonical,
                canonical: true,
            }),
            Ok(None) => {
                warn!("Gmail returned no raw payload; exporting locally composed bytes");
                Ok(SentGmailMessage {
                    id: sent.id,
                    raw: raw_message.to_vec(),
                    canonical: false,
                })
            }
            Err(e) => {
                warn!("Could not fetch canonical copy ({e}); exporting locally composed bytes");
                Ok(SentGmailMessage {
                    id: sent.id,
                    raw: raw_message.to_vec(),
                    canonical: false,
                })
            }
        }
    }

    /// Fetches the canonical copy of a sent message.
    async fn fetch_raw(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let response = self
            .http
            .get(format!("{GMAIL_API_BASE}/users/me/messages/{id}"))
            .query(&[("format", "raw")])
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GmailError::Api { status, message });
        }

        let message: RawMessage = response.json().await?;
        match message.raw {
            Some(raw) => {
                let decoded = URL_SAFE_LENIENT
                    .decode(raw)
                    .map_err(|e| GmailError::Api {
                        status: 200,
                        message: format!("undecodable raw payload: {e}"),
                    })?;
                Ok(Some(decoded))
            }
            None => Ok(None),
        }
    }
}

async fn fetch_profile(http: &reqwest::Client, access_token: &str) -> Result<Profile> {
    let response = http
        .get(format!("{GMAIL_API_BASE}/users/me/profile"))
        .bearer_auth(access_token)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        return Err(GmailError::Api { status, message });
    }

    Ok(response.json().await?)
}
