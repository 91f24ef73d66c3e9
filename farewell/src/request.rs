//! The message request: what to send, to whom, committed to which hash.
//!
//! Requests arrive either as a JSON file exported from the Farewell UI or
//! from interactive prompts. Both paths funnel through the same
//! validation, and validation happens before any network activity.

use std::{fmt, path::Path};

use serde::Deserialize;

use farewell_common::{
    address::{Address, AddressList},
    hash::ContentHash,
};

use crate::error::InputError;

/// Subject used when the input does not carry one.
pub const DEFAULT_SUBJECT: &str = "Farewell Message Delivery";

/// Recipients may be a JSON list or a single comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipientsField {
    List(Vec<String>),
    CommaSeparated(String),
}

impl RecipientsField {
    fn into_strings(self) -> Vec<String> {
        match self {
            Self::List(list) => list,
            Self::CommaSeparated(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Wire shape of the exported JSON; validation happens in `validate`.
#[derive(Debug, Deserialize)]
struct RawRequest {
    recipients: Option<RecipientsField>,
    #[serde(rename = "contentHash", alias = "content_hash")]
    content_hash: Option<String>,
    message: Option<String>,
    subject: Option<String>,
    #[serde(rename = "publicMessage", alias = "public_message")]
    public_message: Option<String>,
    #[serde(rename = "skShare", alias = "sk_share")]
    sk_share: Option<String>,
}

/// A validated message request, read-only once sending begins.
#[derive(Clone)]
pub struct MessageRequest {
    pub recipients: AddressList,
    pub content_hash: ContentHash,
    pub message: String,
    pub subject: String,
    pub public_message: Option<String>,
    /// Secret-key share carried through from the UI export. Never logged.
    pub sk_share: Option<String>,
}

impl fmt::Debug for MessageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageRequest")
            .field("recipients", &self.recipients)
            .field("content_hash", &self.content_hash)
            .field("subject", &self.subject)
            .field("sk_share", &self.sk_share.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl MessageRequest {
    /// Loads and validates a request from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] for a missing file, malformed JSON,
    /// missing fields, invalid addresses, or a non-hex hash.
    pub fn load(path: &Path) -> Result<Self, InputError> {
        if !path.exists() {
            return Err(InputError::FileNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parses and validates a request from a JSON string.
    ///
    /// # Errors
    ///
    /// See [`MessageRequest::load`].
    pub fn from_json(input: &str) -> Result<Self, InputError> {
        let raw: RawRequest = serde_json::from_str(input)?;

        let recipients = raw
            .recipients
            .ok_or(InputError::MissingField("recipients"))?
            .into_strings();
        let content_hash = raw
            .content_hash
            .ok_or(InputError::MissingField("contentHash"))?;
        let message = raw.message.ok_or(InputError::MissingField("message"))?;

        let mut request = Self::from_parts(recipients, &content_hash, message, raw.subject)?;
        request.public_message = raw.public_message;
        request.sk_share = raw.sk_share;
        Ok(request)
    }

    /// Builds and validates a request from already-split parts (the
    /// interactive path).
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] for an empty recipient list, invalid
    /// addresses, or a non-hex hash.
    pub fn from_parts(
        recipients: Vec<String>,
        content_hash: &str,
        message: String,
        subject: Option<String>,
    ) -> Result<Self, InputError> {
        if recipients.is_empty() {
            return Err(InputError::NoRecipients);
        }

        let recipients = recipients
            .into_iter()
            .map(|raw| {
                Address::parse(&raw).map_err(|source| InputError::InvalidRecipient {
                    address: raw,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let content_hash = ContentHash::parse(content_hash)?;

        Ok(Self {
            recipients: AddressList(recipients),
            content_hash,
            message,
            subject: subject.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            public_message: None,
            sk_share: None,
        })
    }
}
