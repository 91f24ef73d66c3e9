//! Error types for the Gmail transport.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors that can occur during OAuth or Gmail API operations.
#[derive(Debug, Error)]
pub enum GmailError {
    /// The client-secret file is missing.
    #[error("OAuth credentials file not found: {}", .0.display())]
    CredentialsMissing(PathBuf),

    /// The client-secret file could not be parsed.
    #[error("Invalid OAuth credentials file: {0}")]
    CredentialsInvalid(String),

    /// The interactive consent flow failed.
    #[error("OAuth consent flow failed: {0}")]
    ConsentFlow(String),

    /// The authorization server returned a state we did not send.
    #[error("OAuth state parameter mismatch")]
    StateMismatch,

    /// Exchanging the authorization code for tokens failed.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// Refreshing an expired access token failed.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Gmail API returned an error status.
    #[error("Gmail API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// I/O error reading or persisting token files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Token file serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GmailError {
    /// Returns `true` if the error means the run cannot authenticate at
    /// all (as opposed to a per-message transport failure).
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::CredentialsMissing(_)
                | Self::CredentialsInvalid(_)
                | Self::ConsentFlow(_)
                | Self::StateMismatch
                | Self::TokenExchange(_)
                | Self::RefreshFailed(_)
        )
    }
}

/// Specialized `Result` type for Gmail operations.
pub type Result<T> = std::result::Result<T, GmailError>;
