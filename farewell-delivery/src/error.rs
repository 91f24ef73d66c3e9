//! Typed error handling for delivery operations.
//!
//! The taxonomy follows how failures scope a claimer run:
//! - Configuration errors abort before any network activity
//! - Authentication errors abort the run
//! - Transport errors are recipient-scoped; the batch continues
//! - System errors indicate internal problems

use thiserror::Error;

use farewell_gmail::GmailError;
use farewell_smtp::client::ClientError;

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Missing or invalid provider settings. Raised before any send.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Bad credentials, expired/revoked OAuth token, rejected AUTH.
    /// Aborts the run; there is no recipient-specific fallback.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Per-recipient transport failure. The run continues with the next
    /// recipient.
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Internal error (protocol violation, serialization, bugs).
    #[error("System error: {0}")]
    System(String),
}

/// Recipient-scoped transport failures.
///
/// SMTP 4xx codes classify as temporary, 5xx as permanent. Nothing is
/// retried; the distinction only shows up in the final summary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish or keep the connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An operation exceeded its timeout.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Provider rate limiting.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Server returned a temporary (4xx) failure.
    #[error("Temporary SMTP error: {0}")]
    SmtpTemporary(String),

    /// Server rejected the recipient (5xx on RCPT TO).
    #[error("Recipient rejected: {0}")]
    RecipientRejected(String),

    /// Server rejected the message (5xx on MAIL FROM or DATA).
    #[error("Message rejected: {0}")]
    MessageRejected(String),

    /// TLS negotiation failed.
    #[error("TLS failed: {0}")]
    TlsFailed(String),

    /// The provider's HTTP API returned an error.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl TransportError {
    /// Returns `true` if retrying later could plausibly succeed.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::Timeout(_)
                | Self::RateLimited(_)
                | Self::SmtpTemporary(_)
                | Self::TlsFailed(_)
        )
    }
}

impl DeliveryError {
    /// Returns `true` if this failure is scoped to a single recipient.
    #[must_use]
    pub const fn is_recipient_scoped(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Classify SMTP client errors.
///
/// - 4xx SMTP codes -> temporary transport failures
/// - 5xx SMTP codes -> permanent transport failures
/// - Connection/I-O errors -> transport (the session may be dead, but the
///   caller decides whether to keep going)
/// - AUTH rejections -> authentication
/// - Parse/builder errors -> system
impl From<ClientError> for DeliveryError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::AuthRejected { code, message } => {
                Self::Authentication(format!("{code} {message}"))
            }

            ClientError::SmtpError { code, message } if (400..500).contains(&code) => {
                Self::Transport(TransportError::SmtpTemporary(format!("{code} {message}")))
            }

            ClientError::SmtpError { code, message } => {
                Self::Transport(TransportError::MessageRejected(format!("{code} {message}")))
            }

            ClientError::Io(e) => {
                Self::Transport(TransportError::ConnectionFailed(format!("I/O error: {e}")))
            }

            ClientError::ConnectionClosed => Self::Transport(TransportError::ConnectionFailed(
                "Connection closed unexpectedly".to_string(),
            )),

            ClientError::TlsError(msg) => Self::Transport(TransportError::TlsFailed(msg)),

            ClientError::ParseError(msg) => {
                Self::System(format!("SMTP protocol parse error: {msg}"))
            }

            ClientError::BuilderError(msg) => Self::System(format!("Message build error: {msg}")),

            ClientError::Utf8Error(e) => Self::System(format!("UTF-8 decoding error: {e}")),
        }
    }
}

/// Classify Gmail transport errors: anything on the token/consent path is
/// an authentication failure, HTTP 429 is rate limiting, other API errors
/// are recipient-scoped transport failures.
impl From<GmailError> for DeliveryError {
    fn from(error: GmailError) -> Self {
        if error.is_authentication() {
            return Self::Authentication(error.to_string());
        }

        match error {
            GmailError::Api { status: 429, message } => {
                Self::Transport(TransportError::RateLimited(message))
            }
            GmailError::Api { status: 401 | 403, message } => {
                Self::Authentication(format!("Gmail API refused the token: {message}"))
            }
            GmailError::Api { status, message } => {
                Self::Transport(TransportError::Api { status, message })
            }
            GmailError::Http(e) => {
                Self::Transport(TransportError::ConnectionFailed(e.to_string()))
            }
            e => Self::System(e.to_string()),
        }
    }
}
