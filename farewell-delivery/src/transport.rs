//! Transport dispatch between the SMTP and Gmail API paths.

use farewell_common::address::Address;
use farewell_gmail::GmailTransport;
use farewell_smtp::client::ComposedMessage;
use tracing::debug;

use crate::{error::DeliveryError, session::SmtpSession};

/// The outcome of a successful send.
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// The raw bytes to export as the `.eml` file. For SMTP this is
    /// exactly what went on the wire; for Gmail it is the provider's
    /// canonical copy when retrievable.
    pub raw: Vec<u8>,
    /// Provider-side message id, when the provider assigns one.
    pub provider_id: Option<String>,
}

/// The per-run transport session, selected by configuration.
///
/// The two paths are mutually exclusive: a run either speaks SMTP for
/// every recipient or the Gmail REST API for every recipient.
pub enum Transport {
    Smtp(SmtpSession),
    Gmail(GmailTransport),
}

impl Transport {
    /// Sends one composed message to one recipient.
    ///
    /// # Errors
    ///
    /// Returns a recipient-scoped transport error; authentication and
    /// configuration failures surface from session setup, not here.
    pub async fn send(
        &mut self,
        sender: &Address,
        recipient: &Address,
        message: &ComposedMessage,
    ) -> Result<SentMessage, DeliveryError> {
        match self {
            Self::Smtp(session) => {
                session
                    .send(&sender.to_string(), &recipient.to_string(), &message.content)
                    .await?;
                Ok(SentMessage {
                    raw: message.content.clone().into_bytes(),
                    provider_id: None,
                })
            }
            Self::Gmail(transport) => {
                let sent = transport.send(message.as_bytes()).await?;
                if !sent.canonical {
                    debug!(recipient = %recipient, "Exporting locally composed bytes");
                }
                Ok(SentMessage {
                    raw: sent.raw,
                    provider_id: Some(sent.id),
                })
            }
        }
    }

    /// Releases the session. Always called on the way out, success or not.
    pub async fn close(self) {
        match self {
            Self::Smtp(session) => session.quit().await,
            Self::Gmail(_) => {} // stateless HTTP; nothing to release
        }
    }
}
