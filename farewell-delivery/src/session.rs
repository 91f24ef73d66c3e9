//! One SMTP session per claimer run.
//!
//! The session is opened and authenticated once, reused for every
//! recipient in the batch, and closed with QUIT on the way out. A
//! rejected transaction is reset with RSET so the next recipient can
//! proceed on the same connection.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use farewell_smtp::client::{Response, SmtpClient};

use crate::{
    error::{DeliveryError, TransportError},
    timeouts::SmtpTimeouts,
};

/// Connection security for the SMTP path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Security {
    /// Plain TCP end to end. Only sensible against a local test server.
    None,
    /// Plain TCP upgraded with STARTTLS (ports 587/25).
    #[default]
    Starttls,
    /// TLS from the first byte (SMTPS, port 465).
    Implicit,
}

/// SMTP credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Everything needed to open an SMTP session.
#[derive(Debug, Clone)]
pub struct SmtpSessionConfig {
    pub host: String,
    pub port: u16,
    pub security: Security,
    pub credentials: Option<Credentials>,
    /// Domain announced in EHLO.
    pub helo_domain: String,
    /// Accept self-signed certificates. Test hook only.
    pub accept_invalid_certs: bool,
}

impl SmtpSessionConfig {
    fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// An open, authenticated SMTP session.
pub struct SmtpSession {
    client: SmtpClient,
    timeouts: SmtpTimeouts,
    server_address: String,
}

impl SmtpSession {
    /// Connects, negotiates TLS per the configured security mode, and
    /// authenticates.
    ///
    /// # Errors
    ///
    /// Any error here aborts the run: the server is unreachable, rejected
    /// TLS where the preset requires it, or refused the credentials.
    pub async fn open(
        config: SmtpSessionConfig,
        timeouts: SmtpTimeouts,
    ) -> Result<Self, DeliveryError> {
        let server_address = config.server_address();
        let connect_timeout = Duration::from_secs(timeouts.connect_secs);

        let client = match config.security {
            Security::Implicit => timeout(
                connect_timeout,
                SmtpClient::connect_tls(&server_address, config.host.clone()),
            )
            .await
            .map_err(|_| {
                TransportError::Timeout(format!("Connect timed out after {connect_timeout:?}"))
            })??,
            Security::Starttls | Security::None => timeout(
                connect_timeout,
                SmtpClient::connect(&server_address, config.host.clone()),
            )
            .await
            .map_err(|_| {
                TransportError::Timeout(format!("Connect timed out after {connect_timeout:?}"))
            })??,
        };
        let mut client = client.accept_invalid_certs(config.accept_invalid_certs);

        let greeting = timeout(connect_timeout, client.read_greeting())
            .await
            .map_err(|_| {
                TransportError::Timeout(format!("Greeting timed out after {connect_timeout:?}"))
            })??;
        if !greeting.is_success() {
            return Err(TransportError::ConnectionFailed(format!(
                "Server rejected connection: {}",
                greeting.message()
            ))
            .into());
        }

        let ehlo_timeout = Duration::from_secs(timeouts.ehlo_secs);
        let mut ehlo_response = timeout(ehlo_timeout, client.ehlo(&config.helo_domain))
            .await
            .map_err(|_| {
                TransportError::Timeout(format!("EHLO timed out after {ehlo_timeout:?}"))
            })??;
        if !ehlo_response.is_success() {
            return Err(TransportError::ConnectionFailed(format!(
                "Server rejected EHLO: {}",
                ehlo_response.message()
            ))
            .into());
        }

        if config.security == Security::Starttls {
            let starttls_timeout = Duration::from_secs(timeouts.starttls_secs);
            let starttls_response = timeout(starttls_timeout, client.starttls())
                .await
                .map_err(|_| {
                    TransportError::Timeout(format!(
                        "STARTTLS timed out after {starttls_timeout:?}"
                    ))
                })??;
            if !starttls_response.is_success() {
                // No plaintext fallback when the preset demands TLS
                return Err(TransportError::TlsFailed(format!(
                    "Server rejected STARTTLS: {}",
                    starttls_response.message()
                ))
                .into());
            }

            // RFC 3207: state resets after the TLS handshake
            ehlo_response = timeout(ehlo_timeout, client.ehlo(&config.helo_domain))
                .await
                .map_err(|_| {
                    TransportError::Timeout(format!(
                        "EHLO after STARTTLS timed out after {ehlo_timeout:?}"
                    ))
                })??;
            if !ehlo_response.is_success() {
                return Err(TransportError::ConnectionFailed(format!(
                    "Server rejected EHLO after STARTTLS: {}",
                    ehlo_response.message()
                ))
                .into());
            }

            debug!(server = %server_address, "TLS negotiated via STARTTLS");
        }

        if let Some(credentials) = &config.credentials {
            let auth_timeout = Duration::from_secs(timeouts.auth_secs);
            let use_plain = ehlo_response.advertises("PLAIN");

            let auth = async {
                if use_plain {
                    client
                        .auth_plain(&credentials.username, &credentials.password)
                        .await
                } else {
                    client
                        .auth_login(&credentials.username, &credentials.password)
                        .await
                }
            };

            timeout(auth_timeout, auth).await.map_err(|_| {
                TransportError::Timeout(format!("AUTH timed out after {auth_timeout:?}"))
            })??;

            debug!(server = %server_address, username = %credentials.username, "Authenticated");
        }

        Ok(Self {
            client,
            timeouts,
            server_address,
        })
    }

    /// Sends one message to one recipient on the open session.
    ///
    /// On a rejected transaction the session is reset with RSET so the
    /// caller can continue with the next recipient.
    ///
    /// # Errors
    ///
    /// Returns a recipient-scoped [`DeliveryError::Transport`] on
    /// rejection, timeout, or connection failure.
    pub async fn send(
        &mut self,
        from: &str,
        recipient: &str,
        data: &str,
    ) -> Result<(), DeliveryError> {
        let mail_from_timeout = Duration::from_secs(self.timeouts.mail_from_secs);
        let mail_response = timeout(mail_from_timeout, self.client.mail_from(from))
            .await
            .map_err(|_| {
                TransportError::Timeout(format!("MAIL FROM timed out after {mail_from_timeout:?}"))
            })??;
        if !mail_response.is_success() {
            return Err(self.reject(&mail_response, RejectionStage::MailFrom).await);
        }

        let rcpt_to_timeout = Duration::from_secs(self.timeouts.rcpt_to_secs);
        let rcpt_response = timeout(rcpt_to_timeout, self.client.rcpt_to(recipient))
            .await
            .map_err(|_| {
                TransportError::Timeout(format!("RCPT TO timed out after {rcpt_to_timeout:?}"))
            })??;
        if !rcpt_response.is_success() {
            return Err(self.reject(&rcpt_response, RejectionStage::RcptTo).await);
        }

        let data_timeout = Duration::from_secs(self.timeouts.data_secs);
        let data_response = timeout(data_timeout, self.client.data())
            .await
            .map_err(|_| {
                TransportError::Timeout(format!("DATA timed out after {data_timeout:?}"))
            })??;
        if !data_response.is_intermediate() {
            return Err(self.reject(&data_response, RejectionStage::Data).await);
        }

        let send_response = timeout(data_timeout, self.client.send_data(data))
            .await
            .map_err(|_| {
                TransportError::Timeout(format!(
                    "Sending message data timed out after {data_timeout:?}"
                ))
            })??;
        if !send_response.is_success() {
            return Err(self.reject(&send_response, RejectionStage::Data).await);
        }

        Ok(())
    }

    /// Classifies a rejection and resets the transaction so the session
    /// stays usable.
    async fn reject(&mut self, response: &Response, stage: RejectionStage) -> DeliveryError {
        let _ = self.client.rset().await;

        let detail = format!("{} {}", response.code, response.message());
        let error = if response.is_permanent_error() {
            match stage {
                RejectionStage::RcptTo => TransportError::RecipientRejected(detail),
                RejectionStage::MailFrom | RejectionStage::Data => {
                    TransportError::MessageRejected(detail)
                }
            }
        } else {
            TransportError::SmtpTemporary(detail)
        };

        error.into()
    }

    /// Sends QUIT and drops the connection. A QUIT failure after
    /// successful deliveries is logged, not surfaced.
    pub async fn quit(mut self) {
        let quit_timeout = Duration::from_secs(self.timeouts.quit_secs);
        match timeout(quit_timeout, self.client.quit()).await {
            Ok(Ok(_)) => debug!(server = %self.server_address, "SMTP session closed"),
            Ok(Err(e)) => warn!(server = %self.server_address, "QUIT failed: {e}"),
            Err(_) => warn!(server = %self.server_address, "QUIT timed out"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RejectionStage {
    MailFrom,
    RcptTo,
    Data,
}
