//! SMTP submission client for sending farewell messages.
//!
//! This module provides a blocking-per-command async SMTP client aimed at
//! mail submission servers (ports 587 and 465):
//!
//! - Plain TCP, implicit TLS, and STARTTLS upgrade
//! - AUTH PLAIN and AUTH LOGIN
//! - Response inspection for assertions
//!
//! It also provides [`MessageBuilder`], which composes the farewell MIME
//! document with the embedded `Farewell-Hash` marker.
//!
//! # Examples
//!
//! ```no_run
//! use farewell_smtp::client::SmtpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = SmtpClient::connect("smtp.example.com:587", "smtp.example.com".into()).await?;
//! client.read_greeting().await?;
//! client.ehlo("localhost").await?;
//! client.starttls().await?;
//! client.ehlo("localhost").await?;
//! client.auth_plain("user@example.com", "app-password").await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod message;
mod response;
mod smtp_client;

pub use error::{ClientError, Result};
pub use message::{ComposedMessage, MessageBuilder};
pub use response::{Response, ResponseLine};
pub use smtp_client::SmtpClient;
