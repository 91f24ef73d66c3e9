//! Farewell message composer.
//!
//! Builds the `multipart/alternative` MIME document sent to every recipient.
//! The plain-text part carries the `Farewell-Hash` marker block verbatim.
//! An external verifier parses it textually, so no content-transfer-encoding
//! is applied to that part and the marker line is byte-identical regardless
//! of the surrounding body.

use std::io::Write;

use farewell_common::{address::Address, hash::ContentHash};

use super::error::{ClientError, Result};

/// A composed farewell email, ready for transmission.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    /// The generated `Message-ID` header value, angle brackets included.
    pub message_id: String,
    /// The full MIME document, CRLF line endings throughout.
    pub content: String,
}

impl ComposedMessage {
    /// The raw bytes as they will be placed on the wire.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
}

/// Builder for the farewell MIME message.
///
/// # Examples
///
/// ```
/// use farewell_common::{address::Address, hash::ContentHash};
/// use farewell_smtp::client::MessageBuilder;
///
/// let message = MessageBuilder::new()
///     .from(Address::parse("sender@example.com").unwrap())
///     .display_name("Pedro")
///     .to(Address::parse("recipient@example.com").unwrap())
///     .subject("Farewell Message Delivery")
///     .body("Goodbye, and thanks for everything.")
///     .content_hash(ContentHash::parse("0xdead").unwrap())
///     .build()
///     .unwrap();
///
/// assert!(message.content.contains("Farewell-Hash: 0xdead"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<Address>,
    display_name: Option<String>,
    to: Option<Address>,
    subject: Option<String>,
    body: Option<String>,
    content_hash: Option<ContentHash>,
}

impl MessageBuilder {
    /// Creates a new empty message builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender address.
    #[must_use]
    pub fn from(mut self, address: Address) -> Self {
        self.from = Some(address);
        self
    }

    /// Sets the sender display name.
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the recipient address.
    #[must_use]
    pub fn to(mut self, address: Address) -> Self {
        self.to = Some(address);
        self
    }

    /// Sets the Subject header.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the message body text.
    #[must_use]
    pub fn body(mut self, content: impl Into<String>) -> Self {
        self.body = Some(content.into());
        self
    }

    /// Sets the content hash embedded in the marker block.
    #[must_use]
    pub fn content_hash(mut self, hash: ContentHash) -> Self {
        self.content_hash = Some(hash);
        self
    }

    /// Builds the final MIME document.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BuilderError`] if the sender, recipient,
    /// subject, or content hash is missing.
    pub fn build(self) -> Result<ComposedMessage> {
        let from = self
            .from
            .ok_or_else(|| ClientError::BuilderError("missing sender".to_string()))?;
        let to = self
            .to
            .ok_or_else(|| ClientError::BuilderError("missing recipient".to_string()))?;
        let subject = self
            .subject
            .ok_or_else(|| ClientError::BuilderError("missing subject".to_string()))?;
        let hash = self
            .content_hash
            .ok_or_else(|| ClientError::BuilderError("missing content hash".to_string()))?;

        let body = self.body.unwrap_or_default().replace("\r\n", "\n");
        let message_id = generate_message_id(&from.domain);
        let boundary = generate_boundary();

        let mut message = Vec::with_capacity(2048);

        if let Some(name) = &self.display_name {
            write!(&mut message, "From: {name} <{from}>\r\n")?;
        } else {
            write!(&mut message, "From: {from}\r\n")?;
        }
        write!(&mut message, "To: {to}\r\n")?;
        write!(&mut message, "Subject: {subject}\r\n")?;
        write!(&mut message, "Date: {}\r\n", chrono::Local::now().to_rfc2822())?;
        write!(&mut message, "Message-ID: {message_id}\r\n")?;
        write!(&mut message, "MIME-Version: 1.0\r\n")?;
        write!(
            &mut message,
            "Content-Type: multipart/alternative; boundary=\"{boundary}\"\r\n"
        )?;

        write!(&mut message, "\r\n")?;

        // Plain text part, no transfer encoding: the hash block must reach
        // the verifier byte-for-byte
        write!(&mut message, "--{boundary}\r\n")?;
        write!(&mut message, "Content-Type: text/plain; charset=utf-8\r\n")?;
        write!(&mut message, "\r\n")?;
        write!(&mut message, "{}", plain_body(&body, &hash).replace('\n', "\r\n"))?;
        write!(&mut message, "\r\n")?;

        // HTML alternative
        write!(&mut message, "--{boundary}\r\n")?;
        write!(&mut message, "Content-Type: text/html; charset=utf-8\r\n")?;
        write!(&mut message, "\r\n")?;
        write!(&mut message, "{}", html_body(&body, &hash).replace('\n', "\r\n"))?;
        write!(&mut message, "\r\n")?;

        write!(&mut message, "--{boundary}--\r\n")?;

        let content = String::from_utf8(message).map_err(|e| ClientError::Utf8Error(e.utf8_error()))?;

        Ok(ComposedMessage {
            message_id,
            content,
        })
    }
}

/// The plain-text body with the delimited hash block and attribution footer.
fn plain_body(body: &str, hash: &ContentHash) -> String {
    format!(
        "{body}\n\
         \n\
         ---\n\
         Farewell-Hash: {hash}\n\
         ---\n\
         \n\
         This message was sent via Farewell Protocol (https://www.iampedro.com/farewell)\n\
         A zk-email proof may be generated to verify delivery of this message.\n"
    )
}

/// The HTML alternative, mirroring the plain part.
fn html_body(body: &str, hash: &ContentHash) -> String {
    let html_message = body.replace('\n', "<br>");
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Arial, sans-serif; padding: 20px;">
    <div style="max-width: 600px; margin: 0 auto;">
        {html_message}

        <hr style="margin: 30px 0; border: none; border-top: 1px solid #ddd;">

        <div style="background: #f5f5f5; padding: 15px; border-radius: 8px; font-family: monospace;">
            <strong>Farewell-Hash:</strong><br>
            <code style="word-break: break-all;">{hash}</code>
        </div>

        <p style="color: #666; font-size: 12px; margin-top: 20px;">
            This message was sent via <a href="https://www.iampedro.com/farewell">Farewell Protocol</a>.<br>
            A zk-email proof may be generated to verify delivery of this message.
        </p>
    </div>
</body>
</html>
"#
    )
}

/// Generates a Message-ID under the sender's domain.
fn generate_message_id(domain: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let entropy: u64 = rand::random();

    format!("<{timestamp}.{entropy:016x}@{domain}>")
}

/// Generates a unique MIME boundary string.
fn generate_boundary() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let entropy: u32 = rand::random();

    format!("----=_Part_{timestamp}_{entropy:08x}")
}
