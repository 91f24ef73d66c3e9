//! Mock SMTP submission server for client and delivery tests.
//!
//! A line-based server with scripted responses that records every command
//! and every message body it receives. Supports EHLO capability
//! advertisement, AUTH PLAIN / AUTH LOGIN exchanges, per-recipient RCPT
//! responses, and DATA with dot-unstuffing.

#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};

/// A scripted SMTP response.
#[derive(Debug, Clone)]
pub struct SmtpResponse {
    pub code: u16,
    pub message: String,
}

impl SmtpResponse {
    fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn to_line(&self) -> String {
        format!("{} {}\r\n", self.code, self.message)
    }
}

#[derive(Clone)]
struct MockServerConfig {
    greeting: SmtpResponse,
    capabilities: Vec<String>,
    auth_response: SmtpResponse,
    mail_from_response: SmtpResponse,
    rcpt_responses: Arc<Mutex<VecDeque<SmtpResponse>>>,
    data_end_response: SmtpResponse,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            greeting: SmtpResponse::new(220, "mock.example.com ESMTP ready"),
            capabilities: vec!["AUTH PLAIN LOGIN".to_string()],
            auth_response: SmtpResponse::new(235, "Authentication succeeded"),
            mail_from_response: SmtpResponse::new(250, "OK"),
            rcpt_responses: Arc::new(Mutex::new(VecDeque::new())),
            data_end_response: SmtpResponse::new(250, "OK: queued"),
        }
    }
}

/// Builder for [`MockSmtpServer`].
#[derive(Default)]
pub struct MockSmtpServerBuilder {
    config: MockServerConfig,
}

impl MockSmtpServerBuilder {
    #[must_use]
    pub fn with_greeting(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.greeting = SmtpResponse::new(code, message);
        self
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.config.capabilities = capabilities;
        self
    }

    #[must_use]
    pub fn with_auth_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.auth_response = SmtpResponse::new(code, message);
        self
    }

    #[must_use]
    pub fn with_mail_from_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.mail_from_response = SmtpResponse::new(code, message);
        self
    }

    /// Queue a response for the next RCPT TO command. Once the queue is
    /// drained, further RCPT TO commands get `250 OK`.
    #[must_use]
    pub fn with_rcpt_response(self, code: u16, message: impl Into<String>) -> Self {
        self.config
            .rcpt_responses
            .lock()
            .unwrap()
            .push_back(SmtpResponse::new(code, message));
        self
    }

    #[must_use]
    pub fn with_data_end_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.data_end_response = SmtpResponse::new(code, message);
        self
    }

    pub async fn build(self) -> std::io::Result<MockSmtpServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let commands = Arc::new(Mutex::new(Vec::new()));
        let messages = Arc::new(Mutex::new(Vec::new()));

        let config = self.config;
        let commands_task = Arc::clone(&commands);
        let messages_task = Arc::clone(&messages);

        tokio::spawn(async move {
            while let Ok((stream, _peer)) = listener.accept().await {
                let config = config.clone();
                let commands = Arc::clone(&commands_task);
                let messages = Arc::clone(&messages_task);
                tokio::spawn(async move {
                    let _ = handle_session(stream, config, commands, messages).await;
                });
            }
        });

        Ok(MockSmtpServer {
            addr,
            commands,
            messages,
        })
    }
}

/// A running mock SMTP server.
pub struct MockSmtpServer {
    addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
    messages: Arc<Mutex<Vec<String>>>,
}

impl MockSmtpServer {
    #[must_use]
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder::default()
    }

    /// The `host:port` string clients should connect to.
    #[must_use]
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// The bound port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every command line received, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Every DATA payload received, dot-unstuffed, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

async fn handle_session(
    stream: TcpStream,
    config: MockServerConfig,
    commands: Arc<Mutex<Vec<String>>>,
    messages: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    write_half
        .write_all(config.greeting.to_line().as_bytes())
        .await?;

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let command = line.trim_end_matches(['\r', '\n']).to_string();
        commands.lock().unwrap().push(command.clone());

        let verb = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase();

        match verb.as_str() {
            "EHLO" | "HELO" => {
                let mut reply = String::from("250-mock.example.com\r\n");
                for (i, capability) in config.capabilities.iter().enumerate() {
                    if i + 1 == config.capabilities.len() {
                        reply.push_str(&format!("250 {capability}\r\n"));
                    } else {
                        reply.push_str(&format!("250-{capability}\r\n"));
                    }
                }
                if config.capabilities.is_empty() {
                    reply = String::from("250 mock.example.com\r\n");
                }
                write_half.write_all(reply.as_bytes()).await?;
            }
            "AUTH" => {
                if command.to_uppercase().starts_with("AUTH LOGIN") {
                    // Username: / Password: prompts, base64-encoded
                    write_half.write_all(b"334 VXNlcm5hbWU6\r\n").await?;
                    line.clear();
                    reader.read_line(&mut line).await?;
                    commands
                        .lock()
                        .unwrap()
                        .push(line.trim_end_matches(['\r', '\n']).to_string());
                    write_half.write_all(b"334 UGFzc3dvcmQ6\r\n").await?;
                    line.clear();
                    reader.read_line(&mut line).await?;
                    commands
                        .lock()
                        .unwrap()
                        .push(line.trim_end_matches(['\r', '\n']).to_string());
                }
                write_half
                    .write_all(config.auth_response.to_line().as_bytes())
                    .await?;
            }
            "MAIL" => {
                write_half
                    .write_all(config.mail_from_response.to_line().as_bytes())
                    .await?;
            }
            "RCPT" => {
                let response = config
                    .rcpt_responses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| SmtpResponse::new(250, "OK"));
                write_half.write_all(response.to_line().as_bytes()).await?;
            }
            "DATA" => {
                write_half
                    .write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n")
                    .await?;

                let mut body = String::new();
                loop {
                    line.clear();
                    if reader.read_line(&mut line).await? == 0 {
                        return Ok(());
                    }
                    let data_line = line.trim_end_matches(['\r', '\n']);
                    if data_line == "." {
                        break;
                    }
                    // Undo RFC 5321 Section 4.5.2 transparency
                    let unstuffed = data_line.strip_prefix('.').unwrap_or(data_line);
                    body.push_str(unstuffed);
                    body.push_str("\r\n");
                }
                messages.lock().unwrap().push(body);

                write_half
                    .write_all(config.data_end_response.to_line().as_bytes())
                    .await?;
            }
            "RSET" => {
                write_half.write_all(b"250 OK\r\n").await?;
            }
            "QUIT" => {
                write_half.write_all(b"221 Bye\r\n").await?;
                return Ok(());
            }
            _ => {
                write_half
                    .write_all(b"502 Command not implemented\r\n")
                    .await?;
            }
        }
    }
}
