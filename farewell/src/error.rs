//! Input and configuration errors raised before any send attempt.

use std::path::PathBuf;

use thiserror::Error;

use farewell_common::{address::AddressError, hash::HashError};

/// Errors in the message data supplied by file or prompt.
#[derive(Debug, Error)]
pub enum InputError {
    /// The input file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The input file is not valid JSON.
    #[error("Invalid JSON file: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is missing from the input.
    #[error("Missing '{0}' field in JSON")]
    MissingField(&'static str),

    /// The recipient list is empty.
    #[error("No recipients specified")]
    NoRecipients,

    /// A recipient address failed validation.
    #[error("Invalid recipient address '{address}': {source}")]
    InvalidRecipient {
        address: String,
        source: AddressError,
    },

    /// The content hash is empty or not hexadecimal.
    #[error("Invalid content hash: {0}")]
    InvalidHash(#[from] HashError),

    /// I/O error reading the input file.
    #[error("Could not read input file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors resolving the provider selection into a connection descriptor.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required configuration field is missing.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A configuration value is invalid.
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// The OAuth client-secret file is required but absent.
    #[error(
        "'{}' not found. Create OAuth 2.0 credentials (Desktop app) at \
         https://console.cloud.google.com/ and save the download next to this tool",
        .0.display()
    )]
    OauthCredentialsMissing(PathBuf),
}
