//! RFC 5321 mailbox parsing for recipient and sender addresses.
//!
//! The claimer only ever deals with bare `local-part@domain` mailboxes typed
//! by a user or exported from the Farewell UI, so this parser covers the
//! Dot-string form of RFC 5321 Section 4.1.2 and rejects everything else.
//!
//! # Size Constraints
//!
//! - Maximum local-part: 64 octets
//! - Maximum domain: 255 octets

use std::{
    fmt::{self, Display},
    ops::Deref,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during address parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Empty input.
    #[error("Empty address")]
    Empty,

    /// Missing '@' separator in mailbox.
    #[error("Missing '@' separator in mailbox")]
    MissingAtSign,

    /// Local-part exceeds 64 octets.
    #[error("Local-part exceeds 64 octets")]
    LocalPartTooLong,

    /// Domain exceeds 255 octets.
    #[error("Domain exceeds 255 octets")]
    DomainTooLong,

    /// Invalid character or dot placement in local-part.
    #[error("Invalid local-part: {0}")]
    InvalidLocalPart(String),

    /// Invalid domain label.
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),
}

/// A parsed SMTP mailbox (`local-part@domain`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    /// The local part (before @).
    pub local_part: String,
    /// The domain (after @).
    pub domain: String,
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local_part, self.domain)
    }
}

/// `atext` per RFC 5321 Section 4.1.2.
const fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
        )
}

fn validate_local_part(local: &str) -> Result<(), AddressError> {
    if local.is_empty() {
        return Err(AddressError::InvalidLocalPart("empty".into()));
    }
    if local.len() > 64 {
        return Err(AddressError::LocalPartTooLong);
    }

    // Dot-string: atoms separated by single dots, no leading/trailing dot
    for atom in local.split('.') {
        if atom.is_empty() {
            return Err(AddressError::InvalidLocalPart(local.into()));
        }
        if !atom.chars().all(is_atext) {
            return Err(AddressError::InvalidLocalPart(local.into()));
        }
    }

    Ok(())
}

fn validate_domain(domain: &str) -> Result<(), AddressError> {
    if domain.is_empty() {
        return Err(AddressError::InvalidDomain("empty".into()));
    }
    if domain.len() > 255 {
        return Err(AddressError::DomainTooLong);
    }

    // sub-domain = Let-dig [Ldh-str]
    for label in domain.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(AddressError::InvalidDomain(domain.into()));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(AddressError::InvalidDomain(domain.into()));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(AddressError::InvalidDomain(domain.into()));
        }
    }

    Ok(())
}

impl Mailbox {
    /// Parse a bare `local-part@domain` mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] if the input is not a valid RFC 5321
    /// Dot-string mailbox.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let (local, domain) = trimmed
            .rsplit_once('@')
            .ok_or(AddressError::MissingAtSign)?;

        validate_local_part(local)?;
        validate_domain(domain)?;

        Ok(Self {
            local_part: local.to_string(),
            domain: domain.to_string(),
        })
    }
}

impl FromStr for Mailbox {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address(pub Mailbox);

impl Address {
    /// Parse and validate an address.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] if the input is not a valid mailbox.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        Mailbox::parse(input).map(Self)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.0.local_part, self.0.domain)
    }
}

impl From<Mailbox> for Address {
    fn from(value: Mailbox) -> Self {
        Self(value)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Deref for Address {
    type Target = Mailbox;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// An ordered list of addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressList(pub Vec<Address>);

impl Display for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, addr) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            Display::fmt(addr, f)?;
        }
        Ok(())
    }
}

impl From<Vec<Address>> for AddressList {
    fn from(value: Vec<Address>) -> Self {
        Self(value)
    }
}

impl Deref for AddressList {
    type Target = Vec<Address>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
