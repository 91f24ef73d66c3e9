//! The content hash committed on-chain and embedded in every farewell email.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing a content hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    /// Empty input (or a bare `0x` prefix).
    #[error("Empty content hash")]
    Empty,

    /// A non-hexadecimal character was found.
    #[error("Invalid hex character {0:?} in content hash")]
    InvalidHex(char),
}

/// A hex-encoded commitment to the farewell payload.
///
/// The hash is embedded verbatim in the email body as the `Farewell-Hash`
/// marker line and checked against an on-chain value by an external
/// verifier, so it is normalised exactly once at parse time: the `0x`
/// prefix is made mandatory and the digits are lowercased. The stored
/// string is what goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Parse a hex string, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the input is empty or contains a
    /// non-hexadecimal character.
    pub fn parse(input: &str) -> Result<Self, HashError> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(HashError::Empty);
        }

        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(HashError::InvalidHex(bad));
        }

        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// The normalised `0x`-prefixed hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
