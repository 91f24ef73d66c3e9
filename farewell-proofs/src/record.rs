//! Proof-record structure consumed by the external zk-email pipeline.
//!
//! A proof record is JSON metadata describing a sent email, not a
//! cryptographic proof. The nested `proof` object is the placeholder
//! Groth16 structure the claim contract expects; the actual circuit proof
//! is computed by an external prover from the exported `.eml` file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use farewell_common::{address::Address, hash::ContentHash};

/// DKIM public-key hash placeholder until the external prover fills it in.
const DKIM_PUBKEY_PLACEHOLDER: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

/// Placeholder Groth16 proof structure, in the contract's calldata shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Placeholder {
    #[serde(rename = "pA")]
    pub p_a: [String; 2],
    #[serde(rename = "pB")]
    pub p_b: [[String; 2]; 2],
    #[serde(rename = "pC")]
    pub p_c: [String; 2],
    /// `[recipientHash, dkimPubkeyHash, contentHash]`
    #[serde(rename = "publicSignals")]
    pub public_signals: [String; 3],
}

/// Metadata for one successfully sent farewell email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRecord {
    /// The recipient the email was delivered to.
    pub recipient: String,
    /// SHA3-256 of the lowercased recipient address, `0x`-prefixed.
    pub recipient_hash: String,
    /// The content hash embedded in the email body.
    pub content_hash: ContentHash,
    /// The authenticated sender address.
    pub sender: String,
    /// When the send completed (ISO-8601).
    pub sent_at: DateTime<Utc>,
    /// The Message-ID header of the sent email.
    pub message_id: String,
    /// The domain whose DKIM signature the external verifier will check.
    pub dkim_domain: String,
    /// Placeholder structure for the external prover.
    pub proof: Groth16Placeholder,
}

/// Hashes a recipient address the way the claim contract expects it:
/// lowercased, trimmed, SHA3-256, `0x`-prefixed hex.
#[must_use]
pub fn recipient_hash(recipient: &str) -> String {
    let normalized = recipient.trim().to_lowercase();
    let digest = Sha3_256::digest(normalized.as_bytes());
    format!("0x{}", hex::encode(digest))
}

impl ProofRecord {
    /// Builds the record for one sent email.
    #[must_use]
    pub fn new(
        recipient: &Address,
        content_hash: ContentHash,
        sender: &Address,
        message_id: String,
        sent_at: DateTime<Utc>,
    ) -> Self {
        let recipient_hash = recipient_hash(&recipient.to_string());

        let proof = Groth16Placeholder {
            p_a: ["0x0".to_string(), "0x0".to_string()],
            p_b: [
                ["0x0".to_string(), "0x0".to_string()],
                ["0x0".to_string(), "0x0".to_string()],
            ],
            p_c: ["0x0".to_string(), "0x0".to_string()],
            public_signals: [
                recipient_hash.clone(),
                DKIM_PUBKEY_PLACEHOLDER.to_string(),
                content_hash.as_str().to_string(),
            ],
        };

        Self {
            recipient: recipient.to_string(),
            recipient_hash,
            content_hash,
            sender: sender.to_string(),
            sent_at,
            message_id,
            dkim_domain: sender.domain.clone(),
            proof,
        }
    }

    /// Serialize to the pretty-printed JSON written next to the `.eml`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
