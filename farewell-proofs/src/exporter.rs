//! Writes the per-recipient `.eml` / proof-JSON pairs for one claimer run.

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs;
use tracing::debug;

use farewell_common::address::Address;

use crate::{
    error::{ExportError, Result},
    record::ProofRecord,
};

/// How many suffixed directory names to try before giving up.
const MAX_DIRECTORY_ATTEMPTS: usize = 100;

/// The files written for one successfully sent recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPair {
    /// Path of the raw transmitted email.
    pub eml_path: PathBuf,
    /// Path of the proof-record JSON.
    pub proof_path: PathBuf,
}

/// Exporter scoped to a single run.
///
/// Creates one timestamped directory per run and writes an `.eml` plus a
/// proof JSON per successful recipient. Writes go to a temporary file and
/// are renamed into place, so a crash never leaves a half-written pair.
/// Files are never overwritten within a run.
#[derive(Debug, Clone)]
pub struct ProofExporter {
    dir: PathBuf,
}

impl ProofExporter {
    /// Creates the run directory `farewell_proofs_<timestamp>` under `base`.
    ///
    /// Re-running within the same second gets a `_2`, `_3`, … suffix so a
    /// prior run's files are never touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or no unique
    /// name is available.
    pub fn create(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        std::fs::create_dir_all(base)?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let name = format!("farewell_proofs_{stamp}");

        for attempt in 1..=MAX_DIRECTORY_ATTEMPTS {
            let candidate = if attempt == 1 {
                base.join(&name)
            } else {
                base.join(format!("{name}_{attempt}"))
            };

            match std::fs::create_dir(&candidate) {
                Ok(()) => {
                    debug!(dir = %candidate.display(), "Created run directory");
                    return Ok(Self { dir: candidate });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
        }

        Err(ExportError::NoUniqueDirectory(base.display().to_string()))
    }

    /// The run directory all pairs are written into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the `.eml` and proof JSON for one recipient.
    ///
    /// `index` is the recipient's 1-based position in the batch; it appears
    /// in both filenames and must not repeat within a run.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::AlreadyExists`] if a pair with this index and
    /// recipient was already written, or an I/O or serialization error.
    pub async fn export(
        &self,
        index: usize,
        recipient: &Address,
        raw_message: &[u8],
        record: &ProofRecord,
    ) -> Result<ExportedPair> {
        let sanitized = sanitize_address(&recipient.to_string());
        let eml_filename = format!("recipient_{index}_{sanitized}.eml");
        let proof_filename = format!("proof_{index}_{sanitized}.json");

        let eml_path = self.dir.join(&eml_filename);
        let proof_path = self.dir.join(&proof_filename);

        if fs::try_exists(&eml_path).await.unwrap_or(false)
            || fs::try_exists(&proof_path).await.unwrap_or(false)
        {
            return Err(ExportError::AlreadyExists(index));
        }

        // Write to temporary files first, then atomically rename
        let temp_eml_path = self.dir.join(format!(".tmp_{eml_filename}"));
        let temp_proof_path = self.dir.join(format!(".tmp_{proof_filename}"));

        fs::write(&temp_eml_path, raw_message).await?;
        fs::write(&temp_proof_path, record.to_json()?).await?;

        fs::rename(&temp_eml_path, &eml_path).await?;
        fs::rename(&temp_proof_path, &proof_path).await?;

        debug!(
            recipient = %recipient,
            eml = %eml_path.display(),
            "Exported proof pair"
        );

        Ok(ExportedPair {
            eml_path,
            proof_path,
        })
    }
}

/// Maps an address to a filesystem-safe name: `@` becomes `_at_`, every
/// other non-alphanumeric character becomes `_` (`a@x.com` -> `a_at_x_com`).
#[must_use]
pub fn sanitize_address(address: &str) -> String {
    let mut sanitized = String::with_capacity(address.len() + 3);
    for c in address.chars() {
        if c == '@' {
            sanitized.push_str("_at_");
        } else if c.is_ascii_alphanumeric() {
            sanitized.push(c);
        } else {
            sanitized.push('_');
        }
    }
    sanitized
}
