//! Error types for the farewell-proofs crate.

use std::io;

use thiserror::Error;

/// Errors that can occur while exporting proof material.
#[derive(Debug, Error)]
pub enum ExportError {
    /// I/O operation failed (directory creation, file write, rename).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Proof record serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A file for this recipient index already exists in the run directory.
    #[error("Export for recipient index {0} already exists")]
    AlreadyExists(usize),

    /// Could not create a unique run directory.
    #[error("Could not create a unique output directory under {0}")]
    NoUniqueDirectory(String),
}

/// Specialized `Result` type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
