// error.rs — Error types for the content history subsystem.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while recording or reading content history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Failed to open or create a history log file.
    #[error("failed to open history log at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write an entry to the log.
    #[error("failed to append history entry: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// Failed to serialize or deserialize an entry (malformed JSON).
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The log has been tampered with; the hash chain is broken.
    #[error("integrity check failed at line {line}: expected hash {expected}, got {actual}")]
    IntegrityViolation {
        line: usize,
        expected: String,
        actual: String,
    },

    /// An entry was handed to a log whose head it does not link to.
    #[error("entry {entry_id} does not extend the log head (expected previous hash {expected})")]
    OutOfOrder { entry_id: String, expected: String },
}
