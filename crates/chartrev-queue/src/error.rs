// error.rs — Error types for work queues.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    /// Writing to the outbox failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The queue's internal lock was poisoned.
    #[error("queue lock poisoned")]
    LockPoisoned,

    /// The transport refused the job.
    #[error("queue rejected job of kind '{kind}': {reason}")]
    Rejected { kind: String, reason: String },
}
