// error.rs — Error types for plan tracking.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during plan operations.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize plan data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The requested plan was not found.
    #[error("plan not found: {0}")]
    NotFound(Uuid),

    /// Invalid status transition.
    #[error("invalid transition from {from} to {to} for plan {plan_id}")]
    InvalidTransition {
        plan_id: Uuid,
        from: String,
        to: String,
    },

    /// A plan was referenced from a different workspace than its own.
    #[error("plan {plan_id} belongs to workspace {actual}, not {expected}")]
    WorkspaceMismatch {
        plan_id: Uuid,
        expected: Uuid,
        actual: Uuid,
    },

    /// The tracker's write lock was poisoned by a panicking writer.
    #[error("plan tracker lock poisoned")]
    LockPoisoned,
}
