// error.rs — Error types for the file store.

use std::path::PathBuf;

use chartrev_history::HistoryError;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested workspace does not exist.
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(Uuid),

    /// The requested chart does not exist in the workspace.
    #[error("chart {chart_id} not found in workspace {workspace_id}")]
    ChartNotFound { workspace_id: Uuid, chart_id: Uuid },

    /// The requested file does not exist.
    #[error("file not found: {0}")]
    FileNotFound(Uuid),

    /// A file with the same path already exists in the same chart (or loose scope).
    #[error("file '{path}' already exists in workspace {workspace_id}")]
    DuplicatePath { workspace_id: Uuid, path: String },

    /// The file has no pending content to confirm or discard.
    #[error("file {0} has no pending content")]
    NotPending(Uuid),

    /// A mutation would break a store invariant.
    #[error("invariant violated in workspace {workspace_id}: {detail}")]
    InvariantViolation { workspace_id: Uuid, detail: String },

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize a workspace snapshot.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Content history failed to append or load.
    #[error("history error: {0}")]
    History(#[from] HistoryError),

    /// A workspace lock was poisoned by a panicking writer.
    #[error("lock poisoned for workspace {0}")]
    LockPoisoned(Uuid),

    /// A persisted snapshot is unreadable or inconsistent.
    #[error("corrupt snapshot at {path}: {detail}")]
    Corrupt { path: PathBuf, detail: String },
}
