// job.rs — Job descriptors handed to the external work queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default job kind for per-file reindexing (summary and embedding recompute).
pub const REINDEX_JOB_KIND: &str = "file.reindex";

/// Payload of one reindex job: recompute derived data for `file_id` as of
/// `revision`. Handlers must be idempotent; the transport may redeliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexJob {
    pub workspace_id: Uuid,
    pub file_id: Uuid,
    pub file_path: String,
    pub revision: u64,
}

/// A job as recorded by a queue implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub job_id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedJob {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            kind: kind.into(),
            payload,
            enqueued_at: Utc::now(),
        }
    }

    /// Decode the payload as a reindex job.
    pub fn reindex(&self) -> Result<ReindexJob, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
