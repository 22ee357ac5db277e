// model.rs — Workspace, Chart, WorkspaceFile and Revision records.
//
// A workspace owns charts and loose files under one revision counter. Each
// file carries its confirmed `content` and, while a patch is outstanding,
// `pending_content` stamped with the revision that proposed it.
//
// File lifecycle:
//   clean --(patch materialized)--> pending --(accept)--> clean
//                                   pending --(reject)--> clean
// `accepted` and `rejected` label the most recent resolution and are only
// reported to the resolving caller; the stored record collapses to clean.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A workspace: the top-level container of charts and loose files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub workspace_id: Uuid,

    /// Human-readable name (e.g., "payments-platform").
    pub name: String,

    /// The workspace-wide revision counter. Only moves forward.
    pub current_revision: u64,

    /// Who created the workspace.
    pub created_by: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named grouping of files within a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    pub chart_id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Review status of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// No outstanding patch.
    Clean,
    /// A proposed patch awaits accept/reject.
    Pending,
    /// The most recent resolution accepted the patch.
    Accepted,
    /// The most recent resolution rejected the patch.
    Rejected,
}

impl FileStatus {
    pub fn is_pending(self) -> bool {
        self == FileStatus::Pending
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Clean => write!(f, "clean"),
            FileStatus::Pending => write!(f, "pending"),
            FileStatus::Accepted => write!(f, "accepted"),
            FileStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A chart-owned or loose file with confirmed and pending content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceFile {
    pub file_id: Uuid,
    pub workspace_id: Uuid,

    /// Owning chart; None for a loose workspace file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_id: Option<Uuid>,

    /// Path relative to the chart (or workspace) root, e.g. "templates/service.yaml".
    pub file_path: String,

    /// Confirmed content.
    pub content: String,

    /// Proposed replacement content. Present only while `status` is pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_content: Option<String>,

    /// Revision this file was last stamped with: the revision that proposed
    /// the outstanding patch, or the one at which `content` was confirmed.
    pub revision_number: u64,

    pub status: FileStatus,

    pub updated_at: DateTime<Utc>,
}

impl WorkspaceFile {
    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    /// True if the file has an outstanding patch proposed by `revision`.
    pub fn is_pending_at(&self, revision: u64) -> bool {
        self.is_pending() && self.revision_number == revision
    }

    pub fn is_loose(&self) -> bool {
        self.chart_id.is_none()
    }
}

/// How a revision came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevisionKind {
    /// Revision 0, recorded when the workspace is created.
    Initial,
    /// Produced by materializing a plan.
    Plan,
    /// Produced by rolling the workspace back to `target`.
    Rollback { target: u64 },
}

impl fmt::Display for RevisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionKind::Initial => write!(f, "initial"),
            RevisionKind::Plan => write!(f, "plan"),
            RevisionKind::Rollback { target } => write!(f, "rollback to {}", target),
        }
    }
}

/// An immutable, numbered point in a workspace's content timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub revision_id: Uuid,
    pub workspace_id: Uuid,

    /// Unique per workspace, strictly increasing.
    pub revision_number: u64,

    /// The plan that produced this revision (None for initial and rollback revisions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<Uuid>,

    #[serde(flatten)]
    pub kind: RevisionKind,

    /// Actor who created the revision.
    pub created_by: String,

    pub created_at: DateTime<Utc>,
}
