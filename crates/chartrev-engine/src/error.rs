// error.rs — Error taxonomy surfaced by the engine.
//
// NotFound, Conflict, InvalidPlan, InvalidRevision and Unauthorized are the
// kinds callers branch on. Store, plan and queue failures that do not map to
// one of them are wrapped unchanged.

use std::fmt;
use std::path::PathBuf;

use chartrev_plan::PlanError;
use chartrev_queue::QueueError;
use chartrev_store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// The kind of entity a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Workspace,
    Chart,
    File,
    Plan,
    Revision,
    /// A pending patch: the file exists but has nothing left to resolve.
    PendingPatch,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Workspace => write!(f, "workspace"),
            EntityKind::Chart => write!(f, "chart"),
            EntityKind::File => write!(f, "file"),
            EntityKind::Plan => write!(f, "plan"),
            EntityKind::Revision => write!(f, "revision"),
            EntityKind::PendingPatch => write!(f, "pending patch"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Unknown entity, or a patch that has already been resolved.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// The caller's expected revision does not match the file's pending revision.
    #[error("conflict on file {file_id}: expected revision {expected}, file is pending at {actual}")]
    Conflict {
        file_id: Uuid,
        expected: u64,
        actual: u64,
    },

    /// A plan cannot be materialized in its current state.
    #[error("invalid plan {plan_id}: {reason}")]
    InvalidPlan { plan_id: Uuid, reason: String },

    /// A revision argument is out of range for the workspace.
    #[error("invalid revision {requested} for workspace {workspace_id}: {reason}")]
    InvalidRevision {
        workspace_id: Uuid,
        requested: u64,
        reason: String,
    },

    /// Raised by the caller's auth layer and passed through unchanged.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("plan error: {0}")]
    Plan(PlanError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("config error at {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl EngineError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        EngineError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// True for `NotFound` of the given kind.
    pub fn is_not_found(&self, kind: EntityKind) -> bool {
        matches!(self, EngineError::NotFound { kind: k, .. } if *k == kind)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Conflict { .. })
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::WorkspaceNotFound(id) => EngineError::not_found(EntityKind::Workspace, id),
            StoreError::ChartNotFound { chart_id, .. } => {
                EngineError::not_found(EntityKind::Chart, chart_id)
            }
            StoreError::FileNotFound(id) => EngineError::not_found(EntityKind::File, id),
            StoreError::NotPending(id) => EngineError::not_found(EntityKind::PendingPatch, id),
            other => EngineError::Store(other),
        }
    }
}

impl From<PlanError> for EngineError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::NotFound(id) => EngineError::not_found(EntityKind::Plan, id),
            other => EngineError::Plan(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_entity_kind() {
        let id = Uuid::new_v4();
        assert!(EngineError::from(StoreError::FileNotFound(id)).is_not_found(EntityKind::File));
        assert!(EngineError::from(StoreError::NotPending(id))
            .is_not_found(EntityKind::PendingPatch));
        assert!(EngineError::from(StoreError::WorkspaceNotFound(id))
            .is_not_found(EntityKind::Workspace));
        assert!(matches!(
            EngineError::from(StoreError::LockPoisoned(id)),
            EngineError::Store(_)
        ));
    }

    #[test]
    fn plan_not_found_maps_to_plan_kind() {
        let err = EngineError::from(PlanError::NotFound(Uuid::new_v4()));
        assert!(err.is_not_found(EntityKind::Plan));
        assert!(err.to_string().starts_with("plan not found"));
    }
}
