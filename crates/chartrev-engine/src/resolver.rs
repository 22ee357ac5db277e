// resolver.rs — PatchResolver: accept/reject for one file or a whole revision.
//
// Single-file resolution checks, in order, under the workspace lock:
//   1. the file exists                       → else NotFound(file)
//   2. the file has a pending patch          → else NotFound(pending patch)
//   3. the patch was proposed at `expected`  → else Conflict
// so of two concurrent calls on the same pending file exactly one succeeds
// and the other sees NotFound.
//
// Batch resolution runs as one transaction over the files pending at the
// revision: either every file is resolved or none is. Files no longer
// pending are simply not part of the batch.

use std::sync::Arc;

use chartrev_store::{FileStatus, FileStore, StoreError, WorkspaceFile, WorkspaceState};
use uuid::Uuid;

use crate::actor::Actor;
use crate::error::{EngineError, EntityKind};
use crate::gate::CompletionGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Accept,
    Reject,
}

impl Resolution {
    /// The label reported back to the resolving caller.
    pub fn label(self) -> FileStatus {
        match self {
            Resolution::Accept => FileStatus::Accepted,
            Resolution::Reject => FileStatus::Rejected,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Resolution::Accept => "accepted",
            Resolution::Reject => "rejected",
        }
    }
}

pub struct PatchResolver {
    store: Arc<FileStore>,
    gate: Arc<CompletionGate>,
}

impl PatchResolver {
    pub fn new(store: Arc<FileStore>, gate: Arc<CompletionGate>) -> Self {
        Self { store, gate }
    }

    /// Promote a file's pending content to confirmed content.
    pub fn accept_patch(
        &self,
        file_id: Uuid,
        expected_revision: u64,
        actor: &Actor,
    ) -> Result<WorkspaceFile, EngineError> {
        self.resolve_one(file_id, expected_revision, Resolution::Accept, actor)
    }

    /// Discard a file's pending content.
    pub fn reject_patch(
        &self,
        file_id: Uuid,
        expected_revision: u64,
        actor: &Actor,
    ) -> Result<WorkspaceFile, EngineError> {
        self.resolve_one(file_id, expected_revision, Resolution::Reject, actor)
    }

    /// Accept every patch outstanding at `revision`, chart-owned and loose.
    pub fn accept_all_patches(
        &self,
        workspace_id: Uuid,
        revision: u64,
        actor: &Actor,
    ) -> Result<Vec<WorkspaceFile>, EngineError> {
        self.resolve_all(workspace_id, revision, Resolution::Accept, actor)
    }

    /// Reject every patch outstanding at `revision`, chart-owned and loose.
    pub fn reject_all_patches(
        &self,
        workspace_id: Uuid,
        revision: u64,
        actor: &Actor,
    ) -> Result<Vec<WorkspaceFile>, EngineError> {
        self.resolve_all(workspace_id, revision, Resolution::Reject, actor)
    }

    fn resolve_one(
        &self,
        file_id: Uuid,
        expected: u64,
        resolution: Resolution,
        actor: &Actor,
    ) -> Result<WorkspaceFile, EngineError> {
        let workspace_id = self.store.workspace_of(file_id)?;

        let file = self.store.transact(workspace_id, |state| -> Result<_, EngineError> {
            let file = state
                .file(file_id)
                .ok_or_else(|| EngineError::not_found(EntityKind::File, file_id))?;
            if !file.is_pending() {
                return Err(EngineError::not_found(EntityKind::PendingPatch, file_id));
            }
            if file.revision_number != expected {
                return Err(EngineError::Conflict {
                    file_id,
                    expected,
                    actual: file.revision_number,
                });
            }
            Ok(apply(state, file_id, resolution)?)
        })?;

        tracing::info!(
            workspace_id = %workspace_id,
            file_id = %file_id,
            revision = expected,
            actor = %actor,
            "patch {}",
            resolution.verb()
        );
        self.notify_gate(workspace_id);
        Ok(file)
    }

    fn resolve_all(
        &self,
        workspace_id: Uuid,
        revision: u64,
        resolution: Resolution,
        actor: &Actor,
    ) -> Result<Vec<WorkspaceFile>, EngineError> {
        let files = self.store.transact(workspace_id, |state| {
            state
                .files_pending_at(revision)
                .into_iter()
                .map(|file_id| apply(state, file_id, resolution))
                .collect::<Result<Vec<_>, StoreError>>()
        })?;

        if files.is_empty() {
            tracing::debug!(workspace_id = %workspace_id, revision, "no pending patches to resolve");
            return Ok(files);
        }

        tracing::info!(
            workspace_id = %workspace_id,
            revision,
            count = files.len(),
            actor = %actor,
            "all patches {}",
            resolution.verb()
        );
        self.notify_gate(workspace_id);
        Ok(files)
    }

    fn notify_gate(&self, workspace_id: Uuid) {
        if let Err(e) = self.gate.observe(workspace_id) {
            tracing::warn!(workspace_id = %workspace_id, error = %e, "completion gate failed");
        }
    }
}

/// Resolve one pending file and label the returned copy.
fn apply(
    state: &mut WorkspaceState,
    file_id: Uuid,
    resolution: Resolution,
) -> Result<WorkspaceFile, StoreError> {
    let mut file = match resolution {
        Resolution::Accept => state.confirm_pending(file_id)?,
        Resolution::Reject => state.discard_pending(file_id)?,
    };
    file.status = resolution.label();
    Ok(file)
}
