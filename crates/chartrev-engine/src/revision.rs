// revision.rs — RevisionManager: materialize plans and roll workspaces back.
//
// Materializing a plan allocates the next revision number and stamps every
// patch in the plan onto its file as pending content, all in one workspace
// transaction. That transaction runs inside the plan tracker's write lock,
// which also covers marking the plan materialized, so a concurrent
// supersession either lands first (and the plan is refused) or waits. If the
// marking itself fails, calling create_revision again finds the revision
// already in the store and just repeats it.
//
// Lock order is always plan tracker, then workspace.
//
// Rollback never rewinds the counter. It discards every outstanding patch,
// allocates a new `rollback { target }` revision, and sets each file's
// confirmed content to what the content history says it held as of the
// target. Files that did not exist then are removed; files that existed then
// but were removed later are recreated.

use std::sync::Arc;

use chartrev_plan::{PlanStatus, PlanTracker};
use chartrev_store::{FileStore, Revision, RevisionKind, Workspace};
use uuid::Uuid;

use crate::actor::Actor;
use crate::error::{EngineError, EntityKind};
use crate::gate::CompletionGate;

pub struct RevisionManager {
    store: Arc<FileStore>,
    plans: Arc<PlanTracker>,
    gate: Arc<CompletionGate>,
}

impl RevisionManager {
    pub fn new(store: Arc<FileStore>, plans: Arc<PlanTracker>, gate: Arc<CompletionGate>) -> Self {
        Self { store, plans, gate }
    }

    /// Turn a proposed plan's patches into pending content at a new revision.
    ///
    /// Every file still pending in the workspace must be patched again by
    /// the plan; a patch left behind at an older revision would never be
    /// seen by the completion gate.
    pub fn create_revision(&self, plan_id: Uuid, actor: &Actor) -> Result<Revision, EngineError> {
        let (revision, resumed, patches) = self
            .plans
            .materialize_with(plan_id, |plan| -> Result<_, EngineError> {
                let (revision, resumed) = self
                    .store
                    .transact(plan.workspace_id, |state| -> Result<(Revision, bool), EngineError> {
                        if let Some(existing) = state.revision_for_plan(plan_id) {
                            return Ok((existing.clone(), true));
                        }

                        match &plan.status {
                            PlanStatus::Proposed => {}
                            PlanStatus::Superseded { by } => {
                                return Err(EngineError::InvalidPlan {
                                    plan_id,
                                    reason: format!("superseded by plan {}", by),
                                });
                            }
                            PlanStatus::Materialized { revision_number } => {
                                return Err(EngineError::InvalidPlan {
                                    plan_id,
                                    reason: format!("already materialized at revision {}", revision_number),
                                });
                            }
                        }
                        if plan.patches.is_empty() {
                            return Err(EngineError::InvalidPlan {
                                plan_id,
                                reason: "plan has no outstanding patches".to_string(),
                            });
                        }
                        if let Some(missing) = plan.patches.iter().find(|p| state.file(p.file_id).is_none()) {
                            return Err(EngineError::not_found(EntityKind::File, missing.file_id));
                        }
                        let left_behind = state
                            .files()
                            .iter()
                            .find(|f| f.is_pending() && !plan.patches.iter().any(|p| p.file_id == f.file_id));
                        if let Some(file) = left_behind {
                            return Err(EngineError::InvalidPlan {
                                plan_id,
                                reason: format!(
                                    "{} is still pending at revision {}; resolve it or roll back first",
                                    file.file_path, file.revision_number
                                ),
                            });
                        }

                        let revision = state.allocate_revision(RevisionKind::Plan, Some(plan_id), &actor.user_id);
                        for patch in &plan.patches {
                            state.stamp_pending(patch.file_id, patch.content.clone(), revision.revision_number)?;
                        }
                        Ok((revision, false))
                    })?;
                let number = revision.revision_number;
                Ok(((revision, resumed, plan.patches.len()), number))
            })?;

        if resumed {
            tracing::info!(
                plan_id = %plan_id,
                revision = revision.revision_number,
                "plan already materialized; returning existing revision"
            );
        } else {
            tracing::info!(
                workspace_id = %revision.workspace_id,
                plan_id = %plan_id,
                revision = revision.revision_number,
                patches,
                actor = %actor,
                "revision created"
            );
        }
        Ok(revision)
    }

    /// Restore every file to its content as of `target` under a new revision.
    pub fn rollback_to_revision(
        &self,
        workspace_id: Uuid,
        target: u64,
        actor: &Actor,
    ) -> Result<Workspace, EngineError> {
        let (workspace, summary) = self
            .store
            .transact(workspace_id, |state| -> Result<_, EngineError> {
                let current = state.current_revision();
                if target > current {
                    return Err(EngineError::InvalidRevision {
                        workspace_id,
                        requested: target,
                        reason: format!("beyond current revision {}", current),
                    });
                }
                if state.revision(target).is_none() {
                    return Err(EngineError::not_found(
                        EntityKind::Revision,
                        format!("{}@{}", workspace_id, target),
                    ));
                }

                let discarded = state.discard_all_pending();
                let revision = state
                    .allocate_revision(RevisionKind::Rollback { target }, None, &actor.user_id)
                    .revision_number;

                let mut summary = RollbackSummary {
                    revision,
                    discarded,
                    ..RollbackSummary::default()
                };
                for file_id in state.history().file_ids() {
                    let entry = state.history().as_of(file_id, target).cloned();
                    match entry {
                        Some(entry) if !entry.is_removal() => {
                            if state.restore_file(&entry, revision)? {
                                summary.restored += 1;
                            }
                        }
                        _ => {
                            if state.file(file_id).is_some() {
                                state.remove_file(file_id, revision)?;
                                summary.removed += 1;
                            }
                        }
                    }
                }
                Ok((state.workspace().clone(), summary))
            })?;

        tracing::info!(
            workspace_id = %workspace_id,
            target,
            revision = summary.revision,
            restored = summary.restored,
            removed = summary.removed,
            discarded = summary.discarded,
            actor = %actor,
            "workspace rolled back"
        );

        if let Err(e) = self.gate.observe(workspace_id) {
            tracing::warn!(workspace_id = %workspace_id, error = %e, "completion gate failed after rollback");
        }
        Ok(workspace)
    }

    /// Revisions of a workspace, oldest first.
    pub fn list_revisions(&self, workspace_id: Uuid) -> Result<Vec<Revision>, EngineError> {
        Ok(self.store.list_revisions(workspace_id)?)
    }
}

#[derive(Debug, Default)]
struct RollbackSummary {
    revision: u64,
    restored: usize,
    removed: usize,
    discarded: usize,
}
