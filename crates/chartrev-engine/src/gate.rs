// gate.rs — CompletionGate: settle-once detection and reindex fan-out.
//
// After a resolution the gate counts files still pending at the workspace's
// current revision. When the count is zero it marks the revision settled and
// enqueues one reindex job per file. Counting and marking happen in the same
// workspace transaction, so two resolvers racing on the last two pending
// files cannot both fire: the loser finds the marker already set.
//
// Enqueueing runs after the transaction commits. A failed enqueue is logged
// and counted; it never undoes the resolution that triggered it.

use std::sync::Arc;

use chartrev_history::EntryCause;
use chartrev_queue::{ReindexJob, WorkQueue};
use chartrev_store::{FileStore, RevisionKind, StoreError, WorkspaceState};
use serde::Serialize;
use uuid::Uuid;

use crate::config::ReindexConfig;
use crate::error::EngineError;

/// What one observation of a workspace concluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    /// Files are still pending at the current revision.
    Pending { revision: u64, remaining: usize },
    /// This observation settled the revision and fanned out reindex jobs.
    Settled {
        revision: u64,
        enqueued: usize,
        failed: usize,
    },
    /// An earlier observation already settled the revision.
    AlreadySettled { revision: u64 },
    /// Settled, but every patch was rejected and config says not to reindex.
    Suppressed { revision: u64 },
}

impl GateOutcome {
    pub fn revision(&self) -> u64 {
        match self {
            GateOutcome::Pending { revision, .. }
            | GateOutcome::Settled { revision, .. }
            | GateOutcome::AlreadySettled { revision }
            | GateOutcome::Suppressed { revision } => *revision,
        }
    }

    /// Whether this observation is the one that settled the revision.
    pub fn settled_now(&self) -> bool {
        matches!(
            self,
            GateOutcome::Settled { .. } | GateOutcome::Suppressed { .. }
        )
    }
}

/// Decision taken under the workspace lock.
enum Decision {
    Outcome(GateOutcome),
    Fire { revision: u64, jobs: Vec<ReindexJob> },
}

pub struct CompletionGate {
    store: Arc<FileStore>,
    queue: Arc<dyn WorkQueue>,
    config: ReindexConfig,
}

impl CompletionGate {
    pub fn new(store: Arc<FileStore>, queue: Arc<dyn WorkQueue>, config: ReindexConfig) -> Self {
        Self {
            store,
            queue,
            config,
        }
    }

    /// Observe a workspace after a resolution event.
    pub fn observe(&self, workspace_id: Uuid) -> Result<GateOutcome, EngineError> {
        // Cheap read first; most observations find work still pending.
        let (revision, remaining, settled) = self.store.read(workspace_id, |state| {
            let revision = state.current_revision();
            (revision, state.pending_count(revision), state.is_settled(revision))
        })?;
        if remaining > 0 {
            return Ok(GateOutcome::Pending {
                revision,
                remaining,
            });
        }
        if settled {
            return Ok(GateOutcome::AlreadySettled { revision });
        }

        let decision = self
            .store
            .transact(workspace_id, |state| Ok::<_, StoreError>(self.decide(state)))?;

        match decision {
            Decision::Outcome(outcome) => {
                if let GateOutcome::Suppressed { revision } = outcome {
                    tracing::info!(
                        workspace_id = %workspace_id,
                        revision,
                        "revision settled with every patch rejected; reindex suppressed"
                    );
                }
                Ok(outcome)
            }
            Decision::Fire { revision, jobs } => Ok(self.fan_out(workspace_id, revision, jobs)),
        }
    }

    fn decide(&self, state: &mut WorkspaceState) -> Decision {
        let revision = state.current_revision();
        let remaining = state.pending_count(revision);
        if remaining > 0 {
            return Decision::Outcome(GateOutcome::Pending {
                revision,
                remaining,
            });
        }
        if !state.try_mark_settled(revision) {
            return Decision::Outcome(GateOutcome::AlreadySettled { revision });
        }
        if self.suppress(state, revision) {
            return Decision::Outcome(GateOutcome::Suppressed { revision });
        }

        let workspace_id = state.workspace_id();
        let jobs = state
            .files()
            .iter()
            .map(|file| ReindexJob {
                workspace_id,
                file_id: file.file_id,
                file_path: file.file_path.clone(),
                revision,
            })
            .collect();
        Decision::Fire { revision, jobs }
    }

    /// A plan revision in which nothing was accepted changed no content.
    fn suppress(&self, state: &WorkspaceState, revision: u64) -> bool {
        if self.config.when_all_rejected {
            return false;
        }
        let is_plan = state
            .revision(revision)
            .is_some_and(|r| r.kind == RevisionKind::Plan);
        is_plan && !state.history().has_cause_at(revision, EntryCause::Accepted)
    }

    fn fan_out(&self, workspace_id: Uuid, revision: u64, jobs: Vec<ReindexJob>) -> GateOutcome {
        let mut enqueued = 0;
        let mut failed = 0;

        for job in jobs {
            let file_id = job.file_id;
            let result = serde_json::to_value(&job)
                .map_err(Into::into)
                .and_then(|payload| self.queue.enqueue(&self.config.job_kind, payload));
            match result {
                Ok(_) => enqueued += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        workspace_id = %workspace_id,
                        file_id = %file_id,
                        revision,
                        error = %e,
                        "failed to enqueue reindex job"
                    );
                }
            }
        }

        tracing::info!(
            workspace_id = %workspace_id,
            revision,
            enqueued,
            failed,
            "revision settled"
        );
        GateOutcome::Settled {
            revision,
            enqueued,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartrev_queue::{MemoryQueue, QueueError};

    struct FailingQueue;

    impl WorkQueue for FailingQueue {
        fn enqueue(&self, kind: &str, _payload: serde_json::Value) -> Result<Uuid, QueueError> {
            Err(QueueError::Rejected {
                kind: kind.to_string(),
                reason: "transport down".into(),
            })
        }
    }

    fn workspace_with_pending(store: &FileStore, files: usize) -> (Uuid, Vec<Uuid>) {
        let ws = store.create_workspace("demo", "alice").unwrap().workspace_id;
        let ids: Vec<Uuid> = (0..files)
            .map(|i| {
                store
                    .add_file(ws, None, format!("file-{}.yaml", i), "a")
                    .unwrap()
                    .file_id
            })
            .collect();
        store
            .transact(ws, |state| {
                let rev = state.allocate_revision(RevisionKind::Plan, None, "alice");
                for id in &ids {
                    state.stamp_pending(*id, "b", rev.revision_number)?;
                }
                Ok::<_, StoreError>(())
            })
            .unwrap();
        (ws, ids)
    }

    fn resolve(store: &FileStore, ws: Uuid, file_id: Uuid, accept: bool) {
        store
            .transact(ws, |state| {
                if accept {
                    state.confirm_pending(file_id)
                } else {
                    state.discard_pending(file_id)
                }
            })
            .unwrap();
    }

    #[test]
    fn pending_until_last_file_resolves_then_settles_once() {
        let store = Arc::new(FileStore::in_memory());
        let queue = Arc::new(MemoryQueue::new());
        let gate = CompletionGate::new(store.clone(), queue.clone(), ReindexConfig::default());
        let (ws, ids) = workspace_with_pending(&store, 2);

        resolve(&store, ws, ids[0], true);
        assert_eq!(
            gate.observe(ws).unwrap(),
            GateOutcome::Pending {
                revision: 1,
                remaining: 1
            }
        );

        resolve(&store, ws, ids[1], false);
        let outcome = gate.observe(ws).unwrap();
        assert_eq!(
            outcome,
            GateOutcome::Settled {
                revision: 1,
                enqueued: 2,
                failed: 0
            }
        );
        assert!(outcome.settled_now());
        assert_eq!(
            gate.observe(ws).unwrap(),
            GateOutcome::AlreadySettled { revision: 1 }
        );
        assert_eq!(queue.reindex_jobs("file.reindex").len(), 2);
    }

    #[test]
    fn all_rejected_is_suppressed_when_configured() {
        let store = Arc::new(FileStore::in_memory());
        let queue = Arc::new(MemoryQueue::new());
        let config = ReindexConfig {
            when_all_rejected: false,
            ..ReindexConfig::default()
        };
        let gate = CompletionGate::new(store.clone(), queue.clone(), config);
        let (ws, ids) = workspace_with_pending(&store, 2);

        for id in &ids {
            resolve(&store, ws, *id, false);
        }
        assert_eq!(
            gate.observe(ws).unwrap(),
            GateOutcome::Suppressed { revision: 1 }
        );
        assert!(queue.is_empty());
        assert_eq!(
            gate.observe(ws).unwrap(),
            GateOutcome::AlreadySettled { revision: 1 }
        );
    }

    #[test]
    fn one_accept_defeats_suppression() {
        let store = Arc::new(FileStore::in_memory());
        let queue = Arc::new(MemoryQueue::new());
        let config = ReindexConfig {
            when_all_rejected: false,
            ..ReindexConfig::default()
        };
        let gate = CompletionGate::new(store.clone(), queue.clone(), config);
        let (ws, ids) = workspace_with_pending(&store, 2);

        resolve(&store, ws, ids[0], true);
        resolve(&store, ws, ids[1], false);
        assert!(matches!(
            gate.observe(ws).unwrap(),
            GateOutcome::Settled { enqueued: 2, .. }
        ));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn enqueue_failures_are_counted_not_raised() {
        let store = Arc::new(FileStore::in_memory());
        let gate = CompletionGate::new(store.clone(), Arc::new(FailingQueue), ReindexConfig::default());
        let (ws, ids) = workspace_with_pending(&store, 3);
        for id in &ids {
            resolve(&store, ws, *id, true);
        }

        assert_eq!(
            gate.observe(ws).unwrap(),
            GateOutcome::Settled {
                revision: 1,
                enqueued: 0,
                failed: 3
            }
        );
        // The revision stays settled; the queue's own redelivery owns retries.
        assert!(store.read(ws, |s| s.is_settled(1)).unwrap());
    }

    #[test]
    fn unknown_workspace_is_not_found() {
        let store = Arc::new(FileStore::in_memory());
        let gate = CompletionGate::new(store, Arc::new(MemoryQueue::new()), ReindexConfig::default());
        let err = gate.observe(Uuid::new_v4()).unwrap_err();
        assert!(err.is_not_found(crate::error::EntityKind::Workspace));
    }
}
