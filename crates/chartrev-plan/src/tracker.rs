// tracker.rs — PlanTracker: records plans and their supersession chain.
//
// Writes are serialized through one mutex so that two plans superseding the
// same predecessor cannot both win: the second sees the predecessor already
// superseded and fails.

use std::sync::Mutex;

use uuid::Uuid;

use crate::error::PlanError;
use crate::plan::{Plan, PlanStatus, ProposedPatch};
use crate::store::{MemoryPlanStore, PlanStore};

pub struct PlanTracker {
    store: Box<dyn PlanStore>,
    writes: Mutex<()>,
}

impl PlanTracker {
    pub fn new(store: Box<dyn PlanStore>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryPlanStore::new()))
    }

    /// Record a new proposed plan.
    ///
    /// When `supersedes` names a proposed plan, that plan becomes superseded
    /// and its patches are discarded. A materialized predecessor keeps its
    /// status; only the new plan records the link.
    pub fn create_plan(
        &self,
        user_id: &str,
        prompt: &str,
        workspace_id: Uuid,
        supersedes: Option<Uuid>,
    ) -> Result<Plan, PlanError> {
        let _guard = self.writes.lock().map_err(|_| PlanError::LockPoisoned)?;

        let plan = Plan::new(workspace_id, user_id, prompt, supersedes);

        let predecessor = match supersedes {
            Some(prior_id) => {
                let mut prior = self.require(prior_id)?;
                if prior.workspace_id != workspace_id {
                    return Err(PlanError::WorkspaceMismatch {
                        plan_id: prior_id,
                        expected: workspace_id,
                        actual: prior.workspace_id,
                    });
                }
                match prior.status {
                    PlanStatus::Proposed => {
                        prior.supersede(plan.plan_id)?;
                        Some(prior)
                    }
                    PlanStatus::Materialized { .. } => None,
                    PlanStatus::Superseded { .. } => {
                        return Err(prior.invalid_transition(&PlanStatus::Superseded {
                            by: plan.plan_id,
                        }));
                    }
                }
            }
            None => None,
        };

        self.store.save(&plan)?;
        if let Some(prior) = predecessor {
            self.store.save(&prior)?;
            tracing::info!(plan_id = %prior.plan_id, by = %plan.plan_id, "plan superseded");
        }

        tracing::info!(
            plan_id = %plan.plan_id,
            workspace_id = %workspace_id,
            created_by = %user_id,
            "plan created"
        );
        Ok(plan)
    }

    pub fn get_plan(&self, plan_id: Uuid) -> Result<Plan, PlanError> {
        self.require(plan_id)
    }

    /// Plans for one workspace, newest first.
    pub fn list_plans(&self, workspace_id: Uuid) -> Result<Vec<Plan>, PlanError> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter(|p| p.workspace_id == workspace_id)
            .collect())
    }

    /// Attach a proposed patch from the planning agent.
    pub fn attach_patch(&self, plan_id: Uuid, patch: ProposedPatch) -> Result<Plan, PlanError> {
        let _guard = self.writes.lock().map_err(|_| PlanError::LockPoisoned)?;
        let mut plan = self.require(plan_id)?;
        plan.attach_patch(patch)?;
        self.store.save(&plan)?;
        tracing::debug!(plan_id = %plan_id, patches = plan.patches.len(), "patch attached");
        Ok(plan)
    }

    /// Record that a plan has been materialized. Repeating the call with
    /// the same revision is a no-op.
    pub fn mark_materialized(&self, plan_id: Uuid, revision_number: u64) -> Result<Plan, PlanError> {
        let _guard = self.writes.lock().map_err(|_| PlanError::LockPoisoned)?;
        let mut plan = self.require(plan_id)?;
        self.record_materialized(&mut plan, revision_number)?;
        Ok(plan)
    }

    /// Materialize a plan with the write lock held throughout.
    ///
    /// `f` receives the plan as currently stored and returns its result
    /// together with the revision the plan was materialized at. The plan is
    /// then marked materialized at that revision before the lock is
    /// released, so no supersession can land between `f`'s status check and
    /// the marking. If `f` fails the plan is left as it was.
    pub fn materialize_with<T, E, F>(&self, plan_id: Uuid, f: F) -> Result<T, E>
    where
        E: From<PlanError>,
        F: FnOnce(&Plan) -> Result<(T, u64), E>,
    {
        let _guard = self.writes.lock().map_err(|_| PlanError::LockPoisoned)?;
        let mut plan = self.require(plan_id)?;
        let (value, revision_number) = f(&plan)?;
        self.record_materialized(&mut plan, revision_number)?;
        Ok(value)
    }

    fn record_materialized(&self, plan: &mut Plan, revision_number: u64) -> Result<(), PlanError> {
        if plan.materialized_revision() == Some(revision_number) {
            return Ok(());
        }
        plan.transition(PlanStatus::Materialized { revision_number })?;
        self.store.save(plan)?;
        tracing::info!(plan_id = %plan.plan_id, revision = revision_number, "plan materialized");
        Ok(())
    }

    fn require(&self, plan_id: Uuid) -> Result<Plan, PlanError> {
        self.store.get(plan_id)?.ok_or(PlanError::NotFound(plan_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonPlanStore;
    use tempfile::tempdir;

    #[test]
    fn create_get_and_list() {
        let tracker = PlanTracker::in_memory();
        let ws = Uuid::new_v4();
        let plan = tracker.create_plan("alice", "add redis", ws, None).unwrap();
        tracker
            .create_plan("bob", "elsewhere", Uuid::new_v4(), None)
            .unwrap();

        assert_eq!(tracker.get_plan(plan.plan_id).unwrap().prompt, "add redis");
        assert_eq!(tracker.list_plans(ws).unwrap().len(), 1);
        assert!(matches!(
            tracker.get_plan(Uuid::new_v4()),
            Err(PlanError::NotFound(_))
        ));
    }

    #[test]
    fn superseding_a_proposed_plan_discards_its_patches() {
        let tracker = PlanTracker::in_memory();
        let ws = Uuid::new_v4();
        let first = tracker.create_plan("alice", "v1", ws, None).unwrap();
        tracker
            .attach_patch(first.plan_id, ProposedPatch::new(Uuid::new_v4(), "a"))
            .unwrap();

        let second = tracker
            .create_plan("alice", "v2", ws, Some(first.plan_id))
            .unwrap();
        let first = tracker.get_plan(first.plan_id).unwrap();

        assert_eq!(first.status, PlanStatus::Superseded { by: second.plan_id });
        assert!(first.patches.is_empty());
        assert_eq!(second.supersedes, Some(first.plan_id));
    }

    #[test]
    fn superseding_twice_fails() {
        let tracker = PlanTracker::in_memory();
        let ws = Uuid::new_v4();
        let first = tracker.create_plan("alice", "v1", ws, None).unwrap();
        tracker
            .create_plan("alice", "v2", ws, Some(first.plan_id))
            .unwrap();

        let err = tracker
            .create_plan("bob", "v2b", ws, Some(first.plan_id))
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidTransition { .. }));
    }

    #[test]
    fn materialized_predecessor_keeps_status() {
        let tracker = PlanTracker::in_memory();
        let ws = Uuid::new_v4();
        let first = tracker.create_plan("alice", "v1", ws, None).unwrap();
        tracker.mark_materialized(first.plan_id, 1).unwrap();

        let second = tracker
            .create_plan("alice", "follow-up", ws, Some(first.plan_id))
            .unwrap();
        let first = tracker.get_plan(first.plan_id).unwrap();

        assert_eq!(first.materialized_revision(), Some(1));
        assert!(first.superseded_by.is_none());
        assert_eq!(second.supersedes, Some(first.plan_id));
    }

    #[test]
    fn cross_workspace_supersede_is_rejected() {
        let tracker = PlanTracker::in_memory();
        let first = tracker
            .create_plan("alice", "v1", Uuid::new_v4(), None)
            .unwrap();
        let err = tracker
            .create_plan("alice", "v2", Uuid::new_v4(), Some(first.plan_id))
            .unwrap_err();
        assert!(matches!(err, PlanError::WorkspaceMismatch { .. }));
    }

    #[test]
    fn mark_materialized_is_idempotent_for_same_revision() {
        let tracker = PlanTracker::in_memory();
        let plan = tracker
            .create_plan("alice", "v1", Uuid::new_v4(), None)
            .unwrap();
        tracker.mark_materialized(plan.plan_id, 2).unwrap();
        tracker.mark_materialized(plan.plan_id, 2).unwrap();
        assert!(tracker.mark_materialized(plan.plan_id, 3).is_err());
    }

    #[test]
    fn materialize_with_marks_only_on_success() {
        let tracker = PlanTracker::in_memory();
        let plan = tracker
            .create_plan("alice", "v1", Uuid::new_v4(), None)
            .unwrap();

        let failed: Result<(), PlanError> =
            tracker.materialize_with(plan.plan_id, |_| Err(PlanError::LockPoisoned));
        assert!(failed.is_err());
        assert!(tracker.get_plan(plan.plan_id).unwrap().status.is_proposed());

        let seen = tracker
            .materialize_with(plan.plan_id, |p| Ok::<_, PlanError>((p.status.clone(), 4)))
            .unwrap();
        assert_eq!(seen, PlanStatus::Proposed);
        assert_eq!(
            tracker.get_plan(plan.plan_id).unwrap().materialized_revision(),
            Some(4)
        );
    }

    #[test]
    fn supersede_racing_materialize_never_leaves_both() {
        for _ in 0..20 {
            let tracker = PlanTracker::in_memory();
            let ws = Uuid::new_v4();
            let plan = tracker.create_plan("alice", "v1", ws, None).unwrap();
            let plan_id = plan.plan_id;

            let materialized = std::thread::scope(|scope| {
                let materialize = scope.spawn(|| {
                    tracker
                        .materialize_with(plan_id, |p| {
                            if p.status.is_proposed() {
                                Ok(((), 1))
                            } else {
                                Err(PlanError::NotFound(p.plan_id))
                            }
                        })
                        .is_ok()
                });
                let supersede = scope.spawn(|| {
                    tracker.create_plan("bob", "v2", ws, Some(plan_id)).unwrap();
                });
                supersede.join().unwrap();
                materialize.join().unwrap()
            });

            let status = tracker.get_plan(plan_id).unwrap().status;
            if materialized {
                assert_eq!(status, PlanStatus::Materialized { revision_number: 1 });
            } else {
                assert!(matches!(status, PlanStatus::Superseded { .. }));
            }
        }
    }

    #[test]
    fn json_backed_tracker_persists_supersession() {
        let dir = tempdir().unwrap();
        let ws = Uuid::new_v4();
        let (first, second) = {
            let tracker = PlanTracker::new(Box::new(JsonPlanStore::new(dir.path()).unwrap()));
            let first = tracker.create_plan("alice", "v1", ws, None).unwrap();
            let second = tracker
                .create_plan("alice", "v2", ws, Some(first.plan_id))
                .unwrap();
            (first.plan_id, second.plan_id)
        };

        let tracker = PlanTracker::new(Box::new(JsonPlanStore::new(dir.path()).unwrap()));
        assert_eq!(
            tracker.get_plan(first).unwrap().status,
            PlanStatus::Superseded { by: second }
        );
        assert_eq!(tracker.list_plans(ws).unwrap().len(), 2);
    }
}
