// engine.rs — Engine: wires store, plans, queue, gate, resolver and revisions.
//
// Callers build an Engine once from an EngineConfig and share it. Every
// component holds Arcs to the same store, so resolutions, revisions and gate
// observations all serialize on the same per-workspace locks.

use std::sync::Arc;

use chartrev_plan::{JsonPlanStore, Plan, PlanTracker, ProposedPatch};
use chartrev_queue::{JsonlQueue, WorkQueue};
use chartrev_store::{Chart, FileStore, JsonFileBackend, Workspace, WorkspaceFile};
use uuid::Uuid;

use crate::actor::Actor;
use crate::config::EngineConfig;
use crate::error::{EngineError, EntityKind};
use crate::gate::CompletionGate;
use crate::resolver::PatchResolver;
use crate::revision::RevisionManager;

pub struct Engine {
    config: EngineConfig,
    store: Arc<FileStore>,
    plans: Arc<PlanTracker>,
    gate: Arc<CompletionGate>,
    resolver: PatchResolver,
    revisions: RevisionManager,
}

impl Engine {
    /// Assemble an engine from already-built parts.
    pub fn new(
        config: EngineConfig,
        store: Arc<FileStore>,
        plans: PlanTracker,
        queue: Arc<dyn WorkQueue>,
    ) -> Self {
        let plans = Arc::new(plans);
        let gate = Arc::new(CompletionGate::new(
            store.clone(),
            queue,
            config.reindex.clone(),
        ));
        let resolver = PatchResolver::new(store.clone(), gate.clone());
        let revisions = RevisionManager::new(store.clone(), plans.clone(), gate.clone());
        Self {
            config,
            store,
            plans,
            gate,
            resolver,
            revisions,
        }
    }

    /// Open a file-backed engine under `config.data_dir`: JSON workspace
    /// snapshots with JSONL history, one JSON file per plan, and a JSONL outbox.
    pub fn open(config: EngineConfig) -> Result<Self, EngineError> {
        let store = FileStore::open(Box::new(JsonFileBackend::new(config.store_dir())?))?;
        let plans = PlanTracker::new(Box::new(JsonPlanStore::new(config.plans_dir())?));
        let queue = JsonlQueue::open(config.outbox_path())?;
        tracing::debug!(data_dir = %config.data_dir.display(), "engine opened");
        Ok(Self::new(config, Arc::new(store), plans, Arc::new(queue)))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn plans(&self) -> &PlanTracker {
        &self.plans
    }

    pub fn gate(&self) -> &CompletionGate {
        &self.gate
    }

    pub fn resolver(&self) -> &PatchResolver {
        &self.resolver
    }

    pub fn revisions(&self) -> &RevisionManager {
        &self.revisions
    }

    /// The configured default actor.
    pub fn default_actor(&self) -> Actor {
        Actor::new(self.config.default_actor.clone())
    }

    // ── Seeding ──

    pub fn create_workspace(&self, name: &str, actor: &Actor) -> Result<Workspace, EngineError> {
        Ok(self.store.create_workspace(name, actor.user_id.as_str())?)
    }

    pub fn add_chart(&self, workspace_id: Uuid, name: &str) -> Result<Chart, EngineError> {
        Ok(self.store.add_chart(workspace_id, name)?)
    }

    pub fn add_file(
        &self,
        workspace_id: Uuid,
        chart_id: Option<Uuid>,
        file_path: &str,
        content: &str,
    ) -> Result<WorkspaceFile, EngineError> {
        Ok(self.store.add_file(workspace_id, chart_id, file_path, content)?)
    }

    // ── Plans ──

    /// Record a plan for an existing workspace.
    pub fn create_plan(
        &self,
        actor: &Actor,
        prompt: &str,
        workspace_id: Uuid,
        supersedes: Option<Uuid>,
    ) -> Result<Plan, EngineError> {
        if !self.store.contains(workspace_id) {
            return Err(EngineError::not_found(EntityKind::Workspace, workspace_id));
        }
        Ok(self
            .plans
            .create_plan(&actor.user_id, prompt, workspace_id, supersedes)?)
    }

    /// Attach a proposed patch, checking the file belongs to the plan's workspace.
    pub fn attach_patch(
        &self,
        plan_id: Uuid,
        file_id: Uuid,
        content: &str,
    ) -> Result<Plan, EngineError> {
        let plan = self.plans.get_plan(plan_id)?;
        let file_workspace = self.store.workspace_of(file_id)?;
        if file_workspace != plan.workspace_id {
            return Err(EngineError::InvalidPlan {
                plan_id,
                reason: format!(
                    "file {} belongs to workspace {}, plan targets {}",
                    file_id, file_workspace, plan.workspace_id
                ),
            });
        }
        Ok(self
            .plans
            .attach_patch(plan_id, ProposedPatch::new(file_id, content))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartrev_queue::MemoryQueue;
    use tempfile::tempdir;

    fn memory_engine() -> Engine {
        Engine::new(
            EngineConfig::for_project("/unused"),
            Arc::new(FileStore::in_memory()),
            PlanTracker::in_memory(),
            Arc::new(MemoryQueue::new()),
        )
    }

    #[test]
    fn plan_for_unknown_workspace_is_not_found() {
        let engine = memory_engine();
        let err = engine
            .create_plan(&Actor::new("alice"), "x", Uuid::new_v4(), None)
            .unwrap_err();
        assert!(err.is_not_found(EntityKind::Workspace));
    }

    #[test]
    fn cross_workspace_patch_is_invalid() {
        let engine = memory_engine();
        let actor = Actor::new("alice");
        let a = engine.create_workspace("a", &actor).unwrap();
        let b = engine.create_workspace("b", &actor).unwrap();
        let file = engine.add_file(b.workspace_id, None, "values.yaml", "x").unwrap();
        let plan = engine.create_plan(&actor, "p", a.workspace_id, None).unwrap();

        let err = engine.attach_patch(plan.plan_id, file.file_id, "y").unwrap_err();
        assert!(matches!(err, EngineError::InvalidPlan { .. }));
    }

    #[test]
    fn open_persists_across_restarts() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::for_project(dir.path());
        let actor = Actor::new("alice");

        let (ws, file_id, plan_id) = {
            let engine = Engine::open(config.clone()).unwrap();
            let ws = engine.create_workspace("demo", &actor).unwrap().workspace_id;
            let file = engine.add_file(ws, None, "values.yaml", "a").unwrap();
            let plan = engine.create_plan(&actor, "edit", ws, None).unwrap();
            engine.attach_patch(plan.plan_id, file.file_id, "b").unwrap();
            engine.revisions().create_revision(plan.plan_id, &actor).unwrap();
            (ws, file.file_id, plan.plan_id)
        };

        let engine = Engine::open(config.clone()).unwrap();
        assert!(engine.store().get_file(file_id).unwrap().is_pending_at(1));
        assert_eq!(
            engine.plans().get_plan(plan_id).unwrap().materialized_revision(),
            Some(1)
        );

        engine.resolver().accept_patch(file_id, 1, &actor).unwrap();
        assert_eq!(engine.store().get_workspace(ws).unwrap().current_revision, 1);

        let jobs = JsonlQueue::read_all(config.outbox_path()).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, "file.reindex");
    }
}
