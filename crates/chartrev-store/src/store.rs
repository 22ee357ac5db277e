// store.rs — FileStore: per-workspace locking and copy-on-write transactions.
//
// Each workspace lives behind its own Mutex. A transaction locks the
// workspace, runs the caller's closure on a clone of its state, checks
// invariants, persists the clone through the backend and only then swaps it
// in. The clone shares the workspace's committed content history, so its
// cost does not grow with the history. If any step fails the live state is untouched, so a closure can check a
// precondition and mutate in one step without a reader ever seeing half of it.
//
// Lock order: workspace mutex, then the file index. Lookups that need both
// release the index before taking a workspace lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chartrev_history::ContentEntry;
use uuid::Uuid;

use crate::backend::StateBackend;
use crate::error::StoreError;
use crate::model::{Chart, Revision, Workspace, WorkspaceFile};
use crate::state::WorkspaceState;

type Slot = Arc<Mutex<WorkspaceState>>;

/// Holds every workspace and serializes mutations per workspace.
pub struct FileStore {
    workspaces: RwLock<HashMap<Uuid, Slot>>,
    /// file_id → workspace_id, for operations addressed by file alone.
    file_index: RwLock<HashMap<Uuid, Uuid>>,
    backend: Option<Box<dyn StateBackend>>,
}

impl FileStore {
    /// A store that keeps everything in memory.
    pub fn in_memory() -> Self {
        Self {
            workspaces: RwLock::new(HashMap::new()),
            file_index: RwLock::new(HashMap::new()),
            backend: None,
        }
    }

    /// Open a store over a persistence backend, loading every saved workspace.
    pub fn open(backend: Box<dyn StateBackend>) -> Result<Self, StoreError> {
        let states = backend.load_all()?;
        let mut workspaces = HashMap::new();
        let mut file_index = HashMap::new();
        for state in states {
            let workspace_id = state.workspace_id();
            for file in state.files() {
                file_index.insert(file.file_id, workspace_id);
            }
            workspaces.insert(workspace_id, Arc::new(Mutex::new(state)));
        }
        tracing::debug!(workspaces = workspaces.len(), "file store opened");

        Ok(Self {
            workspaces: RwLock::new(workspaces),
            file_index: RwLock::new(file_index),
            backend: Some(backend),
        })
    }

    // ── Transactions ──

    /// Run `f` against a workspace as one atomic step.
    ///
    /// The closure works on a draft copy. The draft replaces the live state
    /// only if `f` succeeds, invariants hold and the backend (if any) has
    /// persisted it. Concurrent transactions on the same workspace run one
    /// at a time; different workspaces never block each other.
    pub fn transact<T, E, F>(&self, workspace_id: Uuid, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut WorkspaceState) -> Result<T, E>,
        E: From<StoreError>,
    {
        let slot = self.slot(workspace_id)?;
        let mut live = slot
            .lock()
            .map_err(|_| StoreError::LockPoisoned(workspace_id))?;

        // The draft shares the committed history with the live state; only
        // entries the closure appends are its own.
        let mut draft = live.clone();

        let value = f(&mut draft)?;
        draft.check_invariants()?;

        if let Some(backend) = &self.backend {
            backend.persist(&draft, draft.history().staged())?;
        }

        let removed = draft.take_removed();
        let file_ids: Vec<Uuid> = draft.files().iter().map(|f| f.file_id).collect();
        *live = draft;
        // The old live state is gone, so folding the staged entries in
        // does not copy the shared history.
        live.commit_history();
        self.reindex(workspace_id, &file_ids, &removed);

        Ok(value)
    }

    /// Run a read-only closure against a consistent view of a workspace.
    pub fn read<T, F>(&self, workspace_id: Uuid, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&WorkspaceState) -> T,
    {
        let slot = self.slot(workspace_id)?;
        let state = slot
            .lock()
            .map_err(|_| StoreError::LockPoisoned(workspace_id))?;
        Ok(f(&state))
    }

    // ── Seeding ──

    /// Create and persist a new, empty workspace at revision 0.
    pub fn create_workspace(
        &self,
        name: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Result<Workspace, StoreError> {
        let state = WorkspaceState::new(name, created_by);
        if let Some(backend) = &self.backend {
            backend.persist(&state, &[])?;
        }
        let workspace = state.workspace().clone();
        self.workspaces
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(workspace.workspace_id, Arc::new(Mutex::new(state)));
        tracing::info!(workspace_id = %workspace.workspace_id, name = %workspace.name, "workspace created");
        Ok(workspace)
    }

    pub fn add_chart(&self, workspace_id: Uuid, name: impl Into<String>) -> Result<Chart, StoreError> {
        let name = name.into();
        self.transact(workspace_id, |state| Ok(state.add_chart(name)))
    }

    /// Add a clean file to a chart (or as a loose file when `chart_id` is None).
    pub fn add_file(
        &self,
        workspace_id: Uuid,
        chart_id: Option<Uuid>,
        file_path: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<WorkspaceFile, StoreError> {
        let file_path = file_path.into();
        let content = content.into();
        self.transact(workspace_id, |state| {
            state.add_file(chart_id, file_path, content)
        })
    }

    // ── Lookups ──

    pub fn contains(&self, workspace_id: Uuid) -> bool {
        self.workspaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&workspace_id)
    }

    pub fn get_workspace(&self, workspace_id: Uuid) -> Result<Workspace, StoreError> {
        self.read(workspace_id, |state| state.workspace().clone())
    }

    /// All workspaces, oldest first.
    pub fn list_workspaces(&self) -> Vec<Workspace> {
        let slots: Vec<Slot> = self
            .workspaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let mut workspaces: Vec<Workspace> = slots
            .iter()
            .filter_map(|slot| slot.lock().ok().map(|s| s.workspace().clone()))
            .collect();
        workspaces.sort_by_key(|w| w.created_at);
        workspaces
    }

    /// The workspace a file belongs to.
    pub fn workspace_of(&self, file_id: Uuid) -> Result<Uuid, StoreError> {
        self.file_index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&file_id)
            .copied()
            .ok_or(StoreError::FileNotFound(file_id))
    }

    pub fn get_file(&self, file_id: Uuid) -> Result<WorkspaceFile, StoreError> {
        let workspace_id = self.workspace_of(file_id)?;
        self.read(workspace_id, |state| state.file(file_id).cloned())?
            .ok_or(StoreError::FileNotFound(file_id))
    }

    pub fn list_charts(&self, workspace_id: Uuid) -> Result<Vec<Chart>, StoreError> {
        self.read(workspace_id, |state| state.charts().to_vec())
    }

    pub fn list_files(&self, workspace_id: Uuid) -> Result<Vec<WorkspaceFile>, StoreError> {
        self.read(workspace_id, |state| state.files().to_vec())
    }

    pub fn list_revisions(&self, workspace_id: Uuid) -> Result<Vec<Revision>, StoreError> {
        self.read(workspace_id, |state| state.revisions().to_vec())
    }

    /// Content history of one file, oldest first. Works for removed files
    /// as long as the caller knows which workspace they belonged to.
    pub fn file_history(
        &self,
        workspace_id: Uuid,
        file_id: Uuid,
    ) -> Result<Vec<ContentEntry>, StoreError> {
        self.read(workspace_id, |state| {
            state
                .history()
                .entries_for(file_id)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    // ── Internal ──

    fn slot(&self, workspace_id: Uuid) -> Result<Slot, StoreError> {
        self.workspaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&workspace_id)
            .cloned()
            .ok_or(StoreError::WorkspaceNotFound(workspace_id))
    }

    fn reindex(&self, workspace_id: Uuid, current: &[Uuid], removed: &[Uuid]) {
        let mut index = self
            .file_index
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for file_id in removed {
            index.remove(file_id);
        }
        for file_id in current {
            index.insert(*file_id, workspace_id);
        }
    }
}
