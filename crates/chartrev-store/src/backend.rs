// backend.rs — Persistence seam for the file store.
//
// JsonFileBackend layout under its directory:
//   <workspace_id>.json           snapshot (workspace, charts, files, revisions, settle markers)
//   <workspace_id>.history.jsonl  append-only content log
//
// Snapshots are written to a temp file and renamed into place. New history
// entries are appended to the log before the snapshot is replaced.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chartrev_history::{ContentEntry, ContentHistory, ContentLog};
use uuid::Uuid;

use crate::error::StoreError;
use crate::state::WorkspaceState;

/// Where workspace state is loaded from and written to.
pub trait StateBackend: Send + Sync {
    /// Load every persisted workspace, history attached.
    fn load_all(&self) -> Result<Vec<WorkspaceState>, StoreError>;

    /// Persist a committed state. `new_entries` are the history entries the
    /// transaction appended, already chained.
    fn persist(&self, state: &WorkspaceState, new_entries: &[ContentEntry]) -> Result<(), StoreError>;
}

/// JSON snapshot + JSONL history per workspace.
pub struct JsonFileBackend {
    dir: PathBuf,
    logs: Mutex<HashMap<Uuid, ContentLog>>,
}

impl JsonFileBackend {
    /// Create a backend rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StoreError::IoError {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            logs: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_path(&self, workspace_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", workspace_id))
    }

    pub fn history_path(&self, workspace_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.history.jsonl", workspace_id))
    }

    fn load_one(&self, path: &Path) -> Result<WorkspaceState, StoreError> {
        let json = fs::read_to_string(path).map_err(|source| StoreError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut state: WorkspaceState = serde_json::from_str(&json)?;

        let history_path = self.history_path(state.workspace_id());
        if history_path.exists() {
            let entries = ContentLog::read_all(&history_path)?;
            state.attach_history(ContentHistory::from_entries(entries)?);
        }

        state
            .check_invariants()
            .map_err(|e| StoreError::Corrupt {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        Ok(state)
    }

    fn write_snapshot(&self, state: &WorkspaceState) -> Result<(), StoreError> {
        let path = self.snapshot_path(state.workspace_id());
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&tmp, json).map_err(|source| StoreError::IoError {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::IoError { path, source })
    }
}

impl StateBackend for JsonFileBackend {
    fn load_all(&self) -> Result<Vec<WorkspaceState>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::IoError {
            path: self.dir.clone(),
            source,
        })?;

        let mut states = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::IoError {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            states.push(self.load_one(&path)?);
        }
        Ok(states)
    }

    fn persist(&self, state: &WorkspaceState, new_entries: &[ContentEntry]) -> Result<(), StoreError> {
        if !new_entries.is_empty() {
            let workspace_id = state.workspace_id();
            let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
            if !logs.contains_key(&workspace_id) {
                let log = ContentLog::open(self.history_path(workspace_id))?;
                logs.insert(workspace_id, log);
            }
            if let Some(log) = logs.get_mut(&workspace_id) {
                for entry in new_entries {
                    log.append(entry)?;
                }
            }
        }
        self.write_snapshot(state)
    }
}
