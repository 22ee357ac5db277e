// store.rs — PlanStore: persistence for plans.
//
// JsonPlanStore keeps one JSON file per plan: `<store_dir>/<plan_id>.json`.
// MemoryPlanStore is the in-process equivalent used by tests and embedders
// that persist elsewhere.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use crate::error::PlanError;
use crate::plan::Plan;

/// Storage backend for plans.
pub trait PlanStore: Send + Sync {
    /// Save a plan (creates or overwrites).
    fn save(&self, plan: &Plan) -> Result<(), PlanError>;

    /// Get a plan by ID.
    fn get(&self, plan_id: Uuid) -> Result<Option<Plan>, PlanError>;

    /// All plans, newest first.
    fn list(&self) -> Result<Vec<Plan>, PlanError>;
}

/// In-memory plan store.
#[derive(Default)]
pub struct MemoryPlanStore {
    plans: Mutex<HashMap<Uuid, Plan>>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlanStore for MemoryPlanStore {
    fn save(&self, plan: &Plan) -> Result<(), PlanError> {
        self.plans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(plan.plan_id, plan.clone());
        Ok(())
    }

    fn get(&self, plan_id: Uuid) -> Result<Option<Plan>, PlanError> {
        Ok(self
            .plans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&plan_id)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Plan>, PlanError> {
        let mut plans: Vec<Plan> = self
            .plans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }
}

/// Plan store backed by one JSON file per plan.
pub struct JsonPlanStore {
    store_dir: PathBuf,
}

impl JsonPlanStore {
    /// Create a new store backed by the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(store_dir: impl AsRef<Path>) -> Result<Self, PlanError> {
        let store_dir = store_dir.as_ref().to_path_buf();
        fs::create_dir_all(&store_dir).map_err(|source| PlanError::IoError {
            path: store_dir.display().to_string(),
            source,
        })?;
        Ok(Self { store_dir })
    }

    fn plan_file(&self, plan_id: Uuid) -> PathBuf {
        self.store_dir.join(format!("{}.json", plan_id))
    }

    fn read_plan(path: &Path) -> Result<Plan, PlanError> {
        let json = fs::read_to_string(path).map_err(|source| PlanError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl PlanStore for JsonPlanStore {
    fn save(&self, plan: &Plan) -> Result<(), PlanError> {
        let path = self.plan_file(plan.plan_id);
        let json = serde_json::to_string_pretty(plan)?;
        fs::write(&path, json).map_err(|source| PlanError::IoError {
            path: path.display().to_string(),
            source,
        })
    }

    fn get(&self, plan_id: Uuid) -> Result<Option<Plan>, PlanError> {
        let path = self.plan_file(plan_id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_plan(&path).map(Some)
    }

    fn list(&self) -> Result<Vec<Plan>, PlanError> {
        let entries = fs::read_dir(&self.store_dir).map_err(|source| PlanError::IoError {
            path: self.store_dir.display().to_string(),
            source,
        })?;

        let mut plans = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| PlanError::IoError {
                path: self.store_dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match Self::read_plan(&path) {
                    Ok(plan) => plans.push(plan),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable plan"),
                }
            }
        }

        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }
}
