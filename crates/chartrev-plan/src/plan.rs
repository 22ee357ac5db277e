// plan.rs — Plan data model and lifecycle state machine.
//
// A Plan is a proposed, not-yet-applied changeset tied to the prompt that
// produced it. Patches arrive from the planning agent while the plan is
// proposed; materializing the plan turns them into pending content at a new
// revision.
//
// State machine:
//   proposed → materialized { revision_number }
//   proposed → superseded { by }
// Both targets are terminal.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PlanError;

/// Proposed replacement content for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedPatch {
    pub file_id: Uuid,
    pub content: String,
}

impl ProposedPatch {
    pub fn new(file_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            file_id,
            content: content.into(),
        }
    }
}

/// Where a plan is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlanStatus {
    /// Accepting patches; not yet turned into a revision.
    Proposed,
    /// Materialized into the given revision.
    Materialized { revision_number: u64 },
    /// Replaced by a later plan before it was materialized.
    Superseded { by: Uuid },
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStatus::Proposed => write!(f, "proposed"),
            PlanStatus::Materialized { revision_number } => {
                write!(f, "materialized (revision {})", revision_number)
            }
            PlanStatus::Superseded { by } => write!(f, "superseded by {}", by),
        }
    }
}

impl PlanStatus {
    /// Check if a transition to `next` is valid.
    pub fn can_transition_to(&self, next: &PlanStatus) -> bool {
        matches!(
            (self, next),
            (PlanStatus::Proposed, PlanStatus::Materialized { .. })
                | (PlanStatus::Proposed, PlanStatus::Superseded { .. })
        )
    }

    pub fn is_proposed(&self) -> bool {
        matches!(self, PlanStatus::Proposed)
    }
}

/// A proposed changeset for one workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: Uuid,
    pub workspace_id: Uuid,

    /// User who asked for the plan.
    pub created_by: String,

    /// The natural-language prompt the plan answers.
    pub prompt: String,

    /// Earlier plan this one overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<Uuid>,

    /// Later plan that overrode this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<Uuid>,

    pub status: PlanStatus,

    /// At most one patch per file.
    #[serde(default)]
    pub patches: Vec<ProposedPatch>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    pub fn new(
        workspace_id: Uuid,
        created_by: impl Into<String>,
        prompt: impl Into<String>,
        supersedes: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            plan_id: Uuid::new_v4(),
            workspace_id,
            created_by: created_by.into(),
            prompt: prompt.into(),
            supersedes,
            superseded_by: None,
            status: PlanStatus::Proposed,
            patches: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to a new status, returning an error if invalid.
    pub fn transition(&mut self, new_status: PlanStatus) -> Result<(), PlanError> {
        if !self.status.can_transition_to(&new_status) {
            return Err(self.invalid_transition(&new_status));
        }
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Attach a patch, replacing any earlier patch for the same file.
    pub fn attach_patch(&mut self, patch: ProposedPatch) -> Result<(), PlanError> {
        if !self.status.is_proposed() {
            return Err(PlanError::InvalidTransition {
                plan_id: self.plan_id,
                from: self.status.to_string(),
                to: "proposed (attach patch)".to_string(),
            });
        }
        match self.patches.iter_mut().find(|p| p.file_id == patch.file_id) {
            Some(existing) => existing.content = patch.content,
            None => self.patches.push(patch),
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark this plan superseded by `by`, discarding its patches.
    pub fn supersede(&mut self, by: Uuid) -> Result<(), PlanError> {
        self.transition(PlanStatus::Superseded { by })?;
        self.superseded_by = Some(by);
        self.patches.clear();
        Ok(())
    }

    /// The revision this plan was materialized into, if any.
    pub fn materialized_revision(&self) -> Option<u64> {
        match self.status {
            PlanStatus::Materialized { revision_number } => Some(revision_number),
            _ => None,
        }
    }

    pub(crate) fn invalid_transition(&self, to: &PlanStatus) -> PlanError {
        PlanError::InvalidTransition {
            plan_id: self.plan_id,
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}
