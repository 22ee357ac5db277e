// state.rs — WorkspaceState: everything one workspace owns.
//
// All leaf mutations live here: stamping pending content, confirming or
// discarding it, restoring content during rollback, allocating revision
// numbers and marking revisions settled. Decision logic (preconditions,
// optimistic concurrency, settle-once) belongs to the callers that run these
// operations inside a FileStore transaction.

use std::collections::BTreeSet;

use chartrev_history::{ContentEntry, ContentHistory, EntryCause};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Chart, FileStatus, Revision, RevisionKind, Workspace, WorkspaceFile};

/// One workspace with its charts, files, revisions, settle markers and history.
///
/// The snapshot serializes everything except `history`, which is persisted
/// separately as an append-only log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceState {
    workspace: Workspace,
    charts: Vec<Chart>,
    /// Files in display order.
    files: Vec<WorkspaceFile>,
    revisions: Vec<Revision>,
    /// Revisions whose completion has already been observed.
    settled: BTreeSet<u64>,
    #[serde(skip)]
    history: ContentHistory,
    /// Files removed during the current transaction (drained by the store).
    #[serde(skip)]
    removed: Vec<Uuid>,
}

impl WorkspaceState {
    /// Create a new workspace at revision 0 with an initial revision record.
    pub fn new(name: impl Into<String>, created_by: impl Into<String>) -> Self {
        let now = Utc::now();
        let created_by = created_by.into();
        let workspace = Workspace {
            workspace_id: Uuid::new_v4(),
            name: name.into(),
            current_revision: 0,
            created_by: created_by.clone(),
            created_at: now,
            updated_at: now,
        };
        let initial = Revision {
            revision_id: Uuid::new_v4(),
            workspace_id: workspace.workspace_id,
            revision_number: 0,
            plan_id: None,
            kind: RevisionKind::Initial,
            created_by,
            created_at: now,
        };
        Self {
            workspace,
            charts: Vec::new(),
            files: Vec::new(),
            revisions: vec![initial],
            settled: BTreeSet::new(),
            history: ContentHistory::new(),
            removed: Vec::new(),
        }
    }

    // ── Reads ──

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_id(&self) -> Uuid {
        self.workspace.workspace_id
    }

    pub fn current_revision(&self) -> u64 {
        self.workspace.current_revision
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn chart(&self, chart_id: Uuid) -> Option<&Chart> {
        self.charts.iter().find(|c| c.chart_id == chart_id)
    }

    /// All files, chart-owned and loose, in display order.
    pub fn files(&self) -> &[WorkspaceFile] {
        &self.files
    }

    pub fn file(&self, file_id: Uuid) -> Option<&WorkspaceFile> {
        self.files.iter().find(|f| f.file_id == file_id)
    }

    pub fn revisions(&self) -> &[Revision] {
        &self.revisions
    }

    pub fn revision(&self, revision_number: u64) -> Option<&Revision> {
        self.revisions
            .iter()
            .find(|r| r.revision_number == revision_number)
    }

    /// The revision a plan was materialized into, if any.
    pub fn revision_for_plan(&self, plan_id: Uuid) -> Option<&Revision> {
        self.revisions.iter().find(|r| r.plan_id == Some(plan_id))
    }

    /// IDs of files with a patch outstanding at `revision`, in display order.
    pub fn files_pending_at(&self, revision: u64) -> Vec<Uuid> {
        self.files
            .iter()
            .filter(|f| f.is_pending_at(revision))
            .map(|f| f.file_id)
            .collect()
    }

    /// Number of files (chart-owned and loose) still pending at `revision`.
    pub fn pending_count(&self, revision: u64) -> usize {
        self.files.iter().filter(|f| f.is_pending_at(revision)).count()
    }

    pub fn is_settled(&self, revision: u64) -> bool {
        self.settled.contains(&revision)
    }

    pub fn settled_revisions(&self) -> impl Iterator<Item = u64> + '_ {
        self.settled.iter().copied()
    }

    pub fn history(&self) -> &ContentHistory {
        &self.history
    }

    // ── Seeding ──

    /// Add a chart to the workspace.
    pub fn add_chart(&mut self, name: impl Into<String>) -> Chart {
        let chart = Chart {
            chart_id: Uuid::new_v4(),
            workspace_id: self.workspace.workspace_id,
            name: name.into(),
            created_at: Utc::now(),
        };
        self.charts.push(chart.clone());
        self.touch();
        chart
    }

    /// Add a clean file at the current revision and seed its history.
    pub fn add_file(
        &mut self,
        chart_id: Option<Uuid>,
        file_path: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<WorkspaceFile, StoreError> {
        let file_path = file_path.into();
        let content = content.into();

        if let Some(chart_id) = chart_id {
            if self.chart(chart_id).is_none() {
                return Err(StoreError::ChartNotFound {
                    workspace_id: self.workspace.workspace_id,
                    chart_id,
                });
            }
        }
        if self
            .files
            .iter()
            .any(|f| f.chart_id == chart_id && f.file_path == file_path)
        {
            return Err(StoreError::DuplicatePath {
                workspace_id: self.workspace.workspace_id,
                path: file_path,
            });
        }

        let revision = self.workspace.current_revision;
        let file = WorkspaceFile {
            file_id: Uuid::new_v4(),
            workspace_id: self.workspace.workspace_id,
            chart_id,
            file_path,
            content,
            pending_content: None,
            revision_number: revision,
            status: FileStatus::Clean,
            updated_at: Utc::now(),
        };
        self.history.append(ContentEntry::new(
            file.file_id,
            file.chart_id,
            file.file_path.clone(),
            revision,
            Some(file.content.clone()),
            EntryCause::Seeded,
        ))?;
        self.files.push(file.clone());
        self.touch();
        Ok(file)
    }

    // ── Revisions ──

    /// Advance the revision counter and record the new revision.
    pub fn allocate_revision(
        &mut self,
        kind: RevisionKind,
        plan_id: Option<Uuid>,
        created_by: impl Into<String>,
    ) -> Revision {
        self.workspace.current_revision += 1;
        let revision = Revision {
            revision_id: Uuid::new_v4(),
            workspace_id: self.workspace.workspace_id,
            revision_number: self.workspace.current_revision,
            plan_id,
            kind,
            created_by: created_by.into(),
            created_at: Utc::now(),
        };
        self.revisions.push(revision.clone());
        self.touch();
        revision
    }

    /// Record that `revision` has settled. Returns false if it already had.
    pub fn try_mark_settled(&mut self, revision: u64) -> bool {
        self.settled.insert(revision)
    }

    // ── Pending content ──

    /// Attach proposed content to a file at `revision`, replacing any patch
    /// still outstanding from an earlier revision.
    pub fn stamp_pending(
        &mut self,
        file_id: Uuid,
        content: impl Into<String>,
        revision: u64,
    ) -> Result<&WorkspaceFile, StoreError> {
        let file = self.file_mut(file_id)?;
        file.pending_content = Some(content.into());
        file.revision_number = revision;
        file.status = FileStatus::Pending;
        file.updated_at = Utc::now();
        self.touch();
        self.file(file_id).ok_or(StoreError::FileNotFound(file_id))
    }

    /// Promote pending content to confirmed content and record it in history.
    pub fn confirm_pending(&mut self, file_id: Uuid) -> Result<WorkspaceFile, StoreError> {
        let file = self.file_mut(file_id)?;
        let pending = file
            .pending_content
            .take()
            .ok_or(StoreError::NotPending(file_id))?;
        file.content = pending;
        file.status = FileStatus::Clean;
        file.updated_at = Utc::now();
        let confirmed = file.clone();

        self.history.append(ContentEntry::new(
            confirmed.file_id,
            confirmed.chart_id,
            confirmed.file_path.clone(),
            confirmed.revision_number,
            Some(confirmed.content.clone()),
            EntryCause::Accepted,
        ))?;
        self.touch();
        Ok(confirmed)
    }

    /// Drop pending content, leaving confirmed content and revision unchanged.
    pub fn discard_pending(&mut self, file_id: Uuid) -> Result<WorkspaceFile, StoreError> {
        let file = self.file_mut(file_id)?;
        if file.pending_content.take().is_none() {
            return Err(StoreError::NotPending(file_id));
        }
        file.status = FileStatus::Clean;
        file.updated_at = Utc::now();
        let discarded = file.clone();
        self.touch();
        Ok(discarded)
    }

    /// Drop every outstanding patch in the workspace. Returns how many were dropped.
    pub fn discard_all_pending(&mut self) -> usize {
        let now = Utc::now();
        let mut dropped = 0;
        for file in self.files.iter_mut().filter(|f| f.is_pending()) {
            file.pending_content = None;
            file.status = FileStatus::Clean;
            file.updated_at = now;
            dropped += 1;
        }
        if dropped > 0 {
            self.touch();
        }
        dropped
    }

    // ── Rollback support ──

    /// Make `entry` the confirmed content of its file at `revision`,
    /// recreating the file from the entry's metadata if it was removed.
    ///
    /// Returns true if anything changed.
    pub fn restore_file(&mut self, entry: &ContentEntry, revision: u64) -> Result<bool, StoreError> {
        let Some(content) = entry.content.clone() else {
            return Err(StoreError::InvariantViolation {
                workspace_id: self.workspace.workspace_id,
                detail: format!("cannot restore file {} from a removal entry", entry.file_id),
            });
        };

        let now = Utc::now();
        match self.files.iter_mut().find(|f| f.file_id == entry.file_id) {
            Some(file) => {
                if file.content == content && file.file_path == entry.file_path {
                    return Ok(false);
                }
                file.content = content.clone();
                file.file_path = entry.file_path.clone();
                file.pending_content = None;
                file.status = FileStatus::Clean;
                file.revision_number = revision;
                file.updated_at = now;
            }
            None => {
                let chart_id = entry.chart_id.filter(|id| self.chart(*id).is_some());
                self.files.push(WorkspaceFile {
                    file_id: entry.file_id,
                    workspace_id: self.workspace.workspace_id,
                    chart_id,
                    file_path: entry.file_path.clone(),
                    content: content.clone(),
                    pending_content: None,
                    revision_number: revision,
                    status: FileStatus::Clean,
                    updated_at: now,
                });
            }
        }

        self.history.append(ContentEntry::new(
            entry.file_id,
            entry.chart_id,
            entry.file_path.clone(),
            revision,
            Some(content),
            EntryCause::RolledBack,
        ))?;
        self.touch();
        Ok(true)
    }

    /// Remove a file and record the removal at `revision`.
    pub fn remove_file(&mut self, file_id: Uuid, revision: u64) -> Result<WorkspaceFile, StoreError> {
        let index = self
            .files
            .iter()
            .position(|f| f.file_id == file_id)
            .ok_or(StoreError::FileNotFound(file_id))?;
        let file = self.files.remove(index);
        self.history.append(ContentEntry::new(
            file.file_id,
            file.chart_id,
            file.file_path.clone(),
            revision,
            None,
            EntryCause::Removed,
        ))?;
        self.removed.push(file_id);
        self.touch();
        Ok(file)
    }

    // ── Invariants ──

    /// Check the per-file invariants: pending content is present iff the
    /// file is pending, and no file is stamped past the workspace revision.
    pub fn check_invariants(&self) -> Result<(), StoreError> {
        let current = self.workspace.current_revision;
        for file in &self.files {
            if file.is_pending() != file.pending_content.is_some() {
                return Err(self.violation(format!(
                    "file {} has status {} but pending content present = {}",
                    file.file_id,
                    file.status,
                    file.pending_content.is_some()
                )));
            }
            if file.revision_number > current {
                return Err(self.violation(format!(
                    "file {} stamped at revision {} beyond workspace revision {}",
                    file.file_id, file.revision_number, current
                )));
            }
            if file.is_pending() && file.revision_number != current {
                return Err(self.violation(format!(
                    "file {} left pending at revision {} behind workspace revision {}",
                    file.file_id, file.revision_number, current
                )));
            }
        }
        Ok(())
    }

    // ── Store plumbing ──

    pub(crate) fn attach_history(&mut self, history: ContentHistory) {
        self.history = history;
    }

    pub(crate) fn commit_history(&mut self) {
        self.history.commit();
    }

    pub(crate) fn take_removed(&mut self) -> Vec<Uuid> {
        std::mem::take(&mut self.removed)
    }

    fn file_mut(&mut self, file_id: Uuid) -> Result<&mut WorkspaceFile, StoreError> {
        self.files
            .iter_mut()
            .find(|f| f.file_id == file_id)
            .ok_or(StoreError::FileNotFound(file_id))
    }

    fn touch(&mut self) {
        self.workspace.updated_at = Utc::now();
    }

    fn violation(&self, detail: String) -> StoreError {
        StoreError::InvariantViolation {
            workspace_id: self.workspace.workspace_id,
            detail,
        }
    }
}
