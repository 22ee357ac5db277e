// history.rs — In-memory content timeline for one workspace.
//
// ContentHistory is the event-sourced view rollback depends on. It holds the
// ordered entries and the hash of the last one, so newly appended entries
// link to the chain exactly the way ContentLog writes them to disk.
//
// Committed entries sit behind an Arc and are shared by every clone. New
// entries go to a staging list until `commit` folds them in, so cloning a
// history for a draft transaction costs the staged entries only.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::entry::{ContentEntry, EntryCause};
use crate::error::HistoryError;
use crate::hasher;

/// Ordered, append-only content history for a single workspace.
#[derive(Debug, Clone, Default)]
pub struct ContentHistory {
    committed: Arc<Vec<ContentEntry>>,
    staged: Vec<ContentEntry>,
    /// Hash of the last entry's JSON; the `previous_hash` of the next one.
    last_hash: Option<String>,
}

impl ContentHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from entries read back from a [`crate::ContentLog`].
    ///
    /// The chain head is recomputed from the last entry so subsequent appends
    /// link correctly. The entries count as committed.
    pub fn from_entries(entries: Vec<ContentEntry>) -> Result<Self, HistoryError> {
        let last_hash = match entries.last() {
            Some(last) => Some(hasher::hash_str(&serde_json::to_string(last)?)),
            None => None,
        };
        Ok(Self {
            committed: Arc::new(entries),
            staged: Vec::new(),
            last_hash,
        })
    }

    /// Stage an entry, linking it to the current chain head.
    pub fn append(&mut self, mut entry: ContentEntry) -> Result<&ContentEntry, HistoryError> {
        entry.previous_hash = self.last_hash.clone();
        let json = serde_json::to_string(&entry)?;
        self.last_hash = Some(hasher::hash_str(&json));
        let index = self.staged.len();
        self.staged.push(entry);
        Ok(&self.staged[index])
    }

    /// Entries appended since the last [`commit`](Self::commit).
    pub fn staged(&self) -> &[ContentEntry] {
        &self.staged
    }

    /// Fold staged entries into the committed list.
    ///
    /// Copies the committed list only while another clone still shares it;
    /// call this once the previous owner has been dropped.
    pub fn commit(&mut self) {
        if self.staged.is_empty() {
            return;
        }
        Arc::make_mut(&mut self.committed).append(&mut self.staged);
    }

    /// The content a file held as of `target`: the latest appended entry for
    /// the file whose revision is at or before `target`.
    ///
    /// Returns None when the file has no entry at or before `target` (it did
    /// not exist yet). A returned removal entry means it had been removed.
    pub fn as_of(&self, file_id: Uuid, target: u64) -> Option<&ContentEntry> {
        self.entries()
            .rev()
            .find(|e| e.file_id == file_id && e.revision_number <= target)
    }

    /// The most recent entry for a file, regardless of revision.
    pub fn latest(&self, file_id: Uuid) -> Option<&ContentEntry> {
        self.entries().rev().find(|e| e.file_id == file_id)
    }

    /// Every file the history has ever seen, in first-seen order.
    pub fn file_ids(&self) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        self.entries()
            .filter(|e| seen.insert(e.file_id))
            .map(|e| e.file_id)
            .collect()
    }

    /// All entries for one file, oldest first.
    pub fn entries_for(&self, file_id: Uuid) -> Vec<&ContentEntry> {
        self.entries().filter(|e| e.file_id == file_id).collect()
    }

    /// Whether any entry with the given cause was recorded at `revision`.
    pub fn has_cause_at(&self, revision: u64, cause: EntryCause) -> bool {
        self.entries()
            .any(|e| e.revision_number == revision && e.cause == cause)
    }

    /// All entries, committed then staged, oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &ContentEntry> + '_ {
        self.committed.iter().chain(self.staged.iter())
    }

    /// Hash of the last entry, if any.
    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    pub fn len(&self) -> usize {
        self.committed.len() + self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(file_id: Uuid, revision: u64, content: Option<&str>, cause: EntryCause) -> ContentEntry {
        ContentEntry::new(
            file_id,
            None,
            "values.yaml",
            revision,
            content.map(str::to_string),
            cause,
        )
    }

    #[test]
    fn as_of_selects_latest_entry_at_or_before_target() {
        let file = Uuid::new_v4();
        let mut history = ContentHistory::new();
        history.append(entry(file, 0, Some("v0"), EntryCause::Seeded)).unwrap();
        history.append(entry(file, 2, Some("v2"), EntryCause::Accepted)).unwrap();
        history.append(entry(file, 5, Some("v5"), EntryCause::Accepted)).unwrap();

        assert_eq!(history.as_of(file, 0).unwrap().content.as_deref(), Some("v0"));
        assert_eq!(history.as_of(file, 1).unwrap().content.as_deref(), Some("v0"));
        assert_eq!(history.as_of(file, 4).unwrap().content.as_deref(), Some("v2"));
        assert_eq!(history.as_of(file, 9).unwrap().content.as_deref(), Some("v5"));
    }

    #[test]
    fn as_of_before_creation_is_none() {
        let file = Uuid::new_v4();
        let mut history = ContentHistory::new();
        history.append(entry(file, 3, Some("late"), EntryCause::Seeded)).unwrap();

        assert!(history.as_of(file, 2).is_none());
        assert!(history.as_of(file, 3).is_some());
    }

    #[test]
    fn later_append_at_same_revision_wins() {
        let file = Uuid::new_v4();
        let mut history = ContentHistory::new();
        history.append(entry(file, 1, Some("first"), EntryCause::Seeded)).unwrap();
        history.append(entry(file, 1, Some("second"), EntryCause::Accepted)).unwrap();

        assert_eq!(history.as_of(file, 1).unwrap().content.as_deref(), Some("second"));
    }

    #[test]
    fn append_links_previous_hash() {
        let file = Uuid::new_v4();
        let mut history = ContentHistory::new();
        let first_prev = history
            .append(entry(file, 0, Some("a"), EntryCause::Seeded))
            .unwrap()
            .previous_hash
            .clone();
        assert!(first_prev.is_none());

        let head = history.last_hash().unwrap().to_string();
        let second = history
            .append(entry(file, 1, Some("b"), EntryCause::Accepted))
            .unwrap();
        assert_eq!(second.previous_hash.as_deref(), Some(head.as_str()));
    }

    #[test]
    fn from_entries_restores_chain_head() {
        let file = Uuid::new_v4();
        let mut original = ContentHistory::new();
        original.append(entry(file, 0, Some("a"), EntryCause::Seeded)).unwrap();
        original.append(entry(file, 1, Some("b"), EntryCause::Accepted)).unwrap();

        let rebuilt = ContentHistory::from_entries(original.entries().cloned().collect()).unwrap();
        assert_eq!(rebuilt.last_hash(), original.last_hash());
        assert_eq!(rebuilt.len(), 2);
    }

    #[test]
    fn file_ids_are_in_first_seen_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut history = ContentHistory::new();
        history.append(entry(a, 0, Some("a"), EntryCause::Seeded)).unwrap();
        history.append(entry(b, 0, Some("b"), EntryCause::Seeded)).unwrap();
        history.append(entry(a, 1, Some("a2"), EntryCause::Accepted)).unwrap();

        assert_eq!(history.file_ids(), vec![a, b]);
        assert_eq!(history.entries_for(a).len(), 2);
    }

    #[test]
    fn has_cause_at_spans_committed_and_staged() {
        let file = Uuid::new_v4();
        let mut history = ContentHistory::new();
        history.append(entry(file, 0, Some("a"), EntryCause::Seeded)).unwrap();
        history.commit();
        history.append(entry(file, 2, Some("b"), EntryCause::Accepted)).unwrap();

        assert!(history.has_cause_at(0, EntryCause::Seeded));
        assert!(history.has_cause_at(2, EntryCause::Accepted));
        assert!(!history.has_cause_at(0, EntryCause::Accepted));
        assert_eq!(history.staged().len(), 1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn clones_share_committed_entries() {
        let file = Uuid::new_v4();
        let mut live = ContentHistory::new();
        live.append(entry(file, 0, Some("a"), EntryCause::Seeded)).unwrap();
        live.commit();
        assert!(live.staged().is_empty());

        let mut draft = live.clone();
        assert!(Arc::ptr_eq(&live.committed, &draft.committed));
        draft.append(entry(file, 1, Some("b"), EntryCause::Accepted)).unwrap();

        // The live copy never sees the draft's staged entry.
        assert_eq!(live.len(), 1);
        assert_eq!(draft.staged().len(), 1);

        drop(live);
        draft.commit();
        assert!(draft.staged().is_empty());
        assert_eq!(draft.as_of(file, 1).unwrap().content.as_deref(), Some("b"));
        assert_eq!(draft.entries().count(), 2);
    }
}
