// entry.rs — ContentEntry: one point in a file's content timeline.
//
// An entry says "as of revision N, file F had content C" (or, when `content`
// is None, "as of revision N, file F did not exist"). Entries carry the file's
// path and chart so a removed file can be recreated by a later rollback.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hasher;

/// Why an entry was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryCause {
    /// File created with initial content (import, upload, manual seeding).
    Seeded,
    /// A pending patch was accepted and became the confirmed content.
    Accepted,
    /// Content restored by a rollback to an earlier revision.
    RolledBack,
    /// File removed because it did not exist as of a rollback target.
    Removed,
}

impl fmt::Display for EntryCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryCause::Seeded => write!(f, "seeded"),
            EntryCause::Accepted => write!(f, "accepted"),
            EntryCause::RolledBack => write!(f, "rolled_back"),
            EntryCause::Removed => write!(f, "removed"),
        }
    }
}

/// A single record in a workspace's content history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Unique identifier for this entry.
    pub entry_id: Uuid,

    /// The file this entry describes.
    pub file_id: Uuid,

    /// Owning chart, or None for a loose workspace file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_id: Option<Uuid>,

    /// Path of the file at the time the entry was recorded.
    pub file_path: String,

    /// Revision at which this content became confirmed.
    pub revision_number: u64,

    /// Confirmed content, or None when the file was removed.
    pub content: Option<String>,

    /// What produced this entry.
    pub cause: EntryCause,

    /// SHA-256 of `content` (None for removals).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    /// Hash of the previous entry's JSON line, forming the chain.
    #[serde(default)]
    pub previous_hash: Option<String>,

    /// When this entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl ContentEntry {
    /// Create a new entry. `previous_hash` is filled in when the entry is
    /// appended to a [`crate::ContentHistory`].
    pub fn new(
        file_id: Uuid,
        chart_id: Option<Uuid>,
        file_path: impl Into<String>,
        revision_number: u64,
        content: Option<String>,
        cause: EntryCause,
    ) -> Self {
        let content_hash = content.as_deref().map(hasher::hash_str);
        Self {
            entry_id: Uuid::new_v4(),
            file_id,
            chart_id,
            file_path: file_path.into(),
            revision_number,
            content,
            cause,
            content_hash,
            previous_hash: None,
            recorded_at: Utc::now(),
        }
    }

    /// True if this entry records that the file stopped existing.
    pub fn is_removal(&self) -> bool {
        self.content.is_none()
    }

    /// Verify the content hash matches the stored content.
    pub fn verify_content_hash(&self) -> bool {
        self.content.as_deref().map(hasher::hash_str) == self.content_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_hashes_content() {
        let entry = ContentEntry::new(
            Uuid::new_v4(),
            None,
            "templates/deployment.yaml",
            3,
            Some("kind: Deployment".into()),
            EntryCause::Accepted,
        );
        assert_eq!(entry.content_hash.as_ref().map(String::len), Some(64));
        assert!(entry.verify_content_hash());
        assert!(!entry.is_removal());
    }

    #[test]
    fn removal_has_no_content_hash() {
        let entry = ContentEntry::new(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            "NOTES.txt",
            5,
            None,
            EntryCause::Removed,
        );
        assert!(entry.is_removal());
        assert!(entry.content_hash.is_none());
        assert!(entry.verify_content_hash());
    }

    #[test]
    fn tampered_content_fails_verification() {
        let mut entry = ContentEntry::new(
            Uuid::new_v4(),
            None,
            "values.yaml",
            1,
            Some("a".into()),
            EntryCause::Seeded,
        );
        entry.content = Some("b".into());
        assert!(!entry.verify_content_hash());
    }

    #[test]
    fn cause_serializes_as_snake_case() {
        let json = serde_json::to_string(&EntryCause::RolledBack).unwrap();
        assert_eq!(json, "\"rolled_back\"");
        assert_eq!(EntryCause::RolledBack.to_string(), "rolled_back");
    }
}
