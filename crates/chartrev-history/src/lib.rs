//! # chartrev-history
//!
//! Append-only content timeline for chartrev workspaces.
//!
//! Every confirmed change to a file's content (initial seeding, an accepted
//! patch, a rollback restore, a removal) is recorded as a [`ContentEntry`].
//! Entries are never rewritten: rollback reconstructs the content a file
//! held "as of" an earlier revision by selecting the latest entry at or
//! before that revision.
//!
//! Entries are linked by `previous_hash` (SHA-256 of the preceding entry's
//! JSON line), so a persisted [`ContentLog`] can be checked for tampering.
//!
//! ## Quick Example
//!
//! ```rust
//! use chartrev_history::{ContentEntry, ContentHistory, EntryCause};
//! use uuid::Uuid;
//!
//! let file_id = Uuid::new_v4();
//! let mut history = ContentHistory::new();
//! history
//!     .append(ContentEntry::new(file_id, None, "values.yaml", 0, Some("a".into()), EntryCause::Seeded))
//!     .unwrap();
//! history
//!     .append(ContentEntry::new(file_id, None, "values.yaml", 2, Some("b".into()), EntryCause::Accepted))
//!     .unwrap();
//!
//! assert_eq!(history.as_of(file_id, 1).unwrap().content.as_deref(), Some("a"));
//! assert_eq!(history.as_of(file_id, 2).unwrap().content.as_deref(), Some("b"));
//! ```

pub mod entry;
pub mod error;
pub mod hasher;
pub mod history;
pub mod log;

pub use entry::{ContentEntry, EntryCause};
pub use error::HistoryError;
pub use history::ContentHistory;
pub use log::ContentLog;
