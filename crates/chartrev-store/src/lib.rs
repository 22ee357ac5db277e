//! # chartrev-store
//!
//! The File Store: confirmed and pending content for every file in a
//! workspace, plus the workspace's revision counter, revision records and
//! settle markers.
//!
//! ## Key components
//!
//! - [`WorkspaceState`] — everything belonging to one workspace. It is the
//!   unit of atomicity: every mutation happens on a whole `WorkspaceState`.
//! - [`FileStore`] — holds one lock per workspace and runs copy-on-write
//!   transactions ([`FileStore::transact`]) so callers can check and mutate
//!   state as a single step.
//! - [`StateBackend`] — persistence seam. [`JsonFileBackend`] writes a JSON
//!   snapshot per workspace and appends content history to a JSONL log.
//!   Without a backend the store lives in memory only.

pub mod backend;
pub mod error;
pub mod model;
pub mod state;
pub mod store;

pub use backend::{JsonFileBackend, StateBackend};
pub use error::StoreError;
pub use model::{Chart, FileStatus, Revision, RevisionKind, Workspace, WorkspaceFile};
pub use state::WorkspaceState;
pub use store::FileStore;
