//! # chartrev-engine
//!
//! Revision and patch reconciliation for chartrev workspaces.
//!
//! Each file in a workspace has confirmed content and, while a patch is
//! outstanding, pending content stamped with the revision that proposed it.
//! This crate owns the transitions between those states:
//!
//! - [`PatchResolver`] — accept or reject one file's patch (with an
//!   optimistic expected-revision check) or every patch of a revision.
//! - [`RevisionManager`] — materialize a [`chartrev_plan::Plan`] into a new
//!   revision, and roll a workspace back to the content of an earlier one.
//! - [`CompletionGate`] — after each resolution, detect the moment nothing
//!   is left pending at the current revision and fan out reindex jobs to the
//!   [`chartrev_queue::WorkQueue`] exactly once per revision.
//! - [`Engine`] — wires the above from an [`EngineConfig`].
//!
//! ## Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chartrev_engine::{Actor, Engine, EngineConfig};
//! use chartrev_plan::PlanTracker;
//! use chartrev_queue::MemoryQueue;
//! use chartrev_store::FileStore;
//!
//! let queue = Arc::new(MemoryQueue::new());
//! let engine = Engine::new(
//!     EngineConfig::for_project("."),
//!     Arc::new(FileStore::in_memory()),
//!     PlanTracker::in_memory(),
//!     queue.clone(),
//! );
//! let alice = Actor::new("alice");
//!
//! let ws = engine.create_workspace("demo", &alice).unwrap().workspace_id;
//! let file = engine.add_file(ws, None, "values.yaml", "replicas: 1").unwrap();
//! let plan = engine.create_plan(&alice, "scale up", ws, None).unwrap();
//! engine.attach_patch(plan.plan_id, file.file_id, "replicas: 3").unwrap();
//!
//! let revision = engine.revisions().create_revision(plan.plan_id, &alice).unwrap();
//! let accepted = engine
//!     .resolver()
//!     .accept_patch(file.file_id, revision.revision_number, &alice)
//!     .unwrap();
//!
//! assert_eq!(accepted.content, "replicas: 3");
//! assert_eq!(queue.len(), 1);
//! ```

pub mod actor;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod resolver;
pub mod revision;

pub use actor::Actor;
pub use config::{EngineConfig, ReindexConfig};
pub use engine::Engine;
pub use error::{EngineError, EntityKind};
pub use gate::{CompletionGate, GateOutcome};
pub use resolver::{PatchResolver, Resolution};
pub use revision::RevisionManager;
