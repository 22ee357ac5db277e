//! # chartrev-queue
//!
//! The outbound work-queue capability.
//!
//! The engine submits one [`ReindexJob`] per file when a revision settles.
//! It depends only on the [`WorkQueue`] trait; the transport behind it is
//! assumed to deliver at least once, so job handlers must be idempotent.
//!
//! - [`MemoryQueue`] keeps jobs in memory for inspection.
//! - [`JsonlQueue`] appends jobs to an outbox file for an external relay.

pub mod error;
pub mod job;
pub mod queue;

pub use error::QueueError;
pub use job::{QueuedJob, ReindexJob, REINDEX_JOB_KIND};
pub use queue::{JsonlQueue, MemoryQueue, WorkQueue};
