//! # chartrev-plan
//!
//! Plan tracking for chartrev.
//!
//! A [`Plan`] is a proposed changeset for one workspace, tied to the prompt
//! that produced it. The planning agent attaches [`ProposedPatch`]es while the
//! plan is proposed; the revision manager later materializes it into pending
//! content at a new revision. A newer plan may supersede an older, still
//! proposed one, which discards the older plan's patches.
//!
//! Plans are persisted through the [`PlanStore`] trait: [`JsonPlanStore`]
//! writes one JSON file per plan, [`MemoryPlanStore`] keeps them in memory.

pub mod error;
pub mod plan;
pub mod store;
pub mod tracker;

pub use error::PlanError;
pub use plan::{Plan, PlanStatus, ProposedPatch};
pub use store::{JsonPlanStore, MemoryPlanStore, PlanStore};
pub use tracker::PlanTracker;
