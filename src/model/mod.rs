//! Entity schemas for the Lumen data model
//!
//! All identifiers are opaque, globally-unique strings assigned at creation
//! and never reassigned. Every entity implements [`Identified`] so the merge
//! engine can de-duplicate across source tiers.

pub mod identity;
pub mod organization;
pub mod submission;
pub mod task;
pub mod unit;

pub use identity::{Identity, IdentityStatus, ProgressionState, Rank, Role, IDENTITY_COLLECTION};
pub use organization::{Organization, OrganizationStatus, ORGANIZATION_COLLECTION};
pub use submission::{CriterionScore, GradeReport, Submission, SUBMISSION_COLLECTION};
pub use task::{Difficulty, Task, TASK_COLLECTION};
pub use unit::{LearningUnit, NodeKind, UnitCategory, UnitNode, UnitStatus, UNIT_COLLECTION};

/// A record with a stable logical id.
///
/// Once merged, the same logical id never appears twice in a returned
/// collection, regardless of which source tiers contributed it.
pub trait Identified {
    fn id(&self) -> &str;
}
