//! Domain models for requirement and test-case versioning.
//!
//! This module contains the live entity types, their immutable version
//! snapshots, the hierarchy validator, and the redline comparator.

mod config;
pub use config::Config;

/// Strongly typed entity identifiers.
pub mod ids;
pub use ids::{RequirementId, TestCaseId, UserId, VersionId};

/// Requirement domain model.
pub mod requirement;
pub use requirement::{Requirement, RequirementDraft, RequirementFields, RequirementUpdate};

/// Test-case domain model.
pub mod test_case;
pub use test_case::{TestCase, TestCaseDraft, TestCaseFields, TestCaseUpdate, TestStep};

/// Immutable version snapshots.
pub mod version;
pub use version::{RequirementVersion, TestCaseVersion, VersionRecord};

/// Field-level comparison of version snapshots.
pub mod redline;
pub use redline::{ChangeType, FieldChange, RedlineResult, Tracked};

/// Parent/child hierarchy validation.
pub mod hierarchy;
pub use hierarchy::HierarchyError;
