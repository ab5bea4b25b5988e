//! Requirement and Test-Case Version History
//!
//! Every mutation of a requirement or test case appends an immutable
//! snapshot to an append-only version log. Two snapshots of the same entity
//! can be compared field-by-field to produce a "redline" — an ordered list
//! of Added / Removed / Modified changes.

pub mod domain;
pub use domain::{
    Config, FieldChange, HierarchyError, RedlineResult, Requirement, RequirementFields, TestCase,
    TestCaseFields, VersionRecord,
};

/// Read-only version queries and their serializable DTOs.
pub mod api;
pub use api::{QueryError, VersionQueries};

/// In-memory workspace, mutation service, and filesystem persistence.
pub mod storage;
pub use storage::{CreateError, Directory, UpdateError, ValidationError, Workspace};
