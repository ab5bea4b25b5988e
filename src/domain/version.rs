//! Immutable version snapshots.
//!
//! A [`VersionRecord`] captures an entity's field values at the moment a
//! mutation was committed. Records are parametric over the field payload so
//! requirements and test cases share one snapshot shape, one log, and one
//! comparator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ids::{UserId, VersionId},
    requirement::RequirementFields,
    test_case::TestCaseFields,
};

/// A snapshot of requirement fields.
pub type RequirementVersion = VersionRecord<RequirementFields>;

/// A snapshot of test-case fields.
pub type TestCaseVersion = VersionRecord<TestCaseFields>;

/// An immutable snapshot of an entity's fields.
///
/// Records are created once per committed mutation and never updated. Per
/// entity, version numbers are gap-free and start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord<F> {
    pub(crate) id: VersionId,
    pub(crate) entity_id: i64,
    pub(crate) version: u32,
    pub(crate) fields: F,
    pub(crate) modified_by: UserId,
    pub(crate) modified_at: DateTime<Utc>,
}

impl<F> VersionRecord<F> {
    /// The record's own identifier, unique within its log.
    #[must_use]
    pub const fn id(&self) -> VersionId {
        self.id
    }

    /// The raw identifier of the owning entity.
    #[must_use]
    pub const fn entity_id(&self) -> i64 {
        self.entity_id
    }

    /// The snapshot's version number.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// The captured field values.
    #[must_use]
    pub const fn fields(&self) -> &F {
        &self.fields
    }

    /// The user whose mutation produced this snapshot.
    #[must_use]
    pub const fn modified_by(&self) -> UserId {
        self.modified_by
    }

    /// When the mutation was committed.
    #[must_use]
    pub const fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }
}
