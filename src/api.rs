//! Read-only version queries.
//!
//! [`VersionQueries`] is the surface a thin controller exposes over HTTP:
//! list the versions of an entity, fetch a single version, or compare two.
//! Listings degrade to empty results for unknown entities; point lookups
//! and comparisons report not-found explicitly. All return types serialize
//! to the JSON bodies of the external interface.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    RedlineResult, redline,
    ids::{RequirementId, TestCaseId, UserId, VersionId},
    redline::Tracked,
    requirement::RequirementFields,
    test_case::TestCaseFields,
    version::VersionRecord,
};
use crate::storage::{version_log::VersionLog, workspace::Workspace};

/// Errors raised by point lookups and comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    /// No version record with the given id.
    #[error("version {0} not found")]
    VersionNotFound(VersionId),
    /// The two version records belong to different entities.
    #[error("versions {0} and {1} belong to different entities")]
    EntityMismatch(VersionId, VersionId),
}

/// A serializable view of a version record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionDto<F> {
    /// The record's id.
    pub id: VersionId,
    /// The owning entity's raw id.
    pub entity_id: i64,
    /// The snapshot's version number.
    pub version: u32,
    /// The captured field values.
    pub fields: F,
    /// Who committed the mutation.
    pub modified_by: UserId,
    /// When the mutation was committed.
    pub modified_at: DateTime<Utc>,
}

impl<F: Clone> From<&VersionRecord<F>> for VersionDto<F> {
    fn from(record: &VersionRecord<F>) -> Self {
        Self {
            id: record.id(),
            entity_id: record.entity_id(),
            version: record.version(),
            fields: record.fields().clone(),
            modified_by: record.modified_by(),
            modified_at: record.modified_at(),
        }
    }
}

/// Read-only queries over a workspace's version logs.
#[derive(Debug, Clone, Copy)]
pub struct VersionQueries<'a> {
    workspace: &'a Workspace,
}

impl<'a> VersionQueries<'a> {
    /// Wraps a workspace for querying.
    #[must_use]
    pub const fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// All versions of a requirement, ascending. Empty for unknown ids.
    #[must_use]
    pub fn requirement_versions(&self, id: RequirementId) -> Vec<VersionDto<RequirementFields>> {
        list(self.workspace.requirement_log(), id.raw())
    }

    /// A single requirement version.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::VersionNotFound`] for an unknown record id.
    pub fn requirement_version(
        &self,
        id: VersionId,
    ) -> Result<VersionDto<RequirementFields>, QueryError> {
        get(self.workspace.requirement_log(), id)
    }

    /// Compares two requirement versions.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::VersionNotFound`] when either record id is
    /// unknown, or [`QueryError::EntityMismatch`] when the records belong
    /// to different requirements.
    pub fn requirement_redline(
        &self,
        old: VersionId,
        new: VersionId,
    ) -> Result<RedlineResult, QueryError> {
        compare(self.workspace.requirement_log(), old, new)
    }

    /// All versions of a test case, ascending. Empty for unknown ids.
    #[must_use]
    pub fn test_case_versions(&self, id: TestCaseId) -> Vec<VersionDto<TestCaseFields>> {
        list(self.workspace.test_case_log(), id.raw())
    }

    /// A single test-case version.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::VersionNotFound`] for an unknown record id.
    pub fn test_case_version(
        &self,
        id: VersionId,
    ) -> Result<VersionDto<TestCaseFields>, QueryError> {
        get(self.workspace.test_case_log(), id)
    }

    /// Compares two test-case versions.
    ///
    /// # Errors
    ///
    /// As [`VersionQueries::requirement_redline`].
    pub fn test_case_redline(
        &self,
        old: VersionId,
        new: VersionId,
    ) -> Result<RedlineResult, QueryError> {
        compare(self.workspace.test_case_log(), old, new)
    }
}

fn list<F: Clone>(log: &VersionLog<F>, entity_id: i64) -> Vec<VersionDto<F>> {
    log.for_entity(entity_id).map(VersionDto::from).collect()
}

fn get<F: Clone>(log: &VersionLog<F>, id: VersionId) -> Result<VersionDto<F>, QueryError> {
    log.get(id)
        .map(VersionDto::from)
        .ok_or(QueryError::VersionNotFound(id))
}

fn compare<F: Tracked>(
    log: &VersionLog<F>,
    old: VersionId,
    new: VersionId,
) -> Result<RedlineResult, QueryError> {
    let old_record = log.get(old).ok_or(QueryError::VersionNotFound(old))?;
    let new_record = log.get(new).ok_or(QueryError::VersionNotFound(new))?;

    if old_record.entity_id() != new_record.entity_id() {
        return Err(QueryError::EntityMismatch(old, new));
    }

    Ok(redline::compare(old_record, new_record))
}
