//! Live entity store and mutation service.
//!
//! The [`Workspace`] owns the live requirements and test cases together
//! with their version logs, and funnels every mutation through a single
//! write path: validate, append a snapshot of the state being committed,
//! then apply it to the live row. The live version counter therefore always
//! equals the highest version number in the log, and a rejected mutation
//! leaves both untouched.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{
        Config,
        hierarchy::{self, HierarchyError},
        ids::{RequirementId, TestCaseId, UserId},
        requirement::{Requirement, RequirementDraft, RequirementFields, RequirementUpdate},
        test_case::{TestCase, TestCaseDraft, TestCaseFields, TestCaseUpdate},
    },
    storage::version_log::VersionLog,
};

/// A mutation rejected before any write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The title was empty or blank.
    #[error("title must not be empty")]
    EmptyTitle,
    /// The acting user id was zero or negative.
    #[error("author id {0} is not a valid user id")]
    InvalidAuthor(UserId),
    /// A test step had an empty action.
    #[error("step {index} has an empty action")]
    EmptyStepAction {
        /// Zero-based index of the offending step.
        index: usize,
    },
}

/// Errors raised by `create_requirement`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateError {
    /// The initial field values failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The initial parent link was rejected.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

/// Errors raised by `update_*` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// No live entity with the given id.
    #[error("entity not found")]
    NotFound,
    /// The new field values failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The proposed parent link was rejected.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    /// The caller's version token did not match the live version.
    #[error("update was based on version {expected}, live version is {actual}")]
    Conflict {
        /// The version the caller based its update on.
        expected: u32,
        /// The current live version.
        actual: u32,
    },
    /// Strict concurrency is enabled and the update carried no token.
    #[error("this workspace requires updates to state the version they are based on")]
    TokenRequired,
}

/// The in-memory store of live entities and their version logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(skip)]
    config: Config,
    requirements: BTreeMap<RequirementId, Requirement>,
    test_cases: BTreeMap<TestCaseId, TestCase>,
    requirement_log: VersionLog<RequirementFields>,
    test_case_log: VersionLog<TestCaseFields>,
    next_requirement_id: i64,
    next_test_case_id: i64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            config: Config::default(),
            requirements: BTreeMap::new(),
            test_cases: BTreeMap::new(),
            requirement_log: VersionLog::default(),
            test_case_log: VersionLog::default(),
            next_requirement_id: 1,
            next_test_case_id: 1,
        }
    }
}

impl Workspace {
    /// Creates an empty workspace with the given configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The workspace configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the workspace configuration.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Looks up a live requirement.
    #[must_use]
    pub fn requirement(&self, id: RequirementId) -> Option<&Requirement> {
        self.requirements.get(&id)
    }

    /// All live requirements in id order.
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.values()
    }

    /// Looks up a live test case.
    #[must_use]
    pub fn test_case(&self, id: TestCaseId) -> Option<&TestCase> {
        self.test_cases.get(&id)
    }

    /// All live test cases in id order.
    pub fn test_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.test_cases.values()
    }

    /// The requirement version log.
    #[must_use]
    pub const fn requirement_log(&self) -> &VersionLog<RequirementFields> {
        &self.requirement_log
    }

    /// The test-case version log.
    #[must_use]
    pub const fn test_case_log(&self) -> &VersionLog<TestCaseFields> {
        &self.test_case_log
    }

    /// Creates a requirement and records its initial snapshot (version 1).
    ///
    /// The hierarchy check runs against the id about to be assigned, so a
    /// draft cannot name itself as parent or close a cycle through an
    /// existing dangling link to that id.
    ///
    /// # Errors
    ///
    /// Returns a [`CreateError`] — and writes nothing, not even the id —
    /// when the title is blank, the author id is invalid, or the proposed
    /// parent link would form a cycle.
    pub fn create_requirement(
        &mut self,
        draft: RequirementDraft,
    ) -> Result<Requirement, CreateError> {
        validate_requirement(&draft.fields, draft.created_by)?;

        let id = RequirementId::new(self.next_requirement_id);
        if let Some(parent) = draft.fields.parent {
            hierarchy::check_reparent(id, parent, |r| {
                self.requirements.get(&r).and_then(|req| req.fields.parent)
            })?;
        }
        self.next_requirement_id += 1;

        let now = Utc::now();
        let requirement = Requirement {
            id,
            fields: draft.fields,
            version: 1,
            created_by: draft.created_by,
            created: now,
            updated: None,
        };

        self.requirement_log
            .append(id.raw(), 1, requirement.fields.clone(), draft.created_by, now);
        self.requirements.insert(id, requirement.clone());

        tracing::info!("created requirement {id} at version 1");
        Ok(requirement)
    }

    /// Updates a requirement, appending a snapshot of the new state.
    ///
    /// The snapshot carries version `live + 1`; on success the live counter
    /// is bumped to match and `updated` is stamped.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::NotFound`] for an unknown id, a validation or
    /// hierarchy error when the new state is rejected, or a conflict when
    /// the caller's version token is stale. No write occurs on any failure.
    pub fn update_requirement(
        &mut self,
        id: RequirementId,
        update: RequirementUpdate,
    ) -> Result<Requirement, UpdateError> {
        let live_version = self
            .requirements
            .get(&id)
            .map(Requirement::version)
            .ok_or(UpdateError::NotFound)?;

        validate_requirement(&update.fields, update.modified_by)?;
        self.check_version_token(live_version, update.expected_version)?;

        if let Some(parent) = update.fields.parent {
            hierarchy::check_reparent(id, parent, |r| {
                self.requirements.get(&r).and_then(|req| req.fields.parent)
            })?;
        }

        let next_version = live_version + 1;
        let now = Utc::now();
        self.requirement_log.append(
            id.raw(),
            next_version,
            update.fields.clone(),
            update.modified_by,
            now,
        );

        let live = self.requirements.get_mut(&id).ok_or(UpdateError::NotFound)?;
        live.fields = update.fields;
        live.version = next_version;
        live.updated = Some(now);

        tracing::info!("updated requirement {id} to version {next_version}");
        Ok(live.clone())
    }

    /// Deletes a requirement and cascades its version records.
    ///
    /// Children keep their (now dangling) parent id; the hierarchy walk
    /// treats an unknown parent as a chain end. Returns `false` when the id
    /// was unknown.
    pub fn delete_requirement(&mut self, id: RequirementId) -> bool {
        if self.requirements.remove(&id).is_none() {
            return false;
        }

        let removed = self.requirement_log.remove_entity(id.raw());
        tracing::info!("deleted requirement {id} and {removed} version records");
        true
    }

    /// Creates a test case and records its initial snapshot (version 1).
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] — and writes nothing — when the title
    /// is blank, the author id is invalid, or a step action is empty.
    pub fn create_test_case(&mut self, draft: TestCaseDraft) -> Result<TestCase, ValidationError> {
        validate_test_case(&draft.fields, draft.created_by)?;

        let id = TestCaseId::new(self.next_test_case_id);
        self.next_test_case_id += 1;

        let now = Utc::now();
        let test_case = TestCase {
            id,
            fields: draft.fields,
            version: 1,
            created_by: draft.created_by,
            created: now,
            updated: None,
        };

        self.test_case_log
            .append(id.raw(), 1, test_case.fields.clone(), draft.created_by, now);
        self.test_cases.insert(id, test_case.clone());

        tracing::info!("created test case {id} at version 1");
        Ok(test_case)
    }

    /// Updates a test case, appending a snapshot of the new state.
    ///
    /// # Errors
    ///
    /// As [`Workspace::update_requirement`], minus hierarchy checks.
    pub fn update_test_case(
        &mut self,
        id: TestCaseId,
        update: TestCaseUpdate,
    ) -> Result<TestCase, UpdateError> {
        let live_version = self
            .test_cases
            .get(&id)
            .map(TestCase::version)
            .ok_or(UpdateError::NotFound)?;

        validate_test_case(&update.fields, update.modified_by)?;
        self.check_version_token(live_version, update.expected_version)?;

        let next_version = live_version + 1;
        let now = Utc::now();
        self.test_case_log.append(
            id.raw(),
            next_version,
            update.fields.clone(),
            update.modified_by,
            now,
        );

        let live = self.test_cases.get_mut(&id).ok_or(UpdateError::NotFound)?;
        live.fields = update.fields;
        live.version = next_version;
        live.updated = Some(now);

        tracing::info!("updated test case {id} to version {next_version}");
        Ok(live.clone())
    }

    /// Deletes a test case and cascades its version records.
    ///
    /// Returns `false` when the id was unknown.
    pub fn delete_test_case(&mut self, id: TestCaseId) -> bool {
        if self.test_cases.remove(&id).is_none() {
            return false;
        }

        let removed = self.test_case_log.remove_entity(id.raw());
        tracing::info!("deleted test case {id} and {removed} version records");
        true
    }

    /// Reports all cycles in the stored requirement hierarchy.
    ///
    /// The single write path never admits a cycle, so anything reported
    /// here was imported or hand-edited on disk.
    #[must_use]
    pub fn audit_hierarchy(&self) -> Vec<Vec<RequirementId>> {
        hierarchy::audit(
            self.requirements
                .values()
                .filter_map(|req| req.fields.parent.map(|parent| (req.id, parent))),
        )
    }

    fn check_version_token(&self, live: u32, expected: Option<u32>) -> Result<(), UpdateError> {
        match expected {
            Some(expected) if expected != live => Err(UpdateError::Conflict {
                expected,
                actual: live,
            }),
            None if self.config.strict_concurrency => Err(UpdateError::TokenRequired),
            _ => Ok(()),
        }
    }
}

fn validate_requirement(fields: &RequirementFields, author: UserId) -> Result<(), ValidationError> {
    if fields.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if !author.is_valid() {
        return Err(ValidationError::InvalidAuthor(author));
    }
    Ok(())
}

fn validate_test_case(fields: &TestCaseFields, author: UserId) -> Result<(), ValidationError> {
    if fields.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if !author.is_valid() {
        return Err(ValidationError::InvalidAuthor(author));
    }
    if let Some(index) = fields
        .steps
        .iter()
        .position(|step| step.action.trim().is_empty())
    {
        return Err(ValidationError::EmptyStepAction { index });
    }
    Ok(())
}
