//! Test-case domain model.
//!
//! Test cases follow the same snapshot pattern as requirements: the mutable
//! content lives in [`TestCaseFields`], which is also the payload of each
//! version record. Steps are serialized to a single numbered listing for
//! change tracking, so a reordered or edited step shows up as one Modified
//! entry on the `Steps` field.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ids::{TestCaseId, UserId},
    redline::Tracked,
};

/// A single step of a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    /// The action the tester performs. Must not be empty or blank.
    pub action: String,
    /// The expected observation for this step, if any.
    pub expected: Option<String>,
}

/// The mutable content of a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseFields {
    /// Short title. Must not be empty or blank.
    pub title: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Ordered execution steps.
    pub steps: Vec<TestStep>,
    /// Overall expected result of the case.
    pub expected_result: Option<String>,
}

impl TestCaseFields {
    /// Renders the steps as a numbered listing for change tracking.
    ///
    /// Returns `None` when there are no steps, so an empty step list
    /// compares as an absent field.
    #[must_use]
    pub fn serialized_steps(&self) -> Option<String> {
        if self.steps.is_empty() {
            return None;
        }

        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = write!(out, "{}. {}", i + 1, step.action);
            if let Some(expected) = &step.expected {
                let _ = write!(out, " => {expected}");
            }
        }
        Some(out)
    }
}

impl Tracked for TestCaseFields {
    fn tracked_fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("Title", Some(self.title.clone())),
            ("Description", self.description.clone()),
            ("Steps", self.serialized_steps()),
            ("ExpectedResult", self.expected_result.clone()),
        ]
    }
}

/// A live test-case row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub(crate) id: TestCaseId,
    pub(crate) fields: TestCaseFields,
    pub(crate) version: u32,
    pub(crate) created_by: UserId,
    pub(crate) created: DateTime<Utc>,
    pub(crate) updated: Option<DateTime<Utc>>,
}

impl TestCase {
    /// The test case's identifier.
    #[must_use]
    pub const fn id(&self) -> TestCaseId {
        self.id
    }

    /// The current field values.
    #[must_use]
    pub const fn fields(&self) -> &TestCaseFields {
        &self.fields
    }

    /// The live version counter.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// The user who created the test case.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// When the test case was created.
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// When the test case was last updated, if ever.
    #[must_use]
    pub const fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }
}

/// Input for creating a test case.
#[derive(Debug, Clone)]
pub struct TestCaseDraft {
    /// Initial field values.
    pub fields: TestCaseFields,
    /// The creating user.
    pub created_by: UserId,
}

/// Input for updating a test case.
#[derive(Debug, Clone)]
pub struct TestCaseUpdate {
    /// New field values.
    pub fields: TestCaseFields,
    /// The updating user.
    pub modified_by: UserId,
    /// Optimistic concurrency token, as for requirements.
    pub expected_version: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields_with_steps(steps: Vec<TestStep>) -> TestCaseFields {
        TestCaseFields {
            title: "Login works".to_string(),
            description: None,
            steps,
            expected_result: Some("User lands on dashboard".to_string()),
        }
    }

    #[test]
    fn empty_step_list_serializes_as_absent() {
        assert_eq!(fields_with_steps(Vec::new()).serialized_steps(), None);
    }

    #[test]
    fn steps_serialize_as_numbered_listing() {
        let fields = fields_with_steps(vec![
            TestStep {
                action: "Open the login page".to_string(),
                expected: None,
            },
            TestStep {
                action: "Submit valid credentials".to_string(),
                expected: Some("Redirect to dashboard".to_string()),
            },
        ]);

        assert_eq!(
            fields.serialized_steps().unwrap(),
            "1. Open the login page\n2. Submit valid credentials => Redirect to dashboard"
        );
    }

    #[test]
    fn tracked_fields_are_in_declared_order() {
        let names: Vec<_> = fields_with_steps(Vec::new())
            .tracked_fields()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["Title", "Description", "Steps", "ExpectedResult"]);
    }
}
