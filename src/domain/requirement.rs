//! Requirement domain model.
//!
//! A [`Requirement`] is a live, mutable entity. Its mutable content lives in
//! [`RequirementFields`], which doubles as the payload of its version
//! snapshots — the same shape is persisted in the live row and in every
//! record of the version log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ids::{RequirementId, UserId},
    redline::Tracked,
};

/// The kind of a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementKind {
    /// Customer requirement specification.
    Crs,
    /// Product requirement specification.
    Prs,
    /// Software requirement specification.
    Srs,
    /// User story.
    UserStory,
    /// Business rule.
    BusinessRule,
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Crs => "CRS",
            Self::Prs => "PRS",
            Self::Srs => "SRS",
            Self::UserStory => "User Story",
            Self::BusinessRule => "Business Rule",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for RequirementKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace([' ', '-', '_'], "").as_str() {
            "crs" => Ok(Self::Crs),
            "prs" => Ok(Self::Prs),
            "srs" => Ok(Self::Srs),
            "userstory" => Ok(Self::UserStory),
            "businessrule" => Ok(Self::BusinessRule),
            _ => Err(ParseEnumError {
                value: s.to_string(),
                expected: "CRS, PRS, SRS, user-story, business-rule",
            }),
        }
    }
}

/// The workflow status of a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RequirementStatus {
    /// Initial state of every new requirement.
    #[default]
    Draft,
    /// Reviewed and approved.
    Approved,
    /// Implemented in the system under development.
    Implemented,
    /// Implementation verified by test.
    Verified,
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Draft => "Draft",
            Self::Approved => "Approved",
            Self::Implemented => "Implemented",
            Self::Verified => "Verified",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for RequirementStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "approved" => Ok(Self::Approved),
            "implemented" => Ok(Self::Implemented),
            "verified" => Ok(Self::Verified),
            _ => Err(ParseEnumError {
                value: s.to_string(),
                expected: "draft, approved, implemented, verified",
            }),
        }
    }
}

/// Error returned when parsing an enum value from the CLI boundary.
#[derive(Debug, thiserror::Error)]
#[error("unrecognised value '{value}' (expected one of: {expected})")]
pub struct ParseEnumError {
    value: String,
    expected: &'static str,
}

/// The mutable content of a requirement.
///
/// This is both the live state and the payload of each version snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementFields {
    /// Short title. Must not be empty or blank.
    pub title: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Workflow status.
    pub status: RequirementStatus,
    /// Requirement kind.
    pub kind: RequirementKind,
    /// Parent requirement, if any. The parent chain must stay acyclic.
    pub parent: Option<RequirementId>,
}

impl Tracked for RequirementFields {
    fn tracked_fields(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("Title", Some(self.title.clone())),
            ("Description", self.description.clone()),
            // Enums compare by display name, not discriminant.
            ("Status", Some(self.status.to_string())),
            ("Type", Some(self.kind.to_string())),
        ]
    }
}

/// A live requirement row.
///
/// Constructed only by the workspace, which guarantees that the version
/// counter always equals the highest version number in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub(crate) id: RequirementId,
    pub(crate) fields: RequirementFields,
    pub(crate) version: u32,
    pub(crate) created_by: UserId,
    pub(crate) created: DateTime<Utc>,
    pub(crate) updated: Option<DateTime<Utc>>,
}

impl Requirement {
    /// The requirement's identifier.
    #[must_use]
    pub const fn id(&self) -> RequirementId {
        self.id
    }

    /// The current field values.
    #[must_use]
    pub const fn fields(&self) -> &RequirementFields {
        &self.fields
    }

    /// The live version counter.
    ///
    /// Equal to the number of snapshots in the version log for this
    /// requirement.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// The user who created the requirement.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// When the requirement was created.
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// When the requirement was last updated, if ever.
    #[must_use]
    pub const fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }
}

/// Input for creating a requirement.
#[derive(Debug, Clone)]
pub struct RequirementDraft {
    /// Initial field values.
    pub fields: RequirementFields,
    /// The creating user.
    pub created_by: UserId,
}

/// Input for updating a requirement.
///
/// Carries the complete new state; unchanged fields are passed through
/// unchanged by the caller.
#[derive(Debug, Clone)]
pub struct RequirementUpdate {
    /// New field values.
    pub fields: RequirementFields,
    /// The updating user.
    pub modified_by: UserId,
    /// Optimistic concurrency token. When present, the update is rejected
    /// unless it matches the live version counter.
    pub expected_version: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_displays_by_name() {
        assert_eq!(RequirementKind::Srs.to_string(), "SRS");
        assert_eq!(RequirementKind::UserStory.to_string(), "User Story");
    }

    #[test]
    fn kind_parses_loosely() {
        assert_eq!(
            "user-story".parse::<RequirementKind>().unwrap(),
            RequirementKind::UserStory
        );
        assert_eq!("CRS".parse::<RequirementKind>().unwrap(), RequirementKind::Crs);
        assert!("widget".parse::<RequirementKind>().is_err());
    }

    #[test]
    fn status_round_trips_through_display() {
        for status in [
            RequirementStatus::Draft,
            RequirementStatus::Approved,
            RequirementStatus::Implemented,
            RequirementStatus::Verified,
        ] {
            let parsed: RequirementStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn tracked_fields_are_in_declared_order() {
        let fields = RequirementFields {
            title: "Login".to_string(),
            description: None,
            status: RequirementStatus::Draft,
            kind: RequirementKind::Srs,
            parent: None,
        };

        let names: Vec<_> = fields
            .tracked_fields()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["Title", "Description", "Status", "Type"]);
    }
}
