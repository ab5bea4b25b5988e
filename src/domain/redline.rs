//! Field-level comparison of version snapshots ("redline").
//!
//! The comparator walks the tracked fields of two snapshots in their
//! declared order and emits one [`FieldChange`] per differing field. Blank
//! strings count as absent, and enum-valued fields are compared by their
//! display name, so the output reads the way a reviewer would describe the
//! change.

use std::fmt;

use serde::Serialize;

use crate::domain::version::VersionRecord;

/// How a tracked field changed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeType {
    /// The field was absent in the old snapshot and present in the new one.
    Added,
    /// The field was present in the old snapshot and absent in the new one.
    Removed,
    /// The field was present in both snapshots with different values.
    Modified,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Added => "Added",
            Self::Removed => "Removed",
            Self::Modified => "Modified",
        };
        f.write_str(name)
    }
}

/// A single field-level change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    /// Name of the tracked field.
    pub field: &'static str,
    /// The old value, absent for [`ChangeType::Added`].
    pub old: Option<String>,
    /// The new value, absent for [`ChangeType::Removed`].
    pub new: Option<String>,
    /// The kind of change.
    pub change: ChangeType,
}

/// The comparison of two version snapshots of the same entity.
///
/// Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedlineResult {
    /// Version number of the older snapshot.
    pub old_version: u32,
    /// Version number of the newer snapshot.
    pub new_version: u32,
    /// Field changes in declared field order.
    pub changes: Vec<FieldChange>,
}

/// A snapshot payload whose fields participate in redline comparison.
pub trait Tracked {
    /// The tracked fields in their declared order, paired with their string
    /// representation.
    ///
    /// The order must be stable across calls and identical for every value
    /// of the implementing type — the comparator zips two field lists
    /// positionally.
    fn tracked_fields(&self) -> Vec<(&'static str, Option<String>)>;
}

/// Compares two field payloads and returns the changes in declared order.
#[must_use]
pub fn diff<F: Tracked>(old: &F, new: &F) -> Vec<FieldChange> {
    old.tracked_fields()
        .into_iter()
        .zip(new.tracked_fields())
        .filter_map(|((field, old_value), (new_field, new_value))| {
            debug_assert_eq!(field, new_field, "tracked field order must be stable");
            field_change(field, normalize(old_value), normalize(new_value))
        })
        .collect()
}

/// Compares two version records of the same entity.
#[must_use]
pub fn compare<F: Tracked>(old: &VersionRecord<F>, new: &VersionRecord<F>) -> RedlineResult {
    RedlineResult {
        old_version: old.version(),
        new_version: new.version(),
        changes: diff(old.fields(), new.fields()),
    }
}

/// Treats blank strings as absent values.
fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn field_change(
    field: &'static str,
    old: Option<String>,
    new: Option<String>,
) -> Option<FieldChange> {
    match (old, new) {
        (None, None) => None,
        (None, Some(new)) => Some(FieldChange {
            field,
            old: None,
            new: Some(new),
            change: ChangeType::Added,
        }),
        (Some(old), None) => Some(FieldChange {
            field,
            old: Some(old),
            new: None,
            change: ChangeType::Removed,
        }),
        (Some(old), Some(new)) => {
            if old == new {
                None
            } else {
                Some(FieldChange {
                    field,
                    old: Some(old),
                    new: Some(new),
                    change: ChangeType::Modified,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::requirement::{RequirementFields, RequirementKind, RequirementStatus};

    fn fields(title: &str, description: Option<&str>, status: RequirementStatus) -> RequirementFields {
        RequirementFields {
            title: title.to_string(),
            description: description.map(ToString::to_string),
            status,
            kind: RequirementKind::Srs,
            parent: None,
        }
    }

    #[test]
    fn identical_fields_yield_no_changes() {
        let a = fields("Login", Some("Users can log in"), RequirementStatus::Draft);
        assert!(diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn title_change_is_modified_in_both_directions() {
        let old = fields("A", None, RequirementStatus::Draft);
        let new = fields("B", None, RequirementStatus::Draft);

        let forward = diff(&old, &new);
        assert_eq!(
            forward,
            vec![FieldChange {
                field: "Title",
                old: Some("A".to_string()),
                new: Some("B".to_string()),
                change: ChangeType::Modified,
            }]
        );

        let backward = diff(&new, &old);
        assert_eq!(
            backward,
            vec![FieldChange {
                field: "Title",
                old: Some("B".to_string()),
                new: Some("A".to_string()),
                change: ChangeType::Modified,
            }]
        );
    }

    #[test]
    fn description_appearing_is_added() {
        let old = fields("Login", None, RequirementStatus::Draft);
        let new = fields("Login", Some("Detail"), RequirementStatus::Draft);

        let changes = diff(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "Description");
        assert_eq!(changes[0].change, ChangeType::Added);
        assert_eq!(changes[0].old, None);
        assert_eq!(changes[0].new, Some("Detail".to_string()));
    }

    #[test]
    fn description_disappearing_is_removed() {
        let old = fields("Login", Some("Detail"), RequirementStatus::Draft);
        let new = fields("Login", None, RequirementStatus::Draft);

        let changes = diff(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change, ChangeType::Removed);
        assert_eq!(changes[0].old, Some("Detail".to_string()));
        assert_eq!(changes[0].new, None);
    }

    #[test]
    fn blank_description_counts_as_absent() {
        let old = fields("Login", Some("   "), RequirementStatus::Draft);
        let new = fields("Login", None, RequirementStatus::Draft);
        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn status_compares_by_display_name() {
        let old = fields("Login", None, RequirementStatus::Draft);
        let new = fields("Login", None, RequirementStatus::Approved);

        let changes = diff(&old, &new);
        assert_eq!(
            changes,
            vec![FieldChange {
                field: "Status",
                old: Some("Draft".to_string()),
                new: Some("Approved".to_string()),
                change: ChangeType::Modified,
            }]
        );
    }

    #[test]
    fn changes_come_out_in_declared_field_order() {
        let old = fields("A", Some("old detail"), RequirementStatus::Draft);
        let new = fields("B", Some("new detail"), RequirementStatus::Approved);

        let names: Vec<_> = diff(&old, &new).into_iter().map(|c| c.field).collect();
        assert_eq!(names, ["Title", "Description", "Status"]);
    }
}
