//! Append-only store of version records.
//!
//! One log exists per entity kind. Records are appended in commit order and
//! never mutated; per entity the version numbers form the gap-free sequence
//! 1, 2, 3, … The log hands out its own record ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ids::{UserId, VersionId},
    version::VersionRecord,
};

/// An append-only log of [`VersionRecord`]s for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionLog<F> {
    records: Vec<VersionRecord<F>>,
    next_id: i64,
}

impl<F> Default for VersionLog<F> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }
}

impl<F> VersionLog<F> {
    /// Appends a snapshot for the given entity and returns its record id.
    ///
    /// # Panics
    ///
    /// Panics if `version` is not exactly one greater than the entity's
    /// latest recorded version (or 1 for the first record). The workspace's
    /// single write path upholds this; a violation means live state and log
    /// have diverged.
    pub fn append(
        &mut self,
        entity_id: i64,
        version: u32,
        fields: F,
        modified_by: UserId,
        modified_at: DateTime<Utc>,
    ) -> VersionId {
        let previous = self.latest_version(entity_id).unwrap_or(0);
        assert_eq!(
            version,
            previous + 1,
            "version log for entity {entity_id} must stay gap-free"
        );

        let id = VersionId::new(self.next_id);
        self.next_id += 1;

        self.records.push(VersionRecord {
            id,
            entity_id,
            version,
            fields,
            modified_by,
            modified_at,
        });

        id
    }

    /// Looks up a record by its id.
    #[must_use]
    pub fn get(&self, id: VersionId) -> Option<&VersionRecord<F>> {
        self.records.iter().find(|record| record.id == id)
    }

    /// All records for an entity, in ascending version order.
    ///
    /// Yields nothing for unknown entities.
    pub fn for_entity(&self, entity_id: i64) -> impl Iterator<Item = &VersionRecord<F>> {
        // Records are appended in commit order, so per entity they are
        // already ascending by version.
        self.records
            .iter()
            .filter(move |record| record.entity_id == entity_id)
    }

    /// The highest version number recorded for an entity, if any.
    #[must_use]
    pub fn latest_version(&self, entity_id: i64) -> Option<u32> {
        self.for_entity(entity_id).map(VersionRecord::version).max()
    }

    /// Removes all records of an entity (cascade on delete).
    ///
    /// Returns the number of records removed.
    pub fn remove_entity(&mut self, entity_id: i64) -> usize {
        let before = self.records.len();
        self.records.retain(|record| record.entity_id != entity_id);
        before - self.records.len()
    }

    /// Total number of records in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(entries: &[(i64, u32)]) -> VersionLog<String> {
        let mut log = VersionLog::default();
        for &(entity, version) in entries {
            log.append(
                entity,
                version,
                format!("e{entity}v{version}"),
                UserId::new(1),
                Utc::now(),
            );
        }
        log
    }

    #[test]
    fn record_ids_are_assigned_sequentially() {
        let mut log = VersionLog::default();
        let first = log.append(1, 1, "a".to_string(), UserId::new(1), Utc::now());
        let second = log.append(2, 1, "b".to_string(), UserId::new(1), Utc::now());

        assert_eq!(first, VersionId::new(1));
        assert_eq!(second, VersionId::new(2));
    }

    #[test]
    fn for_entity_is_ascending_and_filters_other_entities() {
        let log = log_with(&[(1, 1), (2, 1), (1, 2), (2, 2), (1, 3)]);

        let versions: Vec<u32> = log.for_entity(1).map(VersionRecord::version).collect();
        assert_eq!(versions, [1, 2, 3]);
    }

    #[test]
    fn for_entity_of_unknown_id_is_empty() {
        let log = log_with(&[(1, 1)]);
        assert_eq!(log.for_entity(99_999).count(), 0);
    }

    #[test]
    fn latest_version_tracks_the_max() {
        let log = log_with(&[(1, 1), (1, 2)]);
        assert_eq!(log.latest_version(1), Some(2));
        assert_eq!(log.latest_version(7), None);
    }

    #[test]
    #[should_panic(expected = "gap-free")]
    fn gapped_append_panics() {
        let mut log = log_with(&[(1, 1)]);
        log.append(1, 3, "skip".to_string(), UserId::new(1), Utc::now());
    }

    #[test]
    fn remove_entity_cascades_only_that_entity() {
        let mut log = log_with(&[(1, 1), (2, 1), (1, 2)]);

        assert_eq!(log.remove_entity(1), 2);
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest_version(2), Some(1));
    }
}
