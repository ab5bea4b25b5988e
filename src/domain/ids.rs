//! Strongly typed identifiers for entities, versions, and users.
//!
//! All identifiers wrap a store-assigned `i64`. The wrappers exist so a
//! requirement id cannot be passed where a version id is expected, which
//! matters in the redline query surface where both are plain integers on
//! the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// The raw integer value.
            #[must_use]
            pub const fn raw(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

id_type!(
    /// Identifier of a live requirement.
    RequirementId
);

id_type!(
    /// Identifier of a live test case.
    TestCaseId
);

id_type!(
    /// Identifier of a single version record.
    VersionId
);

id_type!(
    /// Identifier of the user performing a mutation.
    UserId
);

impl UserId {
    /// Whether this is a plausible caller identity.
    ///
    /// Store-assigned user ids start at 1; zero and negative values are
    /// rejected before any write.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

#[cfg(test)]
mod tests {
    use super::UserId;

    #[test]
    fn positive_user_ids_are_valid() {
        assert!(UserId::new(1).is_valid());
        assert!(UserId::new(i64::MAX).is_valid());
    }

    #[test]
    fn zero_and_negative_user_ids_are_invalid() {
        assert!(!UserId::new(0).is_valid());
        assert!(!UserId::new(-7).is_valid());
    }
}
