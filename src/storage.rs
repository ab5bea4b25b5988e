//! In-memory workspace and filesystem persistence.
//!
//! The [`Workspace`] is the mutation service: it owns the live entities and
//! their version logs and enforces the snapshot-on-commit contract. The
//! [`Directory`] persists a workspace as a JSON snapshot in a directory,
//! alongside its `config.toml`.

/// Append-only version record store.
pub mod version_log;
pub use version_log::VersionLog;

/// Live entity store and mutation service.
pub mod workspace;
pub use workspace::{CreateError, UpdateError, ValidationError, Workspace};

/// Filesystem-backed workspace persistence.
pub mod directory;
pub use directory::{Directory, LoadError, SaveError};
