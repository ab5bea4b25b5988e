//! A filesystem backed store for a workspace.
//!
//! The [`Directory`] persists a [`Workspace`] as a JSON snapshot
//! (`workspace.json`) next to its `config.toml`. The library stays
//! storage-agnostic; this module exists for the CLI and for tests.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{domain::Config, storage::workspace::Workspace};

const WORKSPACE_FILE: &str = "workspace.json";
const CONFIG_FILE: &str = "config.toml";

/// Errors raised when loading a workspace from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The workspace file could not be read.
    #[error("failed to read workspace: {0}")]
    Io(#[from] io::Error),
    /// The workspace file was not valid JSON for the current schema.
    #[error("failed to parse workspace: {0}")]
    Parse(#[from] serde_json::Error),
    /// A live entity's version counter diverges from its version log.
    #[error("workspace is inconsistent: entity {0} diverges from its version log")]
    Inconsistent(i64),
}

/// Errors raised when saving a workspace to disk.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The workspace file could not be written.
    #[error("failed to write workspace: {0}")]
    Io(#[from] io::Error),
    /// The workspace could not be serialized.
    #[error("failed to serialize workspace: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A directory holding a persisted workspace.
#[derive(Debug, Clone)]
pub struct Directory {
    root: PathBuf,
}

impl Directory {
    /// Opens a directory at the given path. Nothing is read until
    /// [`Directory::load`].
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The directory root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads the workspace from disk.
    ///
    /// A missing `workspace.json` yields an empty workspace, so a fresh
    /// directory is immediately usable. A missing or malformed
    /// `config.toml` falls back to the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `workspace.json` exists but cannot be read or
    /// parsed, or if a hand-edited snapshot left a live version counter out
    /// of step with its version log.
    pub fn load(&self) -> Result<Workspace, LoadError> {
        let config = self.load_config();

        let path = self.root.join(WORKSPACE_FILE);
        if !path.exists() {
            return Ok(Workspace::with_config(config));
        }

        let content = fs::read_to_string(&path)?;
        let mut workspace: Workspace = serde_json::from_str(&content)?;
        check_consistency(&workspace)?;
        workspace.set_config(config);
        Ok(workspace)
    }

    /// Saves the workspace to disk.
    ///
    /// The snapshot is written to a temporary file and renamed into place,
    /// so a crash mid-write leaves the previous snapshot intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the snapshot
    /// cannot be serialized or written.
    pub fn save(&self, workspace: &Workspace) -> Result<(), SaveError> {
        fs::create_dir_all(&self.root)?;

        let content = serde_json::to_string_pretty(workspace)?;
        let tmp = self.root.join(format!(".{WORKSPACE_FILE}.tmp"));
        fs::write(&tmp, content)?;
        fs::rename(&tmp, self.root.join(WORKSPACE_FILE))?;
        Ok(())
    }

    fn load_config(&self) -> Config {
        let path = self.root.join(CONFIG_FILE);
        Config::load(&path).unwrap_or_else(|e| {
            tracing::debug!("Failed to load config: {e}");
            Config::default()
        })
    }
}

/// Every live entity's version counter must equal the highest version in
/// its log; the logs themselves enforce this for workspaces built through
/// the write path, but a snapshot edited on disk can break it.
fn check_consistency(workspace: &Workspace) -> Result<(), LoadError> {
    let requirement = workspace
        .requirements()
        .find(|req| {
            workspace.requirement_log().latest_version(req.id().raw()) != Some(req.version())
        })
        .map(|req| req.id().raw());
    let test_case = workspace
        .test_cases()
        .find(|case| {
            workspace.test_case_log().latest_version(case.id().raw()) != Some(case.version())
        })
        .map(|case| case.id().raw());

    match requirement.or(test_case) {
        Some(entity) => Err(LoadError::Inconsistent(entity)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::domain::{
        ids::UserId,
        requirement::{RequirementDraft, RequirementFields, RequirementKind, RequirementStatus},
    };

    fn draft(title: &str) -> RequirementDraft {
        RequirementDraft {
            fields: RequirementFields {
                title: title.to_string(),
                description: Some("persisted".to_string()),
                status: RequirementStatus::Draft,
                kind: RequirementKind::Prs,
                parent: None,
            },
            created_by: UserId::new(1),
        }
    }

    #[test]
    fn fresh_directory_loads_an_empty_workspace() {
        let tmp = TempDir::new().unwrap();
        let dir = Directory::new(tmp.path().to_path_buf());

        let workspace = dir.load().unwrap();
        assert_eq!(workspace.requirements().count(), 0);
        assert!(workspace.requirement_log().is_empty());
    }

    #[test]
    fn workspace_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let dir = Directory::new(tmp.path().to_path_buf());

        let mut workspace = dir.load().unwrap();
        let created = workspace.create_requirement(draft("Persisted")).unwrap();
        let mut fields = created.fields().clone();
        fields.status = RequirementStatus::Approved;
        workspace
            .update_requirement(
                created.id(),
                crate::domain::requirement::RequirementUpdate {
                    fields,
                    modified_by: UserId::new(1),
                    expected_version: None,
                },
            )
            .unwrap();

        dir.save(&workspace).unwrap();

        let reloaded = dir.load().unwrap();
        assert_eq!(reloaded.requirements().count(), 1);
        let live = reloaded.requirement(created.id()).unwrap();
        assert_eq!(live.version(), 2);
        assert_eq!(
            reloaded
                .requirement_log()
                .for_entity(created.id().raw())
                .count(),
            2
        );

        // Fresh ids continue after the persisted ones.
        let mut reloaded = reloaded;
        let next = reloaded.create_requirement(draft("Next")).unwrap();
        assert!(next.id() > created.id());
    }

    #[test]
    fn config_is_read_from_the_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "_version = \"1\"\nstrict_concurrency = true\n",
        )
        .unwrap();

        let dir = Directory::new(tmp.path().to_path_buf());
        let workspace = dir.load().unwrap();
        assert!(workspace.config().strict_concurrency);
    }

    #[test]
    fn tampered_version_counter_is_rejected_at_load() {
        let tmp = TempDir::new().unwrap();
        let dir = Directory::new(tmp.path().to_path_buf());

        let mut workspace = dir.load().unwrap();
        workspace.create_requirement(draft("Edited")).unwrap();
        dir.save(&workspace).unwrap();

        // Bump the live counter on disk without touching the log.
        let path = tmp.path().join("workspace.json");
        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value["requirements"]["1"]["version"] = 5.into();
        std::fs::write(&path, value.to_string()).unwrap();

        assert!(matches!(dir.load(), Err(LoadError::Inconsistent(1))));
    }

    #[test]
    fn malformed_workspace_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("workspace.json"), "{not json").unwrap();

        let dir = Directory::new(tmp.path().to_path_buf());
        assert!(matches!(dir.load(), Err(LoadError::Parse(_))));
    }
}
