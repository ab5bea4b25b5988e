//! Command-line interface over a workspace directory.

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, ValueEnum};
use owo_colors::OwoColorize;

use redline::{
    Directory, RedlineResult, RequirementFields, VersionQueries,
    domain::{
        ids::{RequirementId, TestCaseId, UserId, VersionId},
        requirement::{
            RequirementDraft, RequirementKind, RequirementStatus, RequirementUpdate,
        },
        test_case::{TestCaseDraft, TestCaseFields, TestCaseUpdate, TestStep},
    },
};

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the workspace directory
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Which entity family a read-only command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// Requirements.
    Req,
    /// Test cases.
    Case,
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Create a requirement
    CreateReq(CreateReq),
    /// Update a requirement (unspecified fields are kept)
    UpdateReq(UpdateReq),
    /// Create a test case
    CreateCase(CreateCase),
    /// Update a test case (unspecified fields are kept)
    UpdateCase(UpdateCase),
    /// Delete an entity and its version history
    Delete(Delete),
    /// List live entities
    List(List),
    /// List an entity's version history as JSON
    Versions(Versions),
    /// Show a single version record as JSON
    Version(ShowVersion),
    /// Compare two versions of the same entity
    Redline(Redline),
    /// Audit the requirement hierarchy for cycles
    Validate(Validate),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let directory = Directory::new(root);
        match self {
            Self::CreateReq(cmd) => cmd.run(&directory),
            Self::UpdateReq(cmd) => cmd.run(&directory),
            Self::CreateCase(cmd) => cmd.run(&directory),
            Self::UpdateCase(cmd) => cmd.run(&directory),
            Self::Delete(cmd) => cmd.run(&directory),
            Self::List(cmd) => cmd.run(&directory),
            Self::Versions(cmd) => cmd.run(&directory),
            Self::Version(cmd) => cmd.run(&directory),
            Self::Redline(cmd) => cmd.run(&directory),
            Self::Validate(cmd) => cmd.run(&directory),
        }
    }
}

/// Arguments for `redline create-req`.
#[derive(Debug, clap::Parser)]
pub struct CreateReq {
    /// Requirement kind (crs, prs, srs, user-story, business-rule)
    kind: RequirementKind,

    /// Requirement title
    title: String,

    /// Free-text description
    #[arg(long)]
    description: Option<String>,

    /// Initial status (defaults to draft)
    #[arg(long, default_value = "draft")]
    status: RequirementStatus,

    /// Parent requirement id
    #[arg(long)]
    parent: Option<RequirementId>,

    /// Acting user id
    #[arg(long)]
    author: UserId,
}

impl CreateReq {
    fn run(self, directory: &Directory) -> anyhow::Result<()> {
        let mut workspace = directory.load()?;

        let created = workspace.create_requirement(RequirementDraft {
            fields: RequirementFields {
                title: self.title,
                description: self.description,
                status: self.status,
                kind: self.kind,
                parent: self.parent,
            },
            created_by: self.author,
        })?;

        directory.save(&workspace)?;
        println!("created requirement {} (version 1)", created.id());
        Ok(())
    }
}

/// Arguments for `redline update-req`.
#[derive(Debug, clap::Parser)]
pub struct UpdateReq {
    /// Requirement id
    id: RequirementId,

    /// New title
    #[arg(long)]
    title: Option<String>,

    /// New description
    #[arg(long, conflicts_with = "clear_description")]
    description: Option<String>,

    /// Remove the description
    #[arg(long)]
    clear_description: bool,

    /// New status
    #[arg(long)]
    status: Option<RequirementStatus>,

    /// New kind
    #[arg(long)]
    kind: Option<RequirementKind>,

    /// New parent requirement id
    #[arg(long, conflicts_with = "no_parent")]
    parent: Option<RequirementId>,

    /// Detach from the current parent
    #[arg(long)]
    no_parent: bool,

    /// Acting user id
    #[arg(long)]
    author: UserId,

    /// The live version this update is based on (compare-and-swap)
    #[arg(long)]
    expect: Option<u32>,
}

impl UpdateReq {
    fn run(self, directory: &Directory) -> anyhow::Result<()> {
        let mut workspace = directory.load()?;
        let existing = workspace
            .requirement(self.id)
            .with_context(|| format!("requirement {} not found", self.id))?;

        let mut fields = existing.fields().clone();
        if let Some(title) = self.title {
            fields.title = title;
        }
        if self.clear_description {
            fields.description = None;
        } else if let Some(description) = self.description {
            fields.description = Some(description);
        }
        if let Some(status) = self.status {
            fields.status = status;
        }
        if let Some(kind) = self.kind {
            fields.kind = kind;
        }
        if self.no_parent {
            fields.parent = None;
        } else if let Some(parent) = self.parent {
            fields.parent = Some(parent);
        }

        let updated = workspace.update_requirement(
            self.id,
            RequirementUpdate {
                fields,
                modified_by: self.author,
                expected_version: self.expect,
            },
        )?;

        directory.save(&workspace)?;
        println!("updated requirement {} to version {}", updated.id(), updated.version());
        Ok(())
    }
}

/// Arguments for `redline create-case`.
#[derive(Debug, clap::Parser)]
pub struct CreateCase {
    /// Test case title
    title: String,

    /// Free-text description
    #[arg(long)]
    description: Option<String>,

    /// Steps, written as 'action' or 'action => expected'
    #[arg(long = "step", value_name = "STEP")]
    steps: Vec<String>,

    /// Overall expected result
    #[arg(long)]
    expected: Option<String>,

    /// Acting user id
    #[arg(long)]
    author: UserId,
}

impl CreateCase {
    fn run(self, directory: &Directory) -> anyhow::Result<()> {
        let mut workspace = directory.load()?;

        let created = workspace.create_test_case(TestCaseDraft {
            fields: TestCaseFields {
                title: self.title,
                description: self.description,
                steps: self.steps.iter().map(|s| parse_step(s)).collect(),
                expected_result: self.expected,
            },
            created_by: self.author,
        })?;

        directory.save(&workspace)?;
        println!("created test case {} (version 1)", created.id());
        Ok(())
    }
}

/// Arguments for `redline update-case`.
#[derive(Debug, clap::Parser)]
pub struct UpdateCase {
    /// Test case id
    id: TestCaseId,

    /// New title
    #[arg(long)]
    title: Option<String>,

    /// New description
    #[arg(long, conflicts_with = "clear_description")]
    description: Option<String>,

    /// Remove the description
    #[arg(long)]
    clear_description: bool,

    /// Replacement steps, written as 'action' or 'action => expected'
    #[arg(long = "step", value_name = "STEP")]
    steps: Vec<String>,

    /// New overall expected result
    #[arg(long, conflicts_with = "clear_expected")]
    expected: Option<String>,

    /// Remove the overall expected result
    #[arg(long)]
    clear_expected: bool,

    /// Acting user id
    #[arg(long)]
    author: UserId,

    /// The live version this update is based on (compare-and-swap)
    #[arg(long)]
    expect: Option<u32>,
}

impl UpdateCase {
    fn run(self, directory: &Directory) -> anyhow::Result<()> {
        let mut workspace = directory.load()?;
        let existing = workspace
            .test_case(self.id)
            .with_context(|| format!("test case {} not found", self.id))?;

        let mut fields = existing.fields().clone();
        if let Some(title) = self.title {
            fields.title = title;
        }
        if self.clear_description {
            fields.description = None;
        } else if let Some(description) = self.description {
            fields.description = Some(description);
        }
        if !self.steps.is_empty() {
            fields.steps = self.steps.iter().map(|s| parse_step(s)).collect();
        }
        if self.clear_expected {
            fields.expected_result = None;
        } else if let Some(expected) = self.expected {
            fields.expected_result = Some(expected);
        }

        let updated = workspace.update_test_case(
            self.id,
            TestCaseUpdate {
                fields,
                modified_by: self.author,
                expected_version: self.expect,
            },
        )?;

        directory.save(&workspace)?;
        println!("updated test case {} to version {}", updated.id(), updated.version());
        Ok(())
    }
}

/// Arguments for `redline delete`.
#[derive(Debug, clap::Parser)]
pub struct Delete {
    /// Entity family
    kind: Kind,

    /// Entity id
    id: i64,
}

impl Delete {
    fn run(self, directory: &Directory) -> anyhow::Result<()> {
        let mut workspace = directory.load()?;

        let deleted = match self.kind {
            Kind::Req => workspace.delete_requirement(RequirementId::new(self.id)),
            Kind::Case => workspace.delete_test_case(TestCaseId::new(self.id)),
        };
        anyhow::ensure!(deleted, "no entity with id {}", self.id);

        directory.save(&workspace)?;
        println!("deleted {}", self.id);
        Ok(())
    }
}

/// Arguments for `redline list`.
#[derive(Debug, clap::Parser)]
pub struct List {
    /// Entity family (defaults to requirements)
    #[arg(default_value = "req")]
    kind: Kind,
}

impl List {
    fn run(self, directory: &Directory) -> anyhow::Result<()> {
        let workspace = directory.load()?;

        match self.kind {
            Kind::Req => {
                for req in workspace.requirements() {
                    println!(
                        "{}\tv{}\t[{}]\t{}\t{}",
                        req.id(),
                        req.version(),
                        req.fields().status,
                        req.fields().kind,
                        req.fields().title
                    );
                }
            }
            Kind::Case => {
                for case in workspace.test_cases() {
                    println!(
                        "{}\tv{}\t{} steps\t{}",
                        case.id(),
                        case.version(),
                        case.fields().steps.len(),
                        case.fields().title
                    );
                }
            }
        }
        Ok(())
    }
}

/// Arguments for `redline versions`.
#[derive(Debug, clap::Parser)]
pub struct Versions {
    /// Entity family
    kind: Kind,

    /// Entity id
    id: i64,
}

impl Versions {
    fn run(self, directory: &Directory) -> anyhow::Result<()> {
        let workspace = directory.load()?;
        let queries = VersionQueries::new(&workspace);

        let json = match self.kind {
            Kind::Req => {
                serde_json::to_string_pretty(&queries.requirement_versions(RequirementId::new(self.id)))?
            }
            Kind::Case => {
                serde_json::to_string_pretty(&queries.test_case_versions(TestCaseId::new(self.id)))?
            }
        };
        println!("{json}");
        Ok(())
    }
}

/// Arguments for `redline version`.
#[derive(Debug, clap::Parser)]
pub struct ShowVersion {
    /// Entity family
    kind: Kind,

    /// Version record id
    version_id: VersionId,
}

impl ShowVersion {
    fn run(self, directory: &Directory) -> anyhow::Result<()> {
        let workspace = directory.load()?;
        let queries = VersionQueries::new(&workspace);

        let json = match self.kind {
            Kind::Req => serde_json::to_string_pretty(&queries.requirement_version(self.version_id)?)?,
            Kind::Case => serde_json::to_string_pretty(&queries.test_case_version(self.version_id)?)?,
        };
        println!("{json}");
        Ok(())
    }
}

/// Arguments for `redline redline`.
#[derive(Debug, clap::Parser)]
pub struct Redline {
    /// Entity family
    kind: Kind,

    /// Older version record id
    old: VersionId,

    /// Newer version record id
    new: VersionId,
}

impl Redline {
    fn run(self, directory: &Directory) -> anyhow::Result<()> {
        let workspace = directory.load()?;
        let queries = VersionQueries::new(&workspace);

        let result = match self.kind {
            Kind::Req => queries.requirement_redline(self.old, self.new)?,
            Kind::Case => queries.test_case_redline(self.old, self.new)?,
        };
        print_redline(&result);
        Ok(())
    }
}

fn print_redline(result: &RedlineResult) {
    println!("v{} -> v{}", result.old_version, result.new_version);

    if result.changes.is_empty() {
        println!("no changes");
        return;
    }

    for change in &result.changes {
        println!("{} ({})", change.field.bold(), change.change);
        if let Some(old) = &change.old {
            println!("  - {}", old.red());
        }
        if let Some(new) = &change.new {
            println!("  + {}", new.green());
        }
    }
}

/// Arguments for `redline validate`.
#[derive(Debug, clap::Parser)]
pub struct Validate {}

impl Validate {
    fn run(self, directory: &Directory) -> anyhow::Result<()> {
        let workspace = directory.load()?;

        let cycles = workspace.audit_hierarchy();
        if cycles.is_empty() {
            println!("hierarchy is acyclic");
            return Ok(());
        }

        for cycle in &cycles {
            let ids: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            println!("cycle: {}", ids.join(" -> "));
        }
        anyhow::bail!("{} cycle(s) found", cycles.len());
    }
}

fn parse_step(raw: &str) -> TestStep {
    raw.split_once("=>").map_or_else(
        || TestStep {
            action: raw.trim().to_string(),
            expected: None,
        },
        |(action, expected)| TestStep {
            action: action.trim().to_string(),
            expected: Some(expected.trim().to_string()),
        },
    )
}
