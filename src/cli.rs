//! CLI argument parsing.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::{
    installer::PackageManager, manifest::DependencyBucket, resolver::Strategy,
};

/// Global CLI arguments shared by every action.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value = ".", global = true)]
    /// Monorepo root containing the root package.json, apps/ and packages/.
    pub root: PathBuf,

    #[arg(long, global = true)]
    /// Configuration file. Defaults to version-aligner.toml in the root.
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    #[arg(long, default_value_t = false, global = true)]
    /// Show what would change without writing any file.
    pub dry_run: bool,

    #[arg(short, long, default_value_t = false, global = true)]
    /// Apply changes without asking for confirmation.
    pub yes: bool,

    #[arg(long, global = true, overrides_with = "no_install")]
    /// Run the package manager install step after changes without asking.
    pub install: bool,

    #[arg(long, global = true, overrides_with = "install")]
    /// Never run the install step; print manual instructions instead.
    pub no_install: bool,

    #[arg(long, value_enum, global = true)]
    /// Package manager for installs. Overrides the configuration file and
    /// lockfile detection.
    pub package_manager: Option<PackageManager>,

    /// Action to run. Shows an interactive menu when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// `Some(true)` / `Some(false)` when an install flag was given, `None`
    /// when the user should be asked.
    pub fn install_preference(&self) -> Option<bool> {
        match (self.install, self.no_install) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Monorepo actions.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a dependency to workspaces, or update it where already present.
    Add {
        /// Package name.
        package: Option<String>,

        #[arg(long)]
        /// Version spec to write, e.g. ^1.2.0.
        version: Option<String>,

        #[arg(long, value_enum)]
        /// Dependency bucket to write to.
        bucket: Option<DependencyBucket>,

        #[arg(long = "workspace")]
        /// Target workspace by name or path relative to the root. Repeatable.
        workspaces: Vec<String>,
    },

    /// Remove a dependency from workspaces.
    Remove {
        /// Package name.
        package: Option<String>,

        #[arg(long = "workspace")]
        /// Target workspace by name or path. Without it, prompts with every
        /// declaring workspace pre-selected. Repeatable.
        workspaces: Vec<String>,
    },

    /// Align one package to a single version across all workspaces.
    Sync {
        /// Package name.
        package: Option<String>,

        #[arg(long)]
        /// Target version.
        to: Option<String>,
    },

    /// Detect version conflicts and resolve them.
    Conflicts {
        #[arg(long, value_enum)]
        /// Resolution strategy.
        strategy: Option<Strategy>,
    },

    /// List workspaces and every dependency in use.
    List,

    /// Run the package manager install step.
    Install {
        #[arg(long = "workspace")]
        /// Workspace to install in. Defaults to all. Repeatable.
        workspaces: Vec<String>,
    },

    /// Bump versions, update the changelog, commit, tag and push.
    Release {
        #[arg(long)]
        /// Next version (semver).
        version: Option<String>,

        #[arg(long)]
        /// Release notes. Prompted for when omitted.
        notes: Option<String>,

        #[arg(long, default_value_t = false)]
        /// Commit and tag locally without pushing.
        no_push: bool,
    },
}

/// Entries of the interactive action menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Remove,
    Sync,
    Conflicts,
    List,
    Install,
    Release,
}

impl Action {
    pub fn all() -> [Action; 7] {
        [
            Action::Add,
            Action::Remove,
            Action::Sync,
            Action::Conflicts,
            Action::List,
            Action::Install,
            Action::Release,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::Add => "Add or update a dependency",
            Action::Remove => "Remove a dependency",
            Action::Sync => "Sync a dependency version",
            Action::Conflicts => "Check for version conflicts",
            Action::List => "List workspaces and packages",
            Action::Install => "Install dependencies",
            Action::Release => "Cut a release",
        }
    }

    /// The equivalent subcommand with nothing pre-filled.
    pub fn into_command(self) -> Command {
        match self {
            Action::Add => Command::Add {
                package: None,
                version: None,
                bucket: None,
                workspaces: vec![],
            },
            Action::Remove => Command::Remove {
                package: None,
                workspaces: vec![],
            },
            Action::Sync => Command::Sync {
                package: None,
                to: None,
            },
            Action::Conflicts => Command::Conflicts { strategy: None },
            Action::List => Command::List,
            Action::Install => Command::Install { workspaces: vec![] },
            Action::Release => Command::Release {
                version: None,
                notes: None,
                no_push: false,
            },
        }
    }
}
