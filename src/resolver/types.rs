use std::path::PathBuf;

use crate::{conflict::Conflict, manifest::DependencyBucket};

/// Literal written when a registry lookup yields nothing.
pub const LATEST_TAG: &str = "latest";

/// One manifest entry changed (or previewed) by an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Dependency being changed.
    pub package: String,
    /// Workspace display name.
    pub workspace: String,
    /// Workspace directory.
    pub path: PathBuf,
    /// Bucket the entry lives in.
    pub bucket: DependencyBucket,
    /// Version before the change, absent on a pure add.
    pub before: Option<String>,
    /// Version after the change, absent on removal.
    pub after: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Add,
    Update,
    Remove,
}

impl ChangeRecord {
    pub fn action(&self) -> ChangeAction {
        match (&self.before, &self.after) {
            (None, _) => ChangeAction::Add,
            (Some(_), None) => ChangeAction::Remove,
            (Some(_), Some(_)) => ChangeAction::Update,
        }
    }
}

/// Result of running a resolution strategy over a set of conflicts.
#[derive(Debug, Default, Clone)]
pub struct Resolution {
    /// Every change written.
    pub changes: Vec<ChangeRecord>,
    /// De-duplicated workspace directories of all resolved conflicts, in
    /// first-seen order. Candidates for a follow-up install.
    pub affected: Vec<PathBuf>,
    /// Packages the user chose to leave alone.
    pub skipped: Vec<String>,
}

impl Resolution {
    /// Record the outcome of resolving one conflict.
    pub fn record(
        &mut self,
        conflict: &Conflict<'_>,
        changes: Vec<ChangeRecord>,
    ) {
        self.changes.extend(changes);
        for path in conflict.workspace_paths() {
            if !self.affected.contains(&path) {
                self.affected.push(path);
            }
        }
    }

    pub fn skip(&mut self, package: &str) {
        self.skipped.push(package.to_string());
    }
}

/// Answer to "which version should this package use".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionChoice {
    /// One of the versions already declared somewhere.
    InUse(String),
    /// Whatever the registry reports as latest.
    Latest,
    /// A version typed in by the user.
    Custom(String),
    /// Leave the package as it is.
    Skip,
}

/// A version currently in use and who uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionOption {
    pub version: String,
    pub workspaces: Vec<String>,
}

/// How much context the chooser should present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceMode {
    /// Quick pick, one package after another.
    Bulk,
    /// Full per-conflict view including the registry hint.
    Interactive,
}

/// Everything a [`super::Chooser`] needs to present one decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRequest {
    pub package: String,
    pub options: Vec<VersionOption>,
    /// Latest published version when it was looked up.
    pub latest: Option<String>,
    /// Heuristic "latest is not among the current versions" flag.
    pub latest_is_newer: bool,
    pub mode: ChoiceMode,
}

impl ChoiceRequest {
    pub fn new(
        conflict: &Conflict<'_>,
        latest: Option<String>,
        latest_is_newer: bool,
        mode: ChoiceMode,
    ) -> Self {
        let options = conflict
            .versions
            .iter()
            .map(|(version, workspaces)| VersionOption {
                version: version.clone(),
                workspaces: workspaces.iter().map(|w| w.name.clone()).collect(),
            })
            .collect();

        Self {
            package: conflict.package.clone(),
            options,
            latest,
            latest_is_newer,
            mode,
        }
    }
}

/// Bulk conflict resolution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// Walk through each conflict with full context.
    Interactive,
    /// Pick which conflicted packages to resolve, then resolve those
    /// interactively.
    Specific,
    /// Pick one version per package from a short list.
    Bulk,
    /// Use the version declared by the most workspaces.
    MostCommon,
    /// Use the latest version published to the registry.
    Latest,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Interactive => "Resolve each conflict interactively",
            Strategy::Specific => "Choose specific packages to resolve",
            Strategy::Bulk => "Choose a version in use for each package (bulk)",
            Strategy::MostCommon => "Auto-resolve to most common versions",
            Strategy::Latest => "Auto-resolve all to latest versions",
        }
    }

    pub fn all() -> [Strategy; 5] {
        [
            Strategy::Interactive,
            Strategy::Specific,
            Strategy::Bulk,
            Strategy::MostCommon,
            Strategy::Latest,
        ]
    }
}
