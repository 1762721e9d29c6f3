use crate::{
    config::Config,
    installer::PackageManager,
    resolver::{Chooser, Installer, RegistryLookup},
    ui::Prompt,
    workspace::Monorepo,
};

/// How an action ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    NothingToDo,
    /// The user backed out of a prompt or declined to apply.
    Cancelled,
}

/// Flags shared by every action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Preview only, never write.
    pub dry_run: bool,
    /// Apply without asking.
    pub yes: bool,
    /// Install after changes: forced on, forced off, or ask.
    pub install: Option<bool>,
}

/// Everything an action needs: the scanned monorepo, configuration and the
/// collaborators it talks to.
pub struct Session<'a> {
    pub repo: &'a Monorepo,
    pub config: &'a Config,
    pub options: Options,
    pub manager: PackageManager,
    pub prompt: &'a dyn Prompt,
    pub chooser: &'a dyn Chooser,
    pub registry: &'a dyn RegistryLookup,
    pub installer: &'a dyn Installer,
}
