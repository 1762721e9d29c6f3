//! Action tests against fixture monorepos with every collaborator mocked.

use crate::{
    command::types::{Options, Session},
    config::Config,
    installer::PackageManager,
    resolver::traits::{MockChooser, MockInstaller, MockRegistryLookup},
    ui::MockPrompt,
    workspace::Monorepo,
};

/// Mocks without expectations fail the test when called, so a test only
/// sets up the prompts its flow is allowed to ask.
pub struct Mocks {
    pub prompt: MockPrompt,
    pub chooser: MockChooser,
    pub registry: MockRegistryLookup,
    pub installer: MockInstaller,
    pub config: Config,
}

impl Mocks {
    pub fn new() -> Self {
        Self {
            prompt: MockPrompt::new(),
            chooser: MockChooser::new(),
            registry: MockRegistryLookup::new(),
            installer: MockInstaller::new(),
            config: Config::default(),
        }
    }

    pub fn session<'a>(
        &'a self,
        repo: &'a Monorepo,
        options: Options,
    ) -> Session<'a> {
        Session {
            repo,
            config: &self.config,
            options,
            manager: PackageManager::Npm,
            prompt: &self.prompt,
            chooser: &self.chooser,
            registry: &self.registry,
            installer: &self.installer,
        }
    }
}

/// `--yes --no-install`: no confirmation and no install.
pub fn unattended() -> Options {
    Options {
        dry_run: false,
        yes: true,
        install: Some(false),
    }
}
