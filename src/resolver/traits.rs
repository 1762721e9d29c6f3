//! Seams between the resolution engine and the outside world.
use async_trait::async_trait;
use std::path::PathBuf;

use crate::{
    error::Result,
    installer::InstallReport,
    resolver::types::{ChoiceRequest, VersionChoice},
};

/// Decisions the engine cannot make on its own.
#[cfg_attr(test, mockall::automock)]
pub trait Chooser {
    /// Pick a target version for one conflicted package.
    fn choose_version(&self, request: &ChoiceRequest) -> Result<VersionChoice>;

    /// Yes/no question with a default answer.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Best-effort lookup of the latest published version of a package.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    /// `None` on any failure: network, non-zero exit or timeout.
    async fn latest_version(&self, package: &str) -> Option<String>;
}

/// Runs the package manager's install step.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Installer: Send + Sync {
    /// Install for the given workspace directories. Per-directory failures
    /// are collected in the report rather than returned as errors.
    async fn install(&self, paths: &[PathBuf]) -> Result<InstallReport>;
}
