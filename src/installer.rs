//! Package manager detection and the install step run after manifest changes.
use async_trait::async_trait;
use log::*;
use serde::Deserialize;
use std::{
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use tokio::{process::Command, time};

use crate::{
    error::{AlignerError, Result},
    resolver::Installer,
};

/// Default wait for a single install before it is killed.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Supported package managers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    /// Pick the manager whose lockfile sits in `root`, falling back to npm.
    pub fn detect(root: &Path) -> Self {
        let has = |file: &str| root.join(file).is_file();

        let manager = if has("pnpm-lock.yaml") {
            PackageManager::Pnpm
        } else if has("yarn.lock") {
            PackageManager::Yarn
        } else if has("bun.lockb") || has("bun.lock") {
            PackageManager::Bun
        } else {
            PackageManager::Npm
        };

        debug!("detected package manager: {manager}");
        manager
    }

    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
            PackageManager::Bun => "bun",
        }
    }

    /// Arguments to the install invocation. Bare `yarn` installs.
    pub fn install_args(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Yarn => &[],
            _ => &["install"],
        }
    }

    /// Full command line as shown to the user.
    pub fn install_command(&self) -> String {
        let mut parts = vec![self.program()];
        parts.extend(self.install_args());
        parts.join(" ")
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Directories an install should run in.
///
/// A root manifest with a `workspaces` field means one install at the root
/// covers everything. Otherwise each target gets its own install, in the
/// given order with duplicates removed.
pub fn group_install_targets(
    root: &Path,
    uses_workspaces: bool,
    targets: &[PathBuf],
) -> Vec<PathBuf> {
    if uses_workspaces {
        return vec![root.to_path_buf()];
    }

    let mut dirs: Vec<PathBuf> = vec![];
    for target in targets {
        if !dirs.contains(target) {
            dirs.push(target.clone());
        }
    }
    dirs
}

/// Shell lines a user can run when the automatic install failed or was
/// declined.
pub fn manual_instructions(
    manager: PackageManager,
    root: &Path,
    uses_workspaces: bool,
    targets: &[PathBuf],
) -> Vec<String> {
    let command = manager.install_command();

    group_install_targets(root, uses_workspaces, targets)
        .iter()
        .map(|dir| format!("cd {} && {}", dir.display(), command))
        .collect()
}

/// One directory whose install did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallFailure {
    pub dir: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<InstallFailure>,
}

impl InstallReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Directories that still need a manual install.
    pub fn failed_dirs(&self) -> Vec<PathBuf> {
        self.failed.iter().map(|f| f.dir.clone()).collect()
    }
}

/// Spawns the package manager in each install directory, one at a time.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    root: PathBuf,
    manager: PackageManager,
    program: String,
    uses_workspaces: bool,
    timeout: Duration,
}

impl CommandInstaller {
    pub fn new(
        root: impl Into<PathBuf>,
        manager: PackageManager,
        uses_workspaces: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            root: root.into(),
            manager,
            program: manager.program().into(),
            uses_workspaces,
            timeout,
        }
    }

    /// Run a different executable with the manager's install arguments,
    /// mostly useful for tests.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn install_in(&self, dir: &Path) -> Result<()> {
        info!(
            "running {} in {}",
            self.manager.install_command(),
            dir.display()
        );

        let mut child = Command::new(&self.program)
            .args(self.manager.install_args())
            .current_dir(dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AlignerError::install(
                    dir,
                    format!("failed to spawn {}: {e}", self.program),
                )
            })?;

        let waited = time::timeout(self.timeout, child.wait()).await;
        let status = match waited {
            Ok(status) => {
                status.map_err(|e| AlignerError::install(dir, e.to_string()))?
            }
            Err(_) => {
                if let Err(err) = child.kill().await {
                    warn!("failed to kill install in {}: {err}", dir.display());
                }
                return Err(AlignerError::InstallTimeout {
                    dir: dir.to_path_buf(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !status.success() {
            let command = self.manager.install_command();
            return Err(AlignerError::install(
                dir,
                format!("{command} exited with {status}"),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl Installer for CommandInstaller {
    async fn install(&self, paths: &[PathBuf]) -> Result<InstallReport> {
        let dirs =
            group_install_targets(&self.root, self.uses_workspaces, paths);
        let mut report = InstallReport::default();

        for dir in dirs {
            match self.install_in(&dir).await {
                Ok(()) => report.succeeded.push(dir),
                Err(err) => {
                    warn!("{err}");
                    report.failed.push(InstallFailure {
                        dir,
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
