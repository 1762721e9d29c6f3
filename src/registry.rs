//! Latest-version lookup against the npm registry.
use async_trait::async_trait;
use log::*;
use std::{collections::HashSet, process::Stdio, time::Duration};
use tokio::{process::Command, time};

use crate::{
    error::{AlignerError, Result},
    resolver::RegistryLookup,
};

/// Default wait for `npm view` before giving up.
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(10);

/// Asks the npm CLI for the `version` field of the latest dist-tag.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    program: String,
    timeout: Duration,
}

impl NpmRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "npm".into(),
            timeout,
        }
    }

    /// Use a different executable, mostly useful for tests.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn query(&self, package: &str) -> Result<String> {
        let lookup_err = |reason: String| AlignerError::RegistryLookup {
            package: package.to_string(),
            reason,
        };

        let child = Command::new(&self.program)
            .args(["view", package, "version"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                lookup_err(format!("failed to spawn {}: {e}", self.program))
            })?;

        let output = time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                let secs = self.timeout.as_secs();
                lookup_err(format!("timed out after {secs}s"))
            })?
            .map_err(|e| lookup_err(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(lookup_err(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let version =
            String::from_utf8_lossy(&output.stdout).trim().to_string();
        if version.is_empty() {
            return Err(lookup_err("empty response".into()));
        }

        Ok(version)
    }
}

#[async_trait]
impl RegistryLookup for NpmRegistry {
    async fn latest_version(&self, package: &str) -> Option<String> {
        debug!("looking up latest version of {package}");

        match self.query(package).await {
            Ok(version) => {
                debug!("latest {package}: {version}");
                Some(version)
            }
            Err(err) => {
                warn!("{err}");
                None
            }
        }
    }
}

/// Rough "is the registry ahead of us" hint.
///
/// Strips `^` and `~` from each current spec and reports `latest` as newer
/// when it matches none of them. Not a semver comparison.
pub fn is_version_newer(latest: &str, current: &[&str]) -> bool {
    let latest = latest.trim();
    let in_use: HashSet<String> = current
        .iter()
        .map(|v| v.trim().replace(['^', '~'], ""))
        .collect();

    !in_use.contains(latest)
}
