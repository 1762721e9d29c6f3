//! Configuration loading and parsing for `version-aligner.toml` files.
//!
//! Every field has a default, so a missing file and an empty file behave the
//! same.
use serde::Deserialize;
use std::{path::Path, time::Duration};
use tokio::fs;

use crate::{
    error::{AlignerError, Result},
    installer::{DEFAULT_INSTALL_TIMEOUT, PackageManager},
    registry::DEFAULT_REGISTRY_TIMEOUT,
};

/// Default configuration filename, looked up in the repository root.
pub const DEFAULT_CONFIG_FILE: &str = "version-aligner.toml";

/// Placeholder substituted into [`ReleaseConfig::commit_message`].
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Settings for the `release` flow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Prefix prepended to the version when tagging (e.g. "v").
    pub tag_prefix: String,
    /// Changelog file relative to the repository root.
    pub changelog: String,
    /// Remote the release commit and tag are pushed to.
    pub remote: String,
    /// Commit message template; `{version}` is replaced.
    pub commit_message: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            tag_prefix: "v".into(),
            changelog: "CHANGELOG.md".into(),
            remote: "origin".into(),
            commit_message: "chore(release): {version}".into(),
        }
    }
}

impl ReleaseConfig {
    pub fn tag_name(&self, version: &str) -> String {
        format!("{}{}", self.tag_prefix, version)
    }

    pub fn render_commit_message(&self, version: &str) -> String {
        self.commit_message.replace(VERSION_PLACEHOLDER, version)
    }
}

/// Root configuration structure for `version-aligner.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds to wait for one install before killing it.
    pub install_timeout_secs: u64,
    /// Seconds to wait for a registry lookup.
    pub registry_timeout_secs: u64,
    /// Overrides lockfile based package manager detection.
    pub package_manager: Option<PackageManager>,
    /// Release flow settings.
    pub release: ReleaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            install_timeout_secs: DEFAULT_INSTALL_TIMEOUT.as_secs(),
            registry_timeout_secs: DEFAULT_REGISTRY_TIMEOUT.as_secs(),
            package_manager: None,
            release: ReleaseConfig::default(),
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_secs(self.registry_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.install_timeout_secs == 0 {
            return Err(AlignerError::invalid_config(
                "install_timeout_secs must be greater than zero",
            ));
        }
        if self.registry_timeout_secs == 0 {
            return Err(AlignerError::invalid_config(
                "registry_timeout_secs must be greater than zero",
            ));
        }
        if self.release.remote.trim().is_empty() {
            return Err(AlignerError::invalid_config(
                "release.remote must not be empty",
            ));
        }
        Ok(())
    }
}

/// Load configuration for the repository at `root`.
///
/// An explicit path must exist. Without one, `version-aligner.toml` in the
/// root is used when present and defaults otherwise.
pub async fn load(root: &Path, explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !fs::try_exists(path).await? {
                return Err(AlignerError::invalid_config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => {
            let path = root.join(DEFAULT_CONFIG_FILE);
            if !fs::try_exists(&path).await? {
                log::info!("repository configuration not found: using default");
                return Ok(Config::default());
            }
            path
        }
    };

    log::debug!("loading configuration from {}", path.display());
    let content = fs::read_to_string(&path).await?;
    Config::parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MonorepoFixture;

    #[test]
    fn loads_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.install_timeout(), Duration::from_secs(300));
        assert_eq!(config.registry_timeout(), Duration::from_secs(10));
        assert_eq!(config.release.tag_prefix, "v");
    }

    #[test]
    fn partial_release_table_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            package_manager = "pnpm"

            [release]
            tag_prefix = "release-"
            "#,
        )
        .unwrap();

        assert_eq!(config.package_manager, Some(PackageManager::Pnpm));
        assert_eq!(config.release.tag_name("1.2.0"), "release-1.2.0");
        assert_eq!(config.release.remote, "origin");
        assert_eq!(
            config.release.render_commit_message("1.2.0"),
            "chore(release): 1.2.0"
        );
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = Config::parse("install_timeout_secs = 0");
        assert!(matches!(result, Err(AlignerError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_unknown_package_manager() {
        let result = Config::parse(r#"package_manager = "cargo""#);
        assert!(matches!(result, Err(AlignerError::TomlParseError(_))));
    }

    #[tokio::test]
    async fn missing_default_file_uses_defaults() {
        let fixture = MonorepoFixture::new().root("{}");
        let config = load(fixture.path(), None).await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn reads_file_from_root() {
        let fixture = MonorepoFixture::new()
            .root("{}")
            .file(DEFAULT_CONFIG_FILE, "registry_timeout_secs = 3\n");

        let config = load(fixture.path(), None).await.unwrap();
        assert_eq!(config.registry_timeout_secs, 3);
    }

    #[tokio::test]
    async fn explicit_path_must_exist() {
        let fixture = MonorepoFixture::new().root("{}");
        let missing = fixture.path().join("nope.toml");

        let result = load(fixture.path(), Some(&missing)).await;
        assert!(matches!(result, Err(AlignerError::InvalidConfig(_))));
    }
}
