//! Error types for version-aligner operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main error type for version-aligner operations.
#[derive(Error, Debug)]
pub enum AlignerError {
    // Cli args errors
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A manifest exists but is not valid JSON. Fatal for the run since a
    /// later write would make the file worse.
    #[error("Failed to parse manifest {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read manifest {}: {source}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write manifest {}: {source}", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest {} is not a JSON object", .0.display())]
    ManifestShape(PathBuf),

    #[error("Registry lookup for {package} failed: {reason}")]
    RegistryLookup { package: String, reason: String },

    #[error("Installation failed in {}: {reason}", dir.display())]
    Install { dir: PathBuf, reason: String },

    #[error("Installation in {} timed out after {secs}s", dir.display())]
    InstallTimeout { dir: PathBuf, secs: u64 },

    /// The user backed out of a prompt.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Git operation failed: {0}")]
    GitError(#[from] git2::Error),

    #[error("Invalid version format: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Prompt failed: {0}")]
    PromptError(#[from] dialoguer::Error),

    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    // Generic wrapper for other errors
    #[error(transparent)]
    Other(#[from] color_eyre::Report),
}

/// Result type alias using AlignerError
pub type Result<T> = std::result::Result<T, AlignerError>;

impl AlignerError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    pub fn scan(path: &Path, source: serde_json::Error) -> Self {
        Self::Scan {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn manifest_read(path: &Path, source: std::io::Error) -> Self {
        Self::ManifestRead {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn manifest_write(path: &Path, source: std::io::Error) -> Self {
        Self::ManifestWrite {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn install(dir: &Path, reason: impl Into<String>) -> Self {
        Self::Install {
            dir: dir.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// True when the error only means the user backed out.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// io errors land in the Other variant
impl From<std::io::Error> for AlignerError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(color_eyre::Report::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formats() {
        let err = AlignerError::invalid_config("missing field");
        assert_eq!(err.to_string(), "Invalid configuration: missing field");

        let err = AlignerError::install(Path::new("/repo/apps/web"), "exit 1");
        assert_eq!(
            err.to_string(),
            "Installation failed in /repo/apps/web: exit 1"
        );

        let err = AlignerError::InstallTimeout {
            dir: PathBuf::from("/repo"),
            secs: 300,
        };
        assert_eq!(
            err.to_string(),
            "Installation in /repo timed out after 300s"
        );
    }

    #[test]
    fn test_scan_error_keeps_path() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope")
            .unwrap_err();
        let err =
            AlignerError::scan(Path::new("apps/a/package.json"), json_err);
        assert!(matches!(err, AlignerError::Scan { .. }));
        assert!(err.to_string().starts_with(
            "Failed to parse manifest apps/a/package.json:"
        ));
    }

    #[test]
    fn test_cancelled_helper() {
        assert!(AlignerError::Cancelled.is_cancelled());
        assert!(!AlignerError::invalid_args("x").is_cancelled());
    }

    #[test]
    fn test_from_conversions() {
        let semver_err = semver::Version::parse("invalid");
        assert!(semver_err.is_err());
        let err: AlignerError = semver_err.unwrap_err().into();
        assert!(matches!(err, AlignerError::InvalidVersion(_)));
    }
}
