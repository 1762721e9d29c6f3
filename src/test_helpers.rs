//! Common test helper functions shared across test modules.
//!
//! Builds throwaway monorepos on disk so scanner, index and resolver tests can
//! work against real manifest files.
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::{
    manifest::MANIFEST_FILE,
    workspace::{self, Monorepo},
};

/// Temporary monorepo layout. Dropping it removes the directory.
///
/// # Example
/// ```ignore
/// let fixture = MonorepoFixture::new()
///     .root(r#"{"name": "acme"}"#)
///     .app("web", r#"{"dependencies": {"react": "^18.0.0"}}"#);
/// let repo = fixture.scan().await;
/// ```
pub struct MonorepoFixture {
    dir: TempDir,
}

impl MonorepoFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(self, manifest: &str) -> Self {
        self.write_manifest(".", manifest);
        self
    }

    pub fn app(self, dir: &str, manifest: &str) -> Self {
        self.write_manifest(&format!("apps/{dir}"), manifest);
        self
    }

    pub fn package(self, dir: &str, manifest: &str) -> Self {
        self.write_manifest(&format!("packages/{dir}"), manifest);
        self
    }

    /// Drop an extra file (lockfile, changelog) relative to the root.
    pub fn file(self, rel: &str, content: &str) -> Self {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
        self
    }

    pub async fn scan(&self) -> Monorepo {
        workspace::scan(self.path()).await.unwrap()
    }

    pub fn manifest_file(&self, rel_dir: &str) -> PathBuf {
        self.dir.path().join(rel_dir).join(MANIFEST_FILE)
    }

    /// Raw manifest text as currently on disk.
    pub fn read_raw(&self, rel_dir: &str) -> String {
        std::fs::read_to_string(self.manifest_file(rel_dir)).unwrap()
    }

    /// Parsed manifest as currently on disk.
    pub fn read_json(&self, rel_dir: &str) -> Value {
        serde_json::from_str(&self.read_raw(rel_dir)).unwrap()
    }

    fn write_manifest(&self, rel_dir: &str, manifest: &str) {
        let dir = self.dir.path().join(rel_dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
    }
}

/// Three workspace monorepo used by most resolver tests:
///
/// - root: no dependencies
/// - apps/a: `dep` `^1.0.0` in dependencies
/// - packages/b: `dep` `^2.0.0` in devDependencies
pub fn conflicting_fixture() -> MonorepoFixture {
    MonorepoFixture::new()
        .root(r#"{"name": "root", "private": true}"#)
        .app(
            "a",
            r#"{"name": "a", "version": "0.1.0", "dependencies": {"dep": "^1.0.0"}}"#,
        )
        .package(
            "b",
            r#"{"name": "b", "version": "0.1.0", "devDependencies": {"dep": "^2.0.0"}}"#,
        )
}

/// Write an executable `sh` script standing in for an external tool.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .unwrap();
    path
}
