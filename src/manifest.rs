//! Reading, mutating and writing `package.json` manifests.
//!
//! A [`Manifest`] keeps the whole parsed document so fields this tool never
//! looks at survive a rewrite untouched. Only `name`, `version` and the three
//! dependency buckets are read or changed.
use indexmap::IndexMap;
use log::*;
use serde_json::{Map, Value, json};
use std::{
    fmt,
    path::{Path, PathBuf},
};
use tokio::fs;

use crate::error::{AlignerError, Result};

/// Manifest filename looked up in every workspace directory.
pub const MANIFEST_FILE: &str = "package.json";

/// One of the three dependency classifications a manifest can declare.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum,
)]
pub enum DependencyBucket {
    /// Runtime dependencies.
    #[value(alias = "prod")]
    Dependencies,
    /// Development-only dependencies.
    #[value(alias = "dev")]
    DevDependencies,
    /// Peer dependencies.
    #[value(alias = "peer")]
    PeerDependencies,
}

/// Order in which buckets are consulted when looking for an existing entry.
/// The first bucket holding the package wins.
pub const BUCKET_PRIORITY: [DependencyBucket; 3] = [
    DependencyBucket::Dependencies,
    DependencyBucket::DevDependencies,
    DependencyBucket::PeerDependencies,
];

impl DependencyBucket {
    /// JSON key of this bucket inside `package.json`.
    pub fn key(&self) -> &'static str {
        match self {
            DependencyBucket::Dependencies => "dependencies",
            DependencyBucket::DevDependencies => "devDependencies",
            DependencyBucket::PeerDependencies => "peerDependencies",
        }
    }
}

impl fmt::Display for DependencyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Parsed `package.json` document.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    doc: Value,
}

impl Manifest {
    /// Parse manifest content. `path` is only used for error reporting.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(content)
            .map_err(|err| AlignerError::scan(path, err))?;

        if !doc.is_object() {
            return Err(AlignerError::ManifestShape(path.to_path_buf()));
        }

        Ok(Self { doc })
    }

    pub fn as_value(&self) -> &Value {
        &self.doc
    }

    pub fn name(&self) -> Option<&str> {
        self.doc.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.doc.get("version").and_then(Value::as_str)
    }

    /// Overwrite the top level `version` field. Returns the previous value.
    pub fn set_version(&mut self, version: &str) -> Option<String> {
        let previous = self.version().map(str::to_string);
        self.object_mut()
            .insert("version".into(), json!(version));
        previous
    }

    /// True when the manifest declares a `workspaces` field of any shape.
    pub fn declares_workspaces(&self) -> bool {
        self.doc.get("workspaces").is_some_and(|w| !w.is_null())
    }

    pub fn bucket(
        &self,
        bucket: DependencyBucket,
    ) -> Option<&Map<String, Value>> {
        self.doc.get(bucket.key()).and_then(Value::as_object)
    }

    /// Version declared for `package` in one specific bucket.
    pub fn dependency(
        &self,
        bucket: DependencyBucket,
        package: &str,
    ) -> Option<&str> {
        self.bucket(bucket)
            .and_then(|deps| deps.get(package))
            .and_then(Value::as_str)
    }

    /// Find the first bucket, in [`BUCKET_PRIORITY`] order, that declares
    /// `package`.
    pub fn locate(&self, package: &str) -> Option<(DependencyBucket, &str)> {
        BUCKET_PRIORITY.iter().find_map(|bucket| {
            self.dependency(*bucket, package)
                .map(|version| (*bucket, version))
        })
    }

    /// Union of all buckets. A package declared in several buckets keeps the
    /// position of its first declaration and the version of the last bucket
    /// declaring it (dependencies, then devDependencies, then
    /// peerDependencies).
    pub fn merged_dependencies(&self) -> IndexMap<&str, &str> {
        let mut merged = IndexMap::new();

        for bucket in BUCKET_PRIORITY {
            if let Some(deps) = self.bucket(bucket) {
                for (name, version) in deps {
                    if let Some(version) = version.as_str() {
                        merged.insert(name.as_str(), version);
                    }
                }
            }
        }

        merged
    }

    /// Set `package` to `version` in `bucket`, creating the bucket object
    /// when missing. Returns the previous version in that bucket.
    pub fn set_dependency(
        &mut self,
        bucket: DependencyBucket,
        package: &str,
        version: &str,
    ) -> Option<String> {
        let object = self.object_mut();

        let deps = object
            .entry(bucket.key())
            .or_insert_with(|| Value::Object(Map::new()));

        if !deps.is_object() {
            warn!(
                "replacing non-object {} field while setting {}",
                bucket, package
            );
            *deps = Value::Object(Map::new());
        }

        deps.as_object_mut()
            .and_then(|deps| deps.insert(package.into(), json!(version)))
            .and_then(|previous| previous.as_str().map(str::to_string))
    }

    /// Remove `package` from `bucket`. Returns the removed version.
    pub fn remove_dependency(
        &mut self,
        bucket: DependencyBucket,
        package: &str,
    ) -> Option<String> {
        self.doc
            .get_mut(bucket.key())
            .and_then(Value::as_object_mut)
            // shift_remove keeps the remaining keys in their original order
            .and_then(|deps| deps.shift_remove(package))
            .and_then(|removed| removed.as_str().map(str::to_string))
    }

    /// Serialize with 2-space indentation and a trailing newline.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut formatted = serde_json::to_string_pretty(&self.doc)?;
        formatted.push('\n');
        Ok(formatted)
    }

    fn object_mut(&mut self) -> &mut Map<String, Value> {
        if !self.doc.is_object() {
            self.doc = Value::Object(Map::new());
        }
        // checked above
        match &mut self.doc {
            Value::Object(map) => map,
            _ => unreachable!("manifest document is always an object"),
        }
    }
}

/// Path of the manifest inside a workspace directory.
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

/// Read and parse a manifest file.
pub async fn read(path: &Path) -> Result<Manifest> {
    debug!("reading manifest: {}", path.display());
    let content = fs::read_to_string(path)
        .await
        .map_err(|err| AlignerError::manifest_read(path, err))?;
    Manifest::parse(path, &content)
}

/// Overwrite a manifest file in place.
pub async fn write(path: &Path, manifest: &Manifest) -> Result<()> {
    debug!("writing manifest: {}", path.display());
    let formatted = manifest.to_pretty_string()?;
    fs::write(path, formatted)
        .await
        .map_err(|err| AlignerError::manifest_write(path, err))
}
