//! Package name → version → workspaces index across a monorepo.
use indexmap::IndexMap;

use crate::workspace::Workspace;

/// Versions of one package mapped to the workspaces declaring each, in the
/// order they were first seen.
pub type VersionMap<'a> = IndexMap<String, Vec<&'a Workspace>>;

/// Every declared package across all workspaces.
///
/// Invariant: a workspace listed under `(package, version)` declares exactly
/// `version` for `package` once its buckets are merged (see
/// [`crate::manifest::Manifest::merged_dependencies`]).
#[derive(Debug, Default)]
pub struct DependencyIndex<'a> {
    packages: IndexMap<String, VersionMap<'a>>,
}

impl<'a> DependencyIndex<'a> {
    /// Build the index from a scanned workspace list. Workspaces are appended
    /// in scan order.
    pub fn build(workspaces: &'a [Workspace]) -> Self {
        let mut packages: IndexMap<String, VersionMap<'a>> = IndexMap::new();

        for workspace in workspaces {
            for (name, version) in workspace.manifest.merged_dependencies() {
                packages
                    .entry(name.to_string())
                    .or_default()
                    .entry(version.to_string())
                    .or_default()
                    .push(workspace);
            }
        }

        Self { packages }
    }

    pub fn get(&self, package: &str) -> Option<&VersionMap<'a>> {
        self.packages.get(package)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Packages in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &VersionMap<'a>)> {
        self.packages.iter()
    }

    /// Packages sorted by name for listing.
    pub fn sorted(&self) -> Vec<(&String, &VersionMap<'a>)> {
        let mut entries: Vec<_> = self.packages.iter().collect();
        entries.sort_by(|(a, _), (b, _)| compare_names(a, b));
        entries
    }
}

/// Version map for a single package, built with the same bucket merge as
/// [`DependencyIndex::build`].
pub fn versions_of<'a>(
    package: &str,
    workspaces: &'a [Workspace],
) -> VersionMap<'a> {
    let mut versions: VersionMap<'a> = IndexMap::new();

    for workspace in workspaces {
        if let Some(version) =
            workspace.manifest.merged_dependencies().get(package)
        {
            versions
                .entry(version.to_string())
                .or_default()
                .push(workspace);
        }
    }

    versions
}

/// Name ordering used for every sorted listing: case-insensitive first, then
/// lowercase before uppercase.
pub fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}
