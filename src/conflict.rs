//! Detection of packages declared at more than one version.
use std::path::PathBuf;

use crate::{
    index::{DependencyIndex, VersionMap, compare_names},
    workspace::Workspace,
};

/// A package declared at two or more distinct version strings.
#[derive(Debug, Clone)]
pub struct Conflict<'a> {
    pub package: String,
    pub versions: VersionMap<'a>,
}

impl<'a> Conflict<'a> {
    /// Version used by the most workspaces. Ties go to the version seen
    /// first.
    pub fn most_common_version(&self) -> Option<&str> {
        let mut best: Option<(&String, usize)> = None;

        for (version, workspaces) in &self.versions {
            if best.is_none_or(|(_, count)| workspaces.len() > count) {
                best = Some((version, workspaces.len()));
            }
        }

        best.map(|(version, _)| version.as_str())
    }

    /// Every workspace touched by this conflict, de-duplicated, in version
    /// map order.
    pub fn workspaces(&self) -> Vec<&'a Workspace> {
        let mut seen: Vec<&'a Workspace> = vec![];
        for workspace in self.versions.values().flatten() {
            if !seen.iter().any(|w| w.path == workspace.path) {
                seen.push(workspace);
            }
        }
        seen
    }

    pub fn workspace_paths(&self) -> Vec<PathBuf> {
        self.workspaces()
            .into_iter()
            .map(|w| w.path.clone())
            .collect()
    }

    pub fn current_versions(&self) -> Vec<&str> {
        self.versions.keys().map(String::as_str).collect()
    }
}

/// Packages with more than one version, sorted by name.
pub fn detect<'a>(index: &DependencyIndex<'a>) -> Vec<Conflict<'a>> {
    let mut conflicts: Vec<Conflict<'a>> = index
        .iter()
        .filter(|(_, versions)| versions.len() > 1)
        .map(|(package, versions)| Conflict {
            package: package.clone(),
            versions: versions.clone(),
        })
        .collect();

    conflicts.sort_by(|a, b| compare_names(&a.package, &b.package));

    conflicts
}
