//! Manifest-mutating operations: sync, add/update and removal.
//!
//! Every operation re-reads each target manifest from disk, so the scan
//! snapshot is only used to decide which workspaces to visit. In dry-run mode
//! the same change records are produced without writing anything.
use log::*;
use std::path::PathBuf;

use crate::{
    error::Result,
    index::{VersionMap, compare_names, versions_of},
    manifest::{self, DependencyBucket},
    resolver::types::ChangeRecord,
    workspace::Workspace,
};

/// Move every workspace declaring `package` at a version other than
/// `target` onto `target`.
///
/// The entry is rewritten in the first bucket that holds the package on
/// disk. Workspaces already at `target` produce no record, which makes a
/// second run after a commit a no-op. A failure aborts the remaining
/// workspaces; writes already made stay on disk.
pub async fn sync_to_version(
    package: &str,
    target: &str,
    versions: &VersionMap<'_>,
    dry_run: bool,
) -> Result<Vec<ChangeRecord>> {
    let mut changes = vec![];

    for (version, workspaces) in versions {
        if version == target {
            continue;
        }

        for workspace in workspaces {
            let path = workspace.manifest_path();
            let mut doc = manifest::read(&path).await?;

            let Some((bucket, current)) = doc.locate(package) else {
                warn!(
                    "{} no longer declares {}: skipping",
                    workspace.name, package
                );
                continue;
            };
            let current = current.to_string();

            if &current != version {
                warn!(
                    "{} declares {} {} in {} but is grouped under {}",
                    workspace.name, package, current, bucket, version
                );
            }

            if current == target {
                debug!(
                    "{} already uses {} {}",
                    workspace.name, package, target
                );
                continue;
            }

            changes.push(ChangeRecord {
                package: package.to_string(),
                workspace: workspace.name.clone(),
                path: workspace.path.clone(),
                bucket,
                before: Some(current.to_string()),
                after: Some(target.to_string()),
            });

            if !dry_run {
                doc.set_dependency(bucket, package, target);
                manifest::write(&path, &doc).await?;
                info!(
                    "{}: {} {} -> {}",
                    workspace.name, package, current, target
                );
            }
        }
    }

    Ok(changes)
}

/// Add `package` at `version` to `bucket` of every target workspace, or
/// update it when already present there.
pub async fn apply_update(
    package: &str,
    version: &str,
    bucket: DependencyBucket,
    targets: &[&Workspace],
    dry_run: bool,
) -> Result<Vec<ChangeRecord>> {
    let mut changes = vec![];

    for workspace in targets {
        let path = workspace.manifest_path();
        let mut doc = manifest::read(&path).await?;

        let before = doc.dependency(bucket, package).map(str::to_string);
        if before.as_deref() == Some(version) {
            debug!("{} already has {} {}", workspace.name, package, version);
            continue;
        }

        doc.set_dependency(bucket, package, version);

        changes.push(ChangeRecord {
            package: package.to_string(),
            workspace: workspace.name.clone(),
            path: workspace.path.clone(),
            bucket,
            before,
            after: Some(version.to_string()),
        });

        if !dry_run {
            manifest::write(&path, &doc).await?;
            info!(
                "{}: set {} {} in {}",
                workspace.name, package, version, bucket
            );
        }
    }

    Ok(changes)
}

/// Remove `package` from the first bucket declaring it in each target
/// workspace. Workspaces without it are left untouched.
pub async fn apply_removal(
    package: &str,
    targets: &[&Workspace],
    dry_run: bool,
) -> Result<Vec<ChangeRecord>> {
    let mut changes = vec![];

    for workspace in targets {
        let path = workspace.manifest_path();
        let mut doc = manifest::read(&path).await?;

        let Some((bucket, _)) = doc.locate(package) else {
            debug!("{} does not declare {}", workspace.name, package);
            continue;
        };

        let removed = doc.remove_dependency(bucket, package);

        changes.push(ChangeRecord {
            package: package.to_string(),
            workspace: workspace.name.clone(),
            path: workspace.path.clone(),
            bucket,
            before: removed,
            after: None,
        });

        if !dry_run {
            manifest::write(&path, &doc).await?;
            info!("{}: removed {} from {}", workspace.name, package, bucket);
        }
    }

    Ok(changes)
}

/// Every package declared anywhere, sorted by name.
pub fn packages_in_use(workspaces: &[Workspace]) -> Vec<String> {
    let mut packages: Vec<String> = workspaces
        .iter()
        .flat_map(|w| w.manifest.merged_dependencies().into_keys())
        .map(str::to_string)
        .collect();

    packages.sort_by(|a, b| compare_names(a, b));
    packages.dedup();
    packages
}

/// What syncing a single package would involve.
#[derive(Debug)]
pub enum SyncCandidates<'a> {
    NotFound,
    AlreadySynced(String),
    Conflicted(VersionMap<'a>),
}

pub fn sync_candidates<'a>(
    package: &str,
    workspaces: &'a [Workspace],
) -> SyncCandidates<'a> {
    let versions = versions_of(package, workspaces);

    match versions.len() {
        0 => SyncCandidates::NotFound,
        1 => versions
            .into_keys()
            .next()
            .map(SyncCandidates::AlreadySynced)
            .unwrap_or(SyncCandidates::NotFound),
        _ => SyncCandidates::Conflicted(versions),
    }
}

/// A planned manifest change that can be previewed and then committed with
/// identical arguments.
#[derive(Debug, Clone)]
pub enum Mutation<'a> {
    Update {
        package: String,
        version: String,
        bucket: DependencyBucket,
        targets: Vec<&'a Workspace>,
    },
    Removal {
        package: String,
        targets: Vec<&'a Workspace>,
    },
    Sync {
        package: String,
        target: String,
        versions: VersionMap<'a>,
    },
}

impl Mutation<'_> {
    pub async fn run(&self, dry_run: bool) -> Result<Vec<ChangeRecord>> {
        match self {
            Mutation::Update {
                package,
                version,
                bucket,
                targets,
            } => {
                apply_update(package, version, *bucket, targets, dry_run).await
            }
            Mutation::Removal { package, targets } => {
                apply_removal(package, targets, dry_run).await
            }
            Mutation::Sync {
                package,
                target,
                versions,
            } => sync_to_version(package, target, versions, dry_run).await,
        }
    }

    /// Workspace directories to offer an install for afterwards.
    pub fn affected_paths(&self) -> Vec<PathBuf> {
        let workspaces: Vec<&Workspace> = match self {
            Mutation::Update { targets, .. }
            | Mutation::Removal { targets, .. } => targets.clone(),
            Mutation::Sync { versions, .. } => {
                versions.values().flatten().copied().collect()
            }
        };

        let mut paths: Vec<PathBuf> = vec![];
        for workspace in workspaces {
            if !paths.contains(&workspace.path) {
                paths.push(workspace.path.clone());
            }
        }
        paths
    }

    /// Short noun used in headings, e.g. "Update", "Removal".
    pub fn title(&self) -> &'static str {
        match self {
            Mutation::Update { .. } => "Update",
            Mutation::Removal { .. } => "Removal",
            Mutation::Sync { .. } => "Sync",
        }
    }
}
