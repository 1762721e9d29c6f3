//! Conflict resolution engine.
//!
//! Each strategy walks the conflicts in order, settles on one target version
//! per package and hands it to [`operations::sync_to_version`]. With
//! `dry_run` the same decisions are made and the planned changes returned
//! without writing.
//! Prompts and registry lookups go through the traits in [`traits`] so the
//! engine itself never touches the terminal or the network.
use log::*;

use crate::{
    conflict::Conflict,
    error::{AlignerError, Result},
    registry::is_version_newer,
};

pub mod operations;
pub mod traits;
pub mod types;

pub use operations::{Mutation, SyncCandidates, sync_to_version};
pub use traits::{Chooser, Installer, RegistryLookup};
pub use types::{
    ChangeAction, ChangeRecord, ChoiceMode, ChoiceRequest, LATEST_TAG,
    Resolution, Strategy, VersionChoice, VersionOption,
};

/// Resolve every conflict to the version used by the most workspaces.
pub async fn resolve_most_common(
    conflicts: &[Conflict<'_>],
    dry_run: bool,
) -> Result<Resolution> {
    let mut resolution = Resolution::default();

    for conflict in conflicts {
        let Some(target) = conflict.most_common_version() else {
            continue;
        };

        info!(
            "resolving {} to most common version {}",
            conflict.package, target
        );

        let changes = sync_to_version(
            &conflict.package,
            target,
            &conflict.versions,
            dry_run,
        )
        .await?;
        resolution.record(conflict, changes);
    }

    Ok(resolution)
}

/// Resolve every conflict to the registry's latest version, or the literal
/// `latest` tag when the lookup fails.
pub async fn resolve_to_latest(
    conflicts: &[Conflict<'_>],
    registry: &dyn RegistryLookup,
    dry_run: bool,
) -> Result<Resolution> {
    let mut resolution = Resolution::default();

    for conflict in conflicts {
        let target = latest_or_tag(registry, &conflict.package).await;

        info!("resolving {} to latest version {}", conflict.package, target);

        let changes = sync_to_version(
            &conflict.package,
            &target,
            &conflict.versions,
            dry_run,
        )
        .await?;
        resolution.record(conflict, changes);
    }

    Ok(resolution)
}

/// Ask for one version per package from a short list of in-use versions,
/// latest, custom or skip.
pub async fn resolve_bulk_choice(
    conflicts: &[Conflict<'_>],
    chooser: &dyn Chooser,
    registry: &dyn RegistryLookup,
    dry_run: bool,
) -> Result<Resolution> {
    let mut resolution = Resolution::default();

    for conflict in conflicts {
        let request =
            ChoiceRequest::new(conflict, None, false, ChoiceMode::Bulk);
        let choice = chooser.choose_version(&request)?;
        apply_choice(conflict, choice, None, registry, dry_run, &mut resolution)
            .await?;
    }

    Ok(resolution)
}

/// Resolve conflicts one at a time, showing current versions and the
/// registry's latest version before each choice.
pub async fn resolve_interactive(
    conflicts: &[Conflict<'_>],
    chooser: &dyn Chooser,
    registry: &dyn RegistryLookup,
    dry_run: bool,
) -> Result<Resolution> {
    let mut resolution = Resolution::default();

    for conflict in conflicts {
        let latest = registry.latest_version(&conflict.package).await;
        let latest_is_newer = latest
            .as_deref()
            .is_some_and(|l| is_version_newer(l, &conflict.current_versions()));

        let request = ChoiceRequest::new(
            conflict,
            latest.clone(),
            latest_is_newer,
            ChoiceMode::Interactive,
        );
        let choice = chooser.choose_version(&request)?;
        apply_choice(
            conflict,
            choice,
            latest,
            registry,
            dry_run,
            &mut resolution,
        )
        .await?;
    }

    Ok(resolution)
}

/// Run `strategy` over `conflicts`. [`Strategy::Specific`] resolves the
/// conflicts it is given interactively; narrowing them down is up to the
/// caller.
pub async fn resolve(
    strategy: Strategy,
    conflicts: &[Conflict<'_>],
    chooser: &dyn Chooser,
    registry: &dyn RegistryLookup,
    dry_run: bool,
) -> Result<Resolution> {
    match strategy {
        Strategy::Interactive | Strategy::Specific => {
            resolve_interactive(conflicts, chooser, registry, dry_run).await
        }
        Strategy::Bulk => {
            resolve_bulk_choice(conflicts, chooser, registry, dry_run).await
        }
        Strategy::MostCommon => resolve_most_common(conflicts, dry_run).await,
        Strategy::Latest => {
            resolve_to_latest(conflicts, registry, dry_run).await
        }
    }
}

async fn apply_choice(
    conflict: &Conflict<'_>,
    choice: VersionChoice,
    known_latest: Option<String>,
    registry: &dyn RegistryLookup,
    dry_run: bool,
    resolution: &mut Resolution,
) -> Result<()> {
    let target = match choice {
        VersionChoice::Skip => {
            info!("skipped resolution for {}", conflict.package);
            resolution.skip(&conflict.package);
            return Ok(());
        }
        VersionChoice::InUse(version) | VersionChoice::Custom(version) => {
            version
        }
        VersionChoice::Latest => match known_latest {
            Some(latest) => latest,
            None => latest_or_tag(registry, &conflict.package).await,
        },
    };

    let target = target.trim();
    if target.is_empty() {
        return Err(AlignerError::invalid_args(format!(
            "empty version chosen for {}",
            conflict.package
        )));
    }

    let changes =
        sync_to_version(&conflict.package, target, &conflict.versions, dry_run)
            .await?;
    resolution.record(conflict, changes);

    Ok(())
}

async fn latest_or_tag(registry: &dyn RegistryLookup, package: &str) -> String {
    match registry.latest_version(package).await {
        Some(latest) => latest,
        None => {
            warn!("no registry version for {package}: using \"{LATEST_TAG}\"");
            LATEST_TAG.to_string()
        }
    }
}
