//! `add`: add a dependency to workspaces, or update it where present.
use log::*;

use crate::{
    command::{
        common,
        types::{Outcome, Session},
    },
    error::{AlignerError, Result},
    manifest::DependencyBucket,
    resolver::{LATEST_TAG, Mutation},
    ui::{self, render},
};

/// Buckets in the order the picker offers them.
const BUCKET_CHOICES: [DependencyBucket; 3] = [
    DependencyBucket::DevDependencies,
    DependencyBucket::Dependencies,
    DependencyBucket::PeerDependencies,
];

pub async fn execute(
    session: &Session<'_>,
    package: Option<String>,
    version: Option<String>,
    bucket: Option<DependencyBucket>,
    workspaces: &[String],
) -> Result<Outcome> {
    let package = match package {
        Some(package) => package.trim().to_string(),
        None => {
            println!("{}", render::workspaces(session.repo));
            session.prompt.input("Package name", "")?
        }
    };
    if package.is_empty() {
        return Err(AlignerError::invalid_args("package name is required"));
    }

    let version = match version {
        Some(version) => version.trim().to_string(),
        None => prompt_version(session, &package).await?,
    };
    if version.is_empty() {
        return Err(AlignerError::invalid_args("version is required"));
    }

    let bucket = match bucket {
        Some(bucket) => bucket,
        None => {
            let labels: Vec<String> =
                BUCKET_CHOICES.iter().map(|b| b.to_string()).collect();
            let picked =
                session.prompt.select("Select dependency type", &labels, 0)?;
            BUCKET_CHOICES[picked.min(BUCKET_CHOICES.len() - 1)]
        }
    };

    let targets = if workspaces.is_empty() {
        common::pick_scope(session)?
    } else {
        common::resolve_workspaces(session, workspaces)?
    };

    if targets.is_empty() {
        warn!("no workspaces selected");
        return Ok(Outcome::NothingToDo);
    }

    let mutation = Mutation::Update {
        package,
        version,
        bucket,
        targets,
    };

    common::run_mutation(session, &mutation).await
}

/// Ask for a version, offering the registry's latest as the default.
async fn prompt_version(
    session: &Session<'_>,
    package: &str,
) -> Result<String> {
    let spinner =
        ui::spinner(format!("Looking up {package} on the registry..."));
    let latest = session.registry.latest_version(package).await;
    spinner.finish_and_clear();

    if let Some(latest) = &latest {
        let line = format!("Latest version of {package}: {latest}");
        println!("{}", render::note("Registry", &[line]));
    }

    let default = latest.as_deref().unwrap_or(LATEST_TAG);
    session.prompt.input("Package version", default)
}
