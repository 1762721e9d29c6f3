//! `sync`: align one package on a single version everywhere.
use crate::{
    command::{
        common,
        types::{Outcome, Session},
    },
    error::{AlignerError, Result},
    index::VersionMap,
    resolver::{Mutation, SyncCandidates, operations::sync_candidates},
    ui::render,
};

pub async fn execute(
    session: &Session<'_>,
    package: Option<String>,
    to: Option<String>,
) -> Result<Outcome> {
    let package = match package {
        Some(package) => package.trim().to_string(),
        None => session.prompt.input("Package name to sync", "")?,
    };

    let versions = match sync_candidates(&package, &session.repo.workspaces) {
        SyncCandidates::NotFound => {
            println!(
                "{}",
                render::note(
                    "No package found",
                    &[format!("{package} is not declared in any workspace")]
                )
            );
            return Ok(Outcome::NothingToDo);
        }
        SyncCandidates::AlreadySynced(version) => {
            println!(
                "{}",
                render::note(
                    "Already synced",
                    &[format!("{package} is consistently at {version}")]
                )
            );
            return Ok(Outcome::NothingToDo);
        }
        SyncCandidates::Conflicted(versions) => versions,
    };

    let title = format!("Current versions of {package}");
    println!("{}", render::note(&title, &describe(&versions)));

    let target = match to {
        Some(target) => target.trim().to_string(),
        None => {
            let labels: Vec<String> = versions
                .iter()
                .map(|(version, users)| {
                    format!(
                        "{} (used in {} workspace{})",
                        version,
                        users.len(),
                        if users.len() == 1 { "" } else { "s" }
                    )
                })
                .collect();
            let picked = session.prompt.select(
                "Select version to sync to",
                &labels,
                0,
            )?;
            versions
                .get_index(picked)
                .map(|(version, _)| version.clone())
                .ok_or_else(|| {
                    AlignerError::invalid_args("no version selected")
                })?
        }
    };

    if target.is_empty() {
        return Err(AlignerError::invalid_args("target version is required"));
    }

    let mutation = Mutation::Sync {
        package,
        target,
        versions,
    };

    common::run_mutation(session, &mutation).await
}

fn describe(versions: &VersionMap<'_>) -> Vec<String> {
    let mut lines = vec![];
    for (version, users) in versions {
        lines.push(format!("{version}:"));
        for workspace in users {
            lines.push(format!("  - {}", workspace.name));
        }
    }
    lines
}
