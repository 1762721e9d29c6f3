//! `install`: run the package manager install step on demand.
use std::path::PathBuf;

use crate::{
    command::{
        common,
        types::{Outcome, Session},
    },
    error::Result,
};

pub async fn execute(
    session: &Session<'_>,
    workspaces: &[String],
) -> Result<Outcome> {
    let paths: Vec<PathBuf> = if workspaces.is_empty() {
        session.repo.workspaces.iter().map(|w| w.path.clone()).collect()
    } else {
        common::resolve_workspaces(session, workspaces)?
            .into_iter()
            .map(|w| w.path.clone())
            .collect()
    };

    if paths.is_empty() {
        return Ok(Outcome::NothingToDo);
    }

    if session.options.dry_run {
        println!(
            "Would run {} in {} location(s)",
            session.manager.install_command(),
            paths.len()
        );
        return Ok(Outcome::Completed);
    }

    if session.options.install == Some(false) {
        common::print_manual_install(
            session,
            &paths,
            session.repo.uses_workspaces_field(),
        );
        return Ok(Outcome::Completed);
    }

    common::run_install(session, &paths).await?;

    Ok(Outcome::Completed)
}
