//! `conflicts`: find packages declared at several versions and resolve them.
use log::*;

use crate::{
    command::{
        common,
        types::{Outcome, Session},
    },
    conflict::{self, Conflict},
    error::Result,
    index::DependencyIndex,
    resolver::{self, Strategy},
    ui::render,
};

pub async fn execute(
    session: &Session<'_>,
    strategy: Option<Strategy>,
) -> Result<Outcome> {
    let index = DependencyIndex::build(&session.repo.workspaces);
    let conflicts = conflict::detect(&index);

    println!("{}", render::conflicts(&conflicts));

    if conflicts.is_empty() {
        return Ok(Outcome::NothingToDo);
    }

    let strategy = match strategy {
        Some(strategy) => strategy,
        None => {
            let labels: Vec<String> =
                Strategy::all().iter().map(|s| s.label().to_string()).collect();
            let picked = session.prompt.select(
                "How would you like to resolve these conflicts?",
                &labels,
                0,
            )?;
            Strategy::all()[picked.min(labels.len() - 1)]
        }
    };

    let conflicts = match strategy {
        Strategy::Specific => pick_conflicts(session, conflicts)?,
        _ => conflicts,
    };

    if conflicts.is_empty() {
        info!("no packages selected");
        return Ok(Outcome::NothingToDo);
    }

    if session.options.dry_run {
        let planned = resolver::resolve(
            strategy,
            &conflicts,
            session.chooser,
            session.registry,
            true,
        )
        .await?;
        println!("{}", render::changes(&planned.changes, true));
        info!("dry run: no files written");
        return Ok(Outcome::Completed);
    }

    if matches!(strategy, Strategy::MostCommon | Strategy::Latest)
        && !session.options.yes
    {
        let prompt = format!(
            "{} for {} package(s)?",
            strategy.label(),
            conflicts.len()
        );
        if !session.chooser.confirm(&prompt, true)? {
            return Ok(Outcome::Cancelled);
        }
    }

    let resolution = resolver::resolve(
        strategy,
        &conflicts,
        session.chooser,
        session.registry,
        false,
    )
    .await?;

    println!("{}", render::changes(&resolution.changes, false));
    println!("{}", render::resolution(&resolution));

    if resolution.changes.is_empty() {
        return Ok(Outcome::NothingToDo);
    }

    common::offer_install(session, &resolution.affected).await?;

    Ok(Outcome::Completed)
}

/// Narrow `conflicts` down to the packages the user ticks.
fn pick_conflicts<'a>(
    session: &Session<'_>,
    conflicts: Vec<Conflict<'a>>,
) -> Result<Vec<Conflict<'a>>> {
    let labels: Vec<String> = conflicts
        .iter()
        .map(|c| format!("{} ({} versions)", c.package, c.versions.len()))
        .collect();
    let checked = vec![false; conflicts.len()];

    let picked = session.prompt.multi_select(
        "Select packages to resolve",
        &labels,
        &checked,
    )?;

    Ok(conflicts
        .into_iter()
        .enumerate()
        .filter(|(i, _)| picked.contains(i))
        .map(|(_, conflict)| conflict)
        .collect())
}
