//! Steps shared by the manifest-changing actions.
use log::*;
use std::path::PathBuf;

use crate::{
    command::types::{Outcome, Session},
    error::{AlignerError, Result},
    installer,
    resolver::Mutation,
    ui::{self, render},
    workspace::{Workspace, WorkspaceKind},
};

/// Preview `mutation`, ask to apply it, apply it and offer an install.
///
/// With `--dry-run` only the preview is shown. With `--yes` the
/// confirmation is skipped.
pub async fn run_mutation(
    session: &Session<'_>,
    mutation: &Mutation<'_>,
) -> Result<Outcome> {
    let preview = mutation.run(true).await?;

    if preview.is_empty() {
        println!("{}", render::changes(&preview, true));
        return Ok(Outcome::NothingToDo);
    }

    println!("{} preview", mutation.title());
    println!("{}", render::changes(&preview, true));

    if session.options.dry_run {
        info!("dry run: no files written");
        return Ok(Outcome::Completed);
    }

    let apply = session.options.yes
        || session.chooser.confirm("Apply these changes?", false)?;
    if !apply {
        return Ok(Outcome::Cancelled);
    }

    let applied = mutation.run(false).await?;
    println!("{}", render::changes(&applied, false));

    offer_install(session, &mutation.affected_paths()).await?;

    Ok(Outcome::Completed)
}

/// Run the install step for `paths`, or print manual instructions when the
/// user opts out or an install fails.
pub async fn offer_install(
    session: &Session<'_>,
    paths: &[PathBuf],
) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }

    let install = match session.options.install {
        Some(install) => install,
        None if session.options.yes => true,
        None => session.chooser.confirm(
            "Install packages now? (Recommended after version changes)",
            true,
        )?,
    };

    if !install {
        let grouped = session.repo.uses_workspaces_field();
        print_manual_install(session, paths, grouped);
        return Ok(());
    }

    run_install(session, paths).await
}

/// Install in `paths` now and report per directory.
pub async fn run_install(
    session: &Session<'_>,
    paths: &[PathBuf],
) -> Result<()> {
    let spinner = ui::spinner("Installing packages...");
    let report = session.installer.install(paths).await;
    spinner.finish_and_clear();
    let report = report?;

    println!("{}", render::install_report(&report, &session.repo.root));

    if !report.is_success() {
        warn!("{} install(s) failed", report.failed.len());
        print_manual_install(session, &report.failed_dirs(), false);
    }

    Ok(())
}

pub fn print_manual_install(
    session: &Session<'_>,
    paths: &[PathBuf],
    grouped: bool,
) {
    let lines = installer::manual_instructions(
        session.manager,
        &session.repo.root,
        grouped,
        paths,
    );
    println!("{}", render::note("Install manually", &lines));
}

/// Look up workspaces given on the command line by name or path. Unknown
/// entries are reported and skipped.
pub fn resolve_workspaces<'a>(
    session: &Session<'a>,
    needles: &[String],
) -> Result<Vec<&'a Workspace>> {
    let mut found: Vec<&'a Workspace> = vec![];

    for needle in needles {
        match session.repo.find(needle) {
            Some(workspace) => {
                if !found.iter().any(|w| w.path == workspace.path) {
                    found.push(workspace);
                }
            }
            None => warn!("unknown workspace {needle}: ignoring"),
        }
    }

    if found.is_empty() {
        return Err(AlignerError::invalid_args(format!(
            "none of the given workspaces exist: {}",
            needles.join(", ")
        )));
    }

    Ok(found)
}

/// Label used for a workspace in pickers.
pub fn workspace_label(session: &Session<'_>, workspace: &Workspace) -> String {
    format!(
        "{} {} ({})",
        workspace.kind.tag(),
        workspace.name,
        workspace.relative_path(&session.repo.root)
    )
}

/// Pick a subset of `candidates`; every entry starts checked when
/// `all_checked`.
pub fn pick_workspaces<'a>(
    session: &Session<'_>,
    prompt: &str,
    candidates: &[&'a Workspace],
    all_checked: bool,
) -> Result<Vec<&'a Workspace>> {
    let labels: Vec<String> = candidates
        .iter()
        .map(|w| workspace_label(session, w))
        .collect();
    let checked = vec![all_checked; candidates.len()];

    let picked = session.prompt.multi_select(prompt, &labels, &checked)?;

    Ok(picked
        .into_iter()
        .filter_map(|i| candidates.get(i).copied())
        .collect())
}

/// Scope picker for the add flow: everything, some kinds, or a hand-picked
/// list.
pub fn pick_scope<'a>(session: &Session<'a>) -> Result<Vec<&'a Workspace>> {
    let scopes = vec![
        "All workspaces".to_string(),
        "By workspace type (root/apps/packages)".to_string(),
        "Custom selection".to_string(),
    ];

    match session.prompt.select("Select update scope", &scopes, 0)? {
        0 => Ok(session.repo.workspaces.iter().collect()),
        1 => {
            let kinds = [
                WorkspaceKind::Root,
                WorkspaceKind::App,
                WorkspaceKind::Package,
            ];
            let labels: Vec<String> =
                kinds.iter().map(|k| k.label().to_string()).collect();
            let picked = session.prompt.multi_select(
                "Select workspace types",
                &labels,
                &[false, true, true],
            )?;
            let chosen: Vec<WorkspaceKind> = picked
                .into_iter()
                .filter_map(|i| kinds.get(i).copied())
                .collect();
            Ok(session.repo.of_kinds(&chosen))
        }
        _ => {
            let all: Vec<&Workspace> = session.repo.workspaces.iter().collect();
            pick_workspaces(session, "Select workspaces", &all, false)
        }
    }
}
