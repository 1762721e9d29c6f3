//! `remove`: delete a dependency from the workspaces declaring it.
use crate::{
    command::{
        common,
        types::{Outcome, Session},
    },
    error::Result,
    resolver::{Mutation, operations::packages_in_use},
    ui::render,
};

pub async fn execute(
    session: &Session<'_>,
    package: Option<String>,
    workspaces: &[String],
) -> Result<Outcome> {
    let package = match package {
        Some(package) => package.trim().to_string(),
        None => {
            let packages = packages_in_use(&session.repo.workspaces);
            if packages.is_empty() {
                println!("No dependencies declared in any workspace");
                return Ok(Outcome::NothingToDo);
            }
            let picked = session.prompt.select(
                "Select package to remove",
                &packages,
                0,
            )?;
            packages[picked.min(packages.len() - 1)].clone()
        }
    };

    let declaring = session.repo.declaring(&package);
    if declaring.is_empty() {
        println!(
            "{}",
            render::note(
                "No package found",
                &[format!("{package} is not declared in any workspace")]
            )
        );
        return Ok(Outcome::NothingToDo);
    }

    let targets = if workspaces.is_empty() {
        common::pick_workspaces(
            session,
            "Select workspaces to remove from",
            &declaring,
            true,
        )?
    } else {
        common::resolve_workspaces(session, workspaces)?
            .into_iter()
            .filter(|w| w.declares(&package))
            .collect()
    };

    if targets.is_empty() {
        return Ok(Outcome::NothingToDo);
    }

    let mutation = Mutation::Removal { package, targets };

    common::run_mutation(session, &mutation).await
}
