//! `list`: workspaces and every dependency in use.
use crate::{
    command::types::{Outcome, Session},
    error::Result,
    index::DependencyIndex,
    ui::render,
};

pub fn execute(session: &Session<'_>) -> Result<Outcome> {
    let index = DependencyIndex::build(&session.repo.workspaces);

    println!("{}", render::workspaces(session.repo));
    println!("{}", render::packages(&index));

    if index.is_empty() {
        return Ok(Outcome::NothingToDo);
    }

    Ok(Outcome::Completed)
}
