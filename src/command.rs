//! Action dispatch for version-aligner.
//!
//! Each action lives in its own module and takes a [`types::Session`]:
//! the scanned monorepo, the configuration and the collaborators an action
//! talks to (prompts, registry, installer). Actions return an
//! [`types::Outcome`] and never exit the process themselves; `main` maps the
//! outcome to an exit code.
//!
//! - **add**: add a dependency or update it where already declared
//! - **remove**: drop a dependency from chosen workspaces
//! - **sync**: align one package on a single version
//! - **conflicts**: detect version conflicts and resolve them with a strategy
//! - **list**: print workspaces and dependencies
//! - **install**: run the package manager install step
//! - **release**: bump versions, update the changelog, commit, tag and push
//!
//! Every manifest-changing action honours `--dry-run` and `--yes`.
use log::*;

use crate::{
    cli::{Action, Args, Command},
    config,
    error::Result,
    installer::{CommandInstaller, PackageManager},
    registry::NpmRegistry,
    ui::{self, TerminalPrompter},
    workspace,
};

pub mod add;
pub mod common;
pub mod conflicts;
pub mod install;
pub mod list;
pub mod release;
pub mod remove;
pub mod sync;
pub mod types;

use types::{Options, Outcome, Session};

#[cfg(test)]
mod tests;

/// Run `command`, or ask which action to run when none was given. Backing
/// out of any prompt ends the action with [`Outcome::Cancelled`].
pub async fn execute(
    session: &Session<'_>,
    command: Option<Command>,
) -> Result<Outcome> {
    let result = match command {
        Some(command) => dispatch(session, command).await,
        None => match pick_action(session) {
            Ok(action) => dispatch(session, action.into_command()).await,
            Err(err) => Err(err),
        },
    };

    match result {
        Err(err) if err.is_cancelled() => {
            debug!("prompt cancelled");
            Ok(Outcome::Cancelled)
        }
        other => other,
    }
}

fn pick_action(session: &Session<'_>) -> Result<Action> {
    let actions = Action::all();
    let labels: Vec<String> =
        actions.iter().map(|a| a.label().to_string()).collect();
    let picked = session
        .prompt
        .select("What would you like to do?", &labels, 0)?;
    Ok(actions[picked.min(actions.len() - 1)])
}

async fn dispatch(session: &Session<'_>, command: Command) -> Result<Outcome> {
    match command {
        Command::Add {
            package,
            version,
            bucket,
            workspaces,
        } => add::execute(session, package, version, bucket, &workspaces).await,
        Command::Remove {
            package,
            workspaces,
        } => remove::execute(session, package, &workspaces).await,
        Command::Sync { package, to } => {
            sync::execute(session, package, to).await
        }
        Command::Conflicts { strategy } => {
            conflicts::execute(session, strategy).await
        }
        Command::List => list::execute(session),
        Command::Install { workspaces } => {
            install::execute(session, &workspaces).await
        }
        Command::Release {
            version,
            notes,
            no_push,
        } => release::execute(session, version, notes, no_push).await,
    }
}

/// Build the terminal session for `args` and run the requested action.
pub async fn run(args: Args) -> Result<Outcome> {
    let spinner = ui::spinner("Scanning workspaces...");
    let scanned = workspace::scan(&args.root).await;
    spinner.finish_and_clear();
    let repo = scanned?;

    let config = config::load(&repo.root, args.config.as_deref()).await?;

    if repo.is_empty() {
        println!(
            "No workspaces found in {}: expected a package.json at the root, \
             in apps/* or in packages/*",
            repo.root.display()
        );
        return Ok(Outcome::NothingToDo);
    }

    let manager = args
        .package_manager
        .or(config.package_manager)
        .unwrap_or_else(|| PackageManager::detect(&repo.root));
    info!("using package manager: {manager}");

    let registry = NpmRegistry::new(config.registry_timeout());
    let installer = CommandInstaller::new(
        repo.root.clone(),
        manager,
        repo.uses_workspaces_field(),
        config.install_timeout(),
    );
    let prompter = TerminalPrompter::new();

    let session = Session {
        repo: &repo,
        config: &config,
        options: Options {
            dry_run: args.dry_run,
            yes: args.yes,
            install: args.install_preference(),
        },
        manager,
        prompt: &prompter,
        chooser: &prompter,
        registry: &registry,
        installer: &installer,
    };

    execute(&session, args.command).await
}
