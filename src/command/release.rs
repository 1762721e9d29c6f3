//! `release`: bump every manifest version, record notes, commit, tag and push.
use chrono::Local;
use log::*;
use semver::Version;
use std::{io, path::PathBuf};
use tokio::fs;

use crate::{
    command::types::{Outcome, Session},
    error::{AlignerError, Result},
    manifest,
    repo::Repository,
    ui::render,
    workspace::{Monorepo, WorkspaceKind},
};

const CHANGELOG_HEADER: &str = "# Changelog";

/// Everything a release is going to touch, worked out before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    pub current: Option<String>,
    pub next: Version,
    pub tag: String,
    pub notes: String,
    pub manifests: Vec<PathBuf>,
    pub changelog: PathBuf,
}

/// Version of the root manifest, or of the first workspace carrying one.
pub fn current_version(repo: &Monorepo) -> Option<String> {
    repo.root_workspace()
        .and_then(|root| root.manifest.version())
        .or_else(|| repo.workspaces.iter().find_map(|w| w.manifest.version()))
        .map(str::to_string)
}

/// Next patch release after `current`, or `0.1.0` when there is nothing to
/// bump.
pub fn suggest_next(current: Option<&str>) -> String {
    match current.and_then(|c| Version::parse(strip_v(c)).ok()) {
        Some(current) => {
            Version::new(current.major, current.minor, current.patch + 1)
                .to_string()
        }
        None => "0.1.0".into(),
    }
}

/// Parse `next` and make sure it moves forward from `current`. A current
/// version that is not valid semver is not compared against.
pub fn validate_next(current: Option<&str>, next: &str) -> Result<Version> {
    let next = Version::parse(strip_v(next.trim()))?;

    if let Some(current) = current.and_then(|c| Version::parse(strip_v(c)).ok())
        && next <= current
    {
        return Err(AlignerError::invalid_args(format!(
            "next version {next} must be greater than the current version {current}"
        )));
    }

    Ok(next)
}

/// Insert a dated section for `version` at the top of a changelog, below the
/// `# Changelog` header when the file has one.
pub fn prepend_changelog(
    existing: &str,
    version: &str,
    date: &str,
    notes: &str,
) -> String {
    let section = format!("## [{version}] - {date}\n\n{}\n", notes.trim());

    if existing.trim().is_empty() {
        return format!("{CHANGELOG_HEADER}\n\n{section}");
    }

    match existing.strip_prefix(CHANGELOG_HEADER) {
        Some(rest) => {
            let rest = rest.trim_start_matches(['\r', '\n']);
            if rest.is_empty() {
                format!("{CHANGELOG_HEADER}\n\n{section}")
            } else {
                format!("{CHANGELOG_HEADER}\n\n{section}\n{rest}")
            }
        }
        None => format!("{section}\n{existing}"),
    }
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

pub async fn execute(
    session: &Session<'_>,
    version: Option<String>,
    notes: Option<String>,
    no_push: bool,
) -> Result<Outcome> {
    let git = Repository::open(&session.repo.root)?;

    let dirty = git.dirty_files()?;
    if !dirty.is_empty() {
        println!("{}", render::note("Uncommitted changes", &dirty));
        return Err(AlignerError::invalid_args(
            "commit or stash your changes before releasing",
        ));
    }

    let current = current_version(session.repo);
    let next = next_version(session, current.as_deref(), version)?;
    let notes = release_notes(session, notes)?;
    let plan = build_plan(session, current, next, notes);

    let branch = if no_push {
        None
    } else {
        Some(git.current_branch()?)
    };

    let summary = describe(session, &plan, branch.as_deref());
    println!("{}", render::note("Release plan", &summary));

    if session.options.dry_run {
        info!("dry run: nothing written, committed or pushed");
        return Ok(Outcome::Completed);
    }

    let proceed = session.options.yes
        || session
            .chooser
            .confirm(&format!("Release {}?", plan.tag), false)?;
    if !proceed {
        return Ok(Outcome::Cancelled);
    }

    let mut touched = write_versions(&plan).await?;
    touched.push(write_changelog(&plan).await?);

    git.add_paths(&touched)?;
    let message = session
        .config
        .release
        .render_commit_message(&plan.next.to_string());
    let commit = git.commit(&message)?;
    git.tag_commit(&plan.tag, &commit, &plan.notes)?;
    info!("created release commit {commit} tagged {}", plan.tag);

    if let Some(branch) = branch {
        let remote = &session.config.release.remote;
        git.push_branch(remote, &branch)?;
        git.push_tag(remote, &plan.tag)?;
    } else {
        info!("skipping push: run git push --follow-tags when ready");
    }

    Ok(Outcome::Completed)
}

fn next_version(
    session: &Session<'_>,
    current: Option<&str>,
    flag: Option<String>,
) -> Result<Version> {
    if let Some(flag) = flag {
        return validate_next(current, &flag);
    }

    let suggestion = suggest_next(current);
    let prompt = match current {
        Some(current) => format!("Next version (current {current})"),
        None => "Next version".to_string(),
    };

    loop {
        let answer = session.prompt.input(&prompt, &suggestion)?;
        match validate_next(current, &answer) {
            Ok(version) => return Ok(version),
            Err(err) => warn!("{err}"),
        }
    }
}

fn release_notes(
    session: &Session<'_>,
    flag: Option<String>,
) -> Result<String> {
    if let Some(notes) = flag {
        let notes = notes.trim().to_string();
        if notes.is_empty() {
            return Err(AlignerError::invalid_args(
                "release notes are required",
            ));
        }
        return Ok(notes);
    }

    match session.prompt.editor("") {
        Ok(Some(notes)) if !notes.is_empty() => return Ok(notes),
        Ok(_) => debug!("editor closed without notes"),
        Err(err) if err.is_cancelled() => return Err(err),
        Err(err) => debug!("editor unavailable: {err}"),
    }

    session.prompt.input("Release notes", "")
}

fn build_plan(
    session: &Session<'_>,
    current: Option<String>,
    next: Version,
    notes: String,
) -> ReleasePlan {
    let manifests = session
        .repo
        .workspaces
        .iter()
        .filter(|w| {
            w.kind == WorkspaceKind::Root || w.manifest.version().is_some()
        })
        .map(|w| w.manifest_path())
        .collect();

    let release = &session.config.release;

    ReleasePlan {
        current,
        tag: release.tag_name(&next.to_string()),
        next,
        notes,
        manifests,
        changelog: session.repo.root.join(&release.changelog),
    }
}

fn describe(
    session: &Session<'_>,
    plan: &ReleasePlan,
    branch: Option<&str>,
) -> Vec<String> {
    let root = &session.repo.root;
    let relative = |path: &PathBuf| {
        path.strip_prefix(root)
            .unwrap_or(path)
            .display()
            .to_string()
    };

    let mut lines = vec![
        format!(
            "Version:   {} -> {}",
            plan.current.as_deref().unwrap_or("none"),
            plan.next
        ),
        format!("Tag:       {}", plan.tag),
        format!("Changelog: {}", relative(&plan.changelog)),
        format!("Manifests: {}", plan.manifests.len()),
    ];
    lines.extend(plan.manifests.iter().map(|p| format!("  - {}", relative(p))));

    lines.push(match branch {
        Some(branch) => format!(
            "Push:      {branch} and {} to {}",
            plan.tag, session.config.release.remote
        ),
        None => "Push:      skipped".to_string(),
    });

    lines
}

async fn write_versions(plan: &ReleasePlan) -> Result<Vec<PathBuf>> {
    let version = plan.next.to_string();
    let mut touched = vec![];

    for path in &plan.manifests {
        let mut current = manifest::read(path).await?;
        let previous = current.set_version(&version);
        debug!(
            "{}: version {} -> {version}",
            path.display(),
            previous.as_deref().unwrap_or("none")
        );
        manifest::write(path, &current).await?;
        touched.push(path.clone());
    }

    Ok(touched)
}

async fn write_changelog(plan: &ReleasePlan) -> Result<PathBuf> {
    let existing = match fs::read_to_string(&plan.changelog).await {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err.into()),
    };

    let date = Local::now().format("%Y-%m-%d").to_string();
    let version = plan.next.to_string();
    let updated = prepend_changelog(&existing, &version, &date, &plan.notes);

    fs::write(&plan.changelog, updated).await?;
    debug!("updated changelog {}", plan.changelog.display());

    Ok(plan.changelog.clone())
}
