//! Plain-text views of scan results, conflicts and change sets.
//!
//! Everything here returns a `String` so callers decide where it goes and
//! tests can inspect it.
use console::style;
use std::{fmt::Write, path::Path};

use crate::{
    conflict::Conflict,
    index::DependencyIndex,
    installer::InstallReport,
    resolver::{ChangeAction, ChangeRecord, Resolution},
    workspace::Monorepo,
};

pub fn workspaces(repo: &Monorepo) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        style(format!("Found {} workspace(s)", repo.len())).bold()
    );

    for workspace in &repo.workspaces {
        let _ = writeln!(
            out,
            "  {} {} {}",
            style(workspace.kind.tag()).cyan(),
            workspace.name,
            style(workspace.relative_path(&repo.root)).dim()
        );
    }

    out
}

pub fn conflicts(conflicts: &[Conflict<'_>]) -> String {
    let mut out = String::new();

    if conflicts.is_empty() {
        let _ =
            writeln!(out, "{}", style("No version conflicts found").green());
        return out;
    }

    let _ = writeln!(
        out,
        "{}",
        style(format!("Found {} version conflict(s)", conflicts.len()))
            .yellow()
            .bold()
    );

    for conflict in conflicts {
        let _ = writeln!(out, "\n  {}", style(&conflict.package).bold());
        for (version, users) in &conflict.versions {
            let names: Vec<&str> =
                users.iter().map(|w| w.name.as_str()).collect();
            let _ = writeln!(
                out,
                "    {} {}",
                style(version).yellow(),
                style(names.join(", ")).dim()
            );
        }
    }

    out
}

/// Every package with the versions in use; conflicted ones are flagged.
pub fn packages(index: &DependencyIndex<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        style(format!("{} package(s) in use", index.len())).bold()
    );

    for (package, versions) in index.sorted() {
        let listed: Vec<&str> = versions.keys().map(String::as_str).collect();
        let marker = if versions.len() > 1 {
            style("!").red().bold().to_string()
        } else {
            " ".to_string()
        };
        let _ = writeln!(
            out,
            "{} {} {}",
            marker,
            package,
            style(listed.join(" | ")).dim()
        );
    }

    out
}

pub fn changes(records: &[ChangeRecord], dry_run: bool) -> String {
    let mut out = String::new();

    if records.is_empty() {
        let _ = writeln!(out, "{}", style("Nothing to change").dim());
        return out;
    }

    let heading = if dry_run {
        "Planned changes"
    } else {
        "Applied changes"
    };
    let _ = writeln!(out, "{}", style(heading).bold());

    for record in records {
        let before = record.before.as_deref().unwrap_or("-");
        let after = record.after.as_deref().unwrap_or("-");
        let (sign, detail) = match record.action() {
            ChangeAction::Add => (style("+").green(), after.to_string()),
            ChangeAction::Update => {
                (style("~").yellow(), format!("{before} -> {after}"))
            }
            ChangeAction::Remove => (style("-").red(), before.to_string()),
        };
        let _ = writeln!(
            out,
            "  {} {} {} {} {}",
            sign,
            record.workspace,
            style(format!("({})", record.bucket)).dim(),
            record.package,
            detail
        );
    }

    out
}

pub fn resolution(resolution: &Resolution) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        style(format!(
            "Updated {} manifest entr{}",
            resolution.changes.len(),
            if resolution.changes.len() == 1 { "y" } else { "ies" }
        ))
        .green()
    );
    if !resolution.skipped.is_empty() {
        let _ = writeln!(
            out,
            "{} {}",
            style("Skipped:").dim(),
            resolution.skipped.join(", ")
        );
    }
    out
}

pub fn install_report(report: &InstallReport, root: &Path) -> String {
    let mut out = String::new();

    for dir in &report.succeeded {
        let _ = writeln!(
            out,
            "  {} {}",
            style("✔").green(),
            relative(dir, root)
        );
    }
    for failure in &report.failed {
        let _ = writeln!(
            out,
            "  {} {} {}",
            style("✘").red(),
            relative(&failure.dir, root),
            style(&failure.error).dim()
        );
    }

    out
}

/// Boxed note, used for manual install instructions and release plans.
pub fn note(title: &str, lines: &[String]) -> String {
    let width = lines
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(title.chars().count()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "┌ {} {}┐",
        style(title).bold(),
        "─".repeat(width - title.chars().count())
    );
    for line in lines {
        let pad = width - line.chars().count();
        let _ = writeln!(out, "│ {}{} │", line, " ".repeat(pad));
    }
    let _ = writeln!(out, "└{}┘", "─".repeat(width + 2));
    out
}

fn relative(dir: &Path, root: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".into(),
        Ok(rel) => rel.display().to_string(),
        Err(_) => dir.display().to_string(),
    }
}
