//! Workspace discovery for `root`, `apps/*` and `packages/*` layouts.
use log::*;
use std::{
    fmt,
    path::{Path, PathBuf},
};
use tokio::fs;

use crate::{
    error::Result,
    manifest::{self, Manifest},
};

/// Directory holding application workspaces.
pub const APPS_DIR: &str = "apps";
/// Directory holding library workspaces.
pub const PACKAGES_DIR: &str = "packages";

/// Where in the repository layout a workspace was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkspaceKind {
    Root,
    App,
    Package,
}

impl WorkspaceKind {
    pub fn label(&self) -> &'static str {
        match self {
            WorkspaceKind::Root => "root",
            WorkspaceKind::App => "app",
            WorkspaceKind::Package => "package",
        }
    }

    /// Short tag shown before workspace names in pickers.
    pub fn tag(&self) -> &'static str {
        match self {
            WorkspaceKind::Root => "[ROOT]",
            WorkspaceKind::App => "[APP]",
            WorkspaceKind::Package => "[PKG]",
        }
    }
}

impl fmt::Display for WorkspaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A package directory with its own manifest.
///
/// `manifest` is the snapshot taken during the scan. Once a manifest is
/// rewritten on disk this copy is stale and only good for display.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub path: PathBuf,
    pub name: String,
    pub kind: WorkspaceKind,
    pub manifest: Manifest,
}

impl Workspace {
    pub fn manifest_path(&self) -> PathBuf {
        manifest::manifest_path(&self.path)
    }

    /// Path relative to `root`, or `.` for the root itself.
    pub fn relative_path(&self, root: &Path) -> String {
        match self.path.strip_prefix(root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".into(),
            Ok(rel) => rel.display().to_string().replace('\\', "/"),
            Err(_) => self.path.display().to_string(),
        }
    }

    /// True when any bucket of the snapshot declares `package`.
    pub fn declares(&self, package: &str) -> bool {
        self.manifest.locate(package).is_some()
    }
}

/// Immutable inventory of a monorepo produced by [`scan`].
#[derive(Debug, Clone)]
pub struct Monorepo {
    pub root: PathBuf,
    pub workspaces: Vec<Workspace>,
}

impl Monorepo {
    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn root_workspace(&self) -> Option<&Workspace> {
        self.workspaces
            .iter()
            .find(|w| w.kind == WorkspaceKind::Root)
    }

    /// True when the root manifest declares a `workspaces` field, meaning a
    /// single install at the root covers every workspace.
    pub fn uses_workspaces_field(&self) -> bool {
        self.root_workspace()
            .is_some_and(|w| w.manifest.declares_workspaces())
    }

    /// Look a workspace up by manifest name, absolute path or path relative
    /// to the root.
    pub fn find(&self, needle: &str) -> Option<&Workspace> {
        let needle_path = Path::new(needle);
        self.workspaces.iter().find(|w| {
            w.name == needle
                || w.path == needle_path
                || w.relative_path(&self.root) == needle.trim_end_matches('/')
        })
    }

    pub fn of_kinds(&self, kinds: &[WorkspaceKind]) -> Vec<&Workspace> {
        self.workspaces
            .iter()
            .filter(|w| kinds.contains(&w.kind))
            .collect()
    }

    pub fn declaring(&self, package: &str) -> Vec<&Workspace> {
        self.workspaces
            .iter()
            .filter(|w| w.declares(package))
            .collect()
    }
}

/// Scan `root` for workspaces: the root manifest first, then every child of
/// `apps/`, then every child of `packages/`.
///
/// Directories without a manifest are skipped. A manifest that exists but
/// does not parse aborts the scan.
pub async fn scan(root: &Path) -> Result<Monorepo> {
    let root = fs::canonicalize(root).await?;
    info!("scanning for workspaces in {}", root.display());

    let mut workspaces = vec![];

    let root_manifest_path = manifest::manifest_path(&root);
    if fs::try_exists(&root_manifest_path).await? {
        let manifest = manifest::read(&root_manifest_path).await?;
        let name = manifest.name().unwrap_or("root").to_string();
        workspaces.push(Workspace {
            path: root.clone(),
            name,
            kind: WorkspaceKind::Root,
            manifest,
        });
    } else {
        debug!("no root manifest found");
    }

    workspaces
        .extend(scan_dir(&root.join(APPS_DIR), WorkspaceKind::App).await?);
    workspaces.extend(
        scan_dir(&root.join(PACKAGES_DIR), WorkspaceKind::Package).await?,
    );

    info!("found {} workspaces", workspaces.len());

    Ok(Monorepo { root, workspaces })
}

async fn scan_dir(dir: &Path, kind: WorkspaceKind) -> Result<Vec<Workspace>> {
    if !fs::try_exists(dir).await? {
        debug!("no {} directory at {}", kind, dir.display());
        return Ok(vec![]);
    }

    let mut children = vec![];
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        // metadata follows symlinks, so linked workspace dirs count
        let path = entry.path();
        if fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            children.push(path);
        }
    }
    // read_dir order is platform dependent
    children.sort();

    let mut workspaces = vec![];

    for child in children {
        let manifest_path = manifest::manifest_path(&child);
        if !fs::try_exists(&manifest_path).await? {
            debug!("skipping {}: no manifest", child.display());
            continue;
        }

        let manifest = manifest::read(&manifest_path).await?;
        let dir_name = child
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = manifest.name().map(str::to_string).unwrap_or(dir_name);

        debug!("found {} workspace {} at {}", kind, name, child.display());

        workspaces.push(Workspace {
            path: child,
            name,
            kind,
            manifest,
        });
    }

    Ok(workspaces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AlignerError, test_helpers::MonorepoFixture};

    #[tokio::test]
    async fn scans_root_then_apps_then_packages() {
        let fixture = MonorepoFixture::new()
            .root(r#"{"name": "acme", "workspaces": ["apps/*", "packages/*"]}"#)
            .package("ui", r#"{"name": "@acme/ui"}"#)
            .app("web", r#"{"name": "@acme/web"}"#)
            .app("admin", r#"{"name": "@acme/admin"}"#);

        let repo = scan(fixture.path()).await.unwrap();

        let names: Vec<&str> =
            repo.workspaces.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["acme", "@acme/admin", "@acme/web", "@acme/ui"]);

        let kinds: Vec<WorkspaceKind> =
            repo.workspaces.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![
                WorkspaceKind::Root,
                WorkspaceKind::App,
                WorkspaceKind::App,
                WorkspaceKind::Package
            ]
        );
        assert!(repo.uses_workspaces_field());
    }

    #[tokio::test]
    async fn names_default_to_directory_or_root() {
        let fixture = MonorepoFixture::new()
            .root("{}")
            .app("docs", r#"{"private": true}"#);

        let repo = scan(fixture.path()).await.unwrap();

        assert_eq!(repo.workspaces[0].name, "root");
        assert_eq!(repo.workspaces[1].name, "docs");
        assert!(!repo.uses_workspaces_field());
    }

    #[tokio::test]
    async fn skips_directories_without_manifest() {
        let fixture = MonorepoFixture::new().app("web", r#"{"name": "web"}"#);
        std::fs::create_dir_all(fixture.path().join("apps/empty")).unwrap();
        std::fs::write(fixture.path().join("apps/README.md"), "# apps")
            .unwrap();

        let repo = scan(fixture.path()).await.unwrap();

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.workspaces[0].name, "web");
        assert!(repo.root_workspace().is_none());
    }

    #[tokio::test]
    async fn malformed_manifest_is_fatal() {
        let fixture = MonorepoFixture::new()
            .root(r#"{"name": "acme"}"#)
            .package("broken", r#"{"name": "broken", "#);

        let result = scan(fixture.path()).await;

        assert!(matches!(result, Err(AlignerError::Scan { .. })));
    }

    #[tokio::test]
    async fn find_accepts_name_or_relative_path() {
        let fixture = MonorepoFixture::new()
            .root(r#"{"name": "acme"}"#)
            .app("web", r#"{"name": "@acme/web"}"#);

        let repo = scan(fixture.path()).await.unwrap();

        assert_eq!(repo.find("@acme/web").unwrap().kind, WorkspaceKind::App);
        assert_eq!(repo.find("apps/web/").unwrap().name, "@acme/web");
        assert_eq!(repo.find(".").unwrap().kind, WorkspaceKind::Root);
        assert!(repo.find("apps/missing").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn follows_symlinked_workspace_dirs() {
        let fixture = MonorepoFixture::new().app("web", r#"{"name": "web"}"#);
        let outside = tempfile::TempDir::new().unwrap();
        std::fs::write(
            outside.path().join("package.json"),
            r#"{"name": "linked"}"#,
        )
        .unwrap();
        std::os::unix::fs::symlink(
            outside.path(),
            fixture.path().join("apps/linked"),
        )
        .unwrap();

        let repo = scan(fixture.path()).await.unwrap();

        let names: Vec<&str> =
            repo.workspaces.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["linked", "web"]);
        assert_eq!(repo.find("apps/linked").unwrap().kind, WorkspaceKind::App);
    }
}
