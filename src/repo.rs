//! Git operations used by the release flow.
//!
//! Wraps a local `git2::Repository` opened at the monorepo root and exposes
//! the handful of steps a release needs: a clean-tree check, staging the
//! files the release touched, committing, tagging and pushing.
//!
//! Commit and tag signatures come from `user.name` / `user.email` in the git
//! configuration. Pushing authenticates through the ssh agent or the
//! configured credential helper, the same way `git push` would.
use color_eyre::eyre::eyre;
use git2::{Cred, CredentialType, Oid, RemoteCallbacks, StatusOptions};
use log::*;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Build remote callbacks that try the ssh agent first, then the credential
/// helper, and report refs the remote rejected as errors.
fn get_auth_callbacks<'r>(config: git2::Config) -> RemoteCallbacks<'r> {
    let mut callbacks = RemoteCallbacks::new();

    callbacks.credentials(move |url, username, allowed| {
        if allowed.contains(CredentialType::SSH_KEY)
            && let Some(user) = username
        {
            return Cred::ssh_key_from_agent(user);
        }

        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            return Cred::credential_helper(&config, url, username);
        }

        Cred::default()
    });

    callbacks.push_update_reference(|refname, status| match status {
        Some(msg) => Err(git2::Error::from_str(&format!(
            "remote rejected {refname}: {msg}"
        ))),
        None => Ok(()),
    });

    callbacks
}

/// Local git repository the release is cut in.
pub struct Repository {
    repo: git2::Repository,
}

impl Repository {
    /// Open the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = git2::Repository::discover(path)?;
        debug!("opened git repository at {}", repo.path().display());
        Ok(Self { repo })
    }

    /// Repository working directory.
    pub fn workdir(&self) -> Result<&Path> {
        Ok(self
            .repo
            .workdir()
            .ok_or_else(|| eyre!("Repository has no working directory"))?)
    }

    /// Tracked files with uncommitted changes, staged or not. Untracked and
    /// ignored files do not count.
    pub fn dirty_files(&self) -> Result<Vec<String>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;

        Ok(statuses
            .iter()
            .filter(|entry| !entry.status().is_empty())
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect())
    }

    pub fn is_clean(&self) -> Result<bool> {
        Ok(self.dirty_files()?.is_empty())
    }

    /// Short name of the checked out branch.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(
                eyre!("HEAD is detached; check out a branch first").into()
            );
        }

        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| eyre!("branch name is not valid UTF-8").into())
    }

    /// Stage `paths`, which may be absolute or relative to the working
    /// directory.
    pub fn add_paths(&self, paths: &[PathBuf]) -> Result<()> {
        let workdir = self.workdir()?;
        let canonical = std::fs::canonicalize(workdir)?;
        let mut index = self.repo.index()?;

        for path in paths {
            let relative = path
                .strip_prefix(&canonical)
                .or_else(|_| path.strip_prefix(workdir))
                .unwrap_or(path);
            debug!("staging {}", relative.display());
            index.add_path(relative)?;
        }

        index.write()?;
        Ok(())
    }

    /// Commit the index on top of HEAD and return the new commit id.
    pub fn commit(&self, msg: &str) -> Result<String> {
        debug!("committing changes with msg: {msg}");
        let signature = self.signature()?;

        let mut index = self.repo.index()?;
        let oid = index.write_tree()?;
        let tree = self.repo.find_tree(oid)?;

        let parent =
            self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let commit = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            msg,
            &tree,
            &parents,
        )?;

        Ok(commit.to_string())
    }

    /// Create an annotated tag on `commit_str` carrying `message`.
    pub fn tag_commit(
        &self,
        tag: &str,
        commit_str: &str,
        message: &str,
    ) -> Result<()> {
        info!("creating tag {tag}");
        let tagger = self.signature()?;

        let oid = Oid::from_str(commit_str)?;
        let commit = self.repo.find_commit(oid)?;

        self.repo
            .tag(tag, commit.as_object(), &tagger, message, false)?;

        Ok(())
    }

    pub fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        info!("pushing branch {branch} to {remote}");
        self.push(remote, &format!("refs/heads/{branch}:refs/heads/{branch}"))
    }

    pub fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        info!("pushing tag {tag} to {remote}");
        self.push(remote, &format!("refs/tags/{tag}:refs/tags/{tag}"))
    }

    fn push(&self, remote: &str, ref_spec: &str) -> Result<()> {
        let config = self.repo.config()?.snapshot()?;
        let mut push_opts = git2::PushOptions::default();
        push_opts.remote_callbacks(get_auth_callbacks(config));

        let mut remote = self.repo.find_remote(remote)?;
        remote.push(&[ref_spec], Some(&mut push_opts))?;

        Ok(())
    }

    fn signature(&self) -> Result<git2::Signature<'static>> {
        let config = self.repo.config()?.snapshot()?;
        let user = config.get_str("user.name")?;
        let email = config.get_str("user.email")?;
        debug!("using signature: user: {user}, email: {email}");
        Ok(git2::Signature::now(user, email)?)
    }
}
