//! Locate the git checkout that owns a package.

use super::process::{check_output, find_executable, run_with_timeout};
use camino::{Utf8Path, Utf8PathBuf};
use core::fmt::{Display, Formatter};
use core::time::Duration;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;

const LOG_TARGET: &str = "  repository";

/// Remote preferred as the provenance of a checkout when it exists.
const PRIMARY_REMOTE: &str = "origin";

/// A configured remote of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub url: String,
}

/// The root of a git working tree and how it is connected to the outside world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    root: Utf8PathBuf,
    remote_names: Vec<String>,
    primary_remote: Option<Remote>,
}

impl Repository {
    #[must_use]
    pub const fn new(root: Utf8PathBuf, remote_names: Vec<String>, primary_remote: Option<Remote>) -> Self {
        Self {
            root,
            remote_names,
            primary_remote,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Names of all configured remotes, in configuration order.
    #[must_use]
    pub fn remote_names(&self) -> &[String] {
        &self.remote_names
    }

    #[must_use]
    pub const fn primary_remote(&self) -> Option<&Remote> {
        self.primary_remote.as_ref()
    }

    /// Base name of the working tree's root directory.
    #[must_use]
    pub fn root_name(&self) -> &str {
        self.root.file_name().unwrap_or_else(|| self.root.as_str())
    }

    /// Short repository name: the primary remote's URL stem, or the root directory name without remotes.
    #[must_use]
    pub fn name(&self) -> String {
        self.primary_remote
            .as_ref()
            .map_or_else(|| self.root_name().to_string(), |remote| url_stem(&remote.url).to_string())
    }
}

/// Last path segment of a remote URL with its extension stripped.
///
/// Handles URL-style (`https://host/owner/repo.git`), scp-style (`git@host:owner/repo.git`),
/// and plain filesystem remotes alike.
#[must_use]
pub fn url_stem(url: &str) -> &str {
    let trimmed = url.trim_end_matches(['/', '\\']);
    let last = trimmed.rsplit(['/', '\\', ':']).next().unwrap_or(trimmed);

    match last.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => last,
    }
}

/// Why a directory could not be turned into a [`Repository`].
#[derive(Debug)]
pub enum ProbeError {
    /// The directory is not the root of a working tree; keep walking upward.
    NotAWorkingTree,

    /// The primary remote is listed but its URL cannot be read.
    NoRemote(String),

    /// The directory cannot be inspected.
    PermissionDenied(Utf8PathBuf),

    /// Anything else, including a failing or missing `git` executable.
    Other(ohno::AppError),
}

impl Display for ProbeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotAWorkingTree => write!(f, "not the root of a working tree"),
            Self::NoRemote(name) => write!(f, "remote '{name}' has no readable URL"),
            Self::PermissionDenied(path) => write!(f, "permission denied while inspecting '{path}'"),
            Self::Other(e) => write!(f, "{e:#}"),
        }
    }
}

#[derive(Debug, Clone)]
enum ProbeOutcome {
    Found(Repository),
    NotAWorkingTree,
    Failed,
}

/// Finds the checkout enclosing a package by walking up its parent directories.
///
/// The walk stops at the boundary directory (normally the invocation's working directory)
/// without probing it, so unrelated ancestor checkouts are never reported. Lookups never fail:
/// anything unexpected simply means "no repository".
#[derive(Debug)]
pub struct RepositoryLocator {
    boundary: Utf8PathBuf,
    git: Option<Utf8PathBuf>,
    git_timeout: Duration,
    probes: HashMap<Utf8PathBuf, ProbeOutcome>,
}

impl RepositoryLocator {
    #[must_use]
    pub fn new(boundary: &Utf8Path, git_timeout: Duration) -> Self {
        let boundary = boundary.canonicalize_utf8().unwrap_or_else(|_| boundary.to_path_buf());
        let git = find_executable("git");

        if git.is_none() {
            log::info!(target: LOG_TARGET, "No git executable found, repository attributes will be omitted");
        }

        Self {
            boundary,
            git,
            git_timeout,
            probes: HashMap::new(),
        }
    }

    /// Find the working tree that `path` belongs to.
    pub async fn locate(&mut self, path: &Utf8Path) -> Option<Repository> {
        let mut current = match path.canonicalize_utf8() {
            Ok(p) => p,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Could not resolve '{path}': {e}");
                return None;
            }
        };

        let mut visited = HashSet::new();
        loop {
            if current == self.boundary || !visited.insert(current.clone()) {
                return None;
            }

            match self.probe_cached(&current).await {
                ProbeOutcome::Found(repository) => return Some(repository),
                ProbeOutcome::Failed => return None,
                ProbeOutcome::NotAWorkingTree => {}
            }

            current = current.parent()?.to_path_buf();
        }
    }

    async fn probe_cached(&mut self, dir: &Utf8Path) -> ProbeOutcome {
        if let Some(outcome) = self.probes.get(dir) {
            return outcome.clone();
        }

        let outcome = match self.probe(dir).await {
            Ok(repository) => {
                log::debug!(target: LOG_TARGET, "Found working tree at '{dir}'");
                ProbeOutcome::Found(repository)
            }
            Err(ProbeError::NotAWorkingTree) => ProbeOutcome::NotAWorkingTree,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Giving up on '{dir}': {e}");
                ProbeOutcome::Failed
            }
        };

        let _ = self.probes.insert(dir.to_path_buf(), outcome.clone());
        outcome
    }

    async fn probe(&self, dir: &Utf8Path) -> Result<Repository, ProbeError> {
        match fs::symlink_metadata(dir.join(".git")) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ProbeError::NotAWorkingTree),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => return Err(ProbeError::PermissionDenied(dir.to_path_buf())),
            Err(e) => return Err(ProbeError::Other(ohno::app_err!("inspecting '{dir}': {e}"))),
        }

        let Some(git) = &self.git else {
            return Err(ProbeError::Other(ohno::app_err!("no git executable available")));
        };

        let output = run_with_timeout(git, &["-C", dir.as_str(), "remote"], self.git_timeout)
            .await
            .map_err(ProbeError::Other)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("not a git repository") {
                return Err(ProbeError::NotAWorkingTree);
            }
            return Err(ProbeError::Other(ohno::app_err!("git remote failed: {}", stderr.trim())));
        }

        let remote_names: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        let primary_name = remote_names
            .iter()
            .find(|name| *name == PRIMARY_REMOTE)
            .or_else(|| remote_names.first())
            .cloned();

        let primary_remote = match primary_name {
            Some(name) => Some(self.remote_url(dir, name).await?),
            None => None,
        };

        Ok(Repository::new(dir.to_path_buf(), remote_names, primary_remote))
    }

    async fn remote_url(&self, dir: &Utf8Path, name: String) -> Result<Remote, ProbeError> {
        let Some(git) = &self.git else {
            return Err(ProbeError::Other(ohno::app_err!("no git executable available")));
        };

        let output = run_with_timeout(git, &["-C", dir.as_str(), "remote", "get-url", name.as_str()], self.git_timeout)
            .await
            .map_err(ProbeError::Other)?;

        if check_output(&output, "git remote get-url").is_err() {
            return Err(ProbeError::NoRemote(name));
        }

        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if url.is_empty() {
            return Err(ProbeError::NoRemote(name));
        }

        Ok(Remote { name, url })
    }
}
