//! Local checkout provider
//!
//! Walks a working tree with `ignore` (so `.gitignore` is respected) and
//! reads the commit log from HEAD with libgit2. A directory that is not a
//! git repository has an empty commit log.

use super::{
    Credentials, Deadline, FetchOptions, PathFilter, ProviderError, ProviderResult,
    RepositoryProvider,
};
use crate::models::{CommitRecord, FileRecord, RepositoryId, RepositorySnapshot};
use chrono::{TimeZone, Utc};
use git2::{Repository, Sort};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Snapshot provider over a directory on disk.
pub struct LocalProvider {
    root: PathBuf,
    filter: PathFilter,
    max_files: usize,
    max_commits: usize,
}

impl LocalProvider {
    pub fn new(root: impl Into<PathBuf>, filter: PathFilter) -> Self {
        Self {
            root: root.into(),
            filter,
            max_files: 2000,
            max_commits: 1000,
        }
    }

    pub fn with_limits(mut self, max_files: usize, max_commits: usize) -> Self {
        self.max_files = max_files;
        self.max_commits = max_commits;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative, `/`-separated paths of every analyzable file, sorted.
    fn collect_paths(&self, deadline: &Deadline) -> ProviderResult<Vec<(String, PathBuf)>> {
        let walker = ignore::WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .require_git(false)
            .build();

        let mut paths = Vec::new();
        for entry in walker {
            deadline.check()?;
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            if self.filter.accept(&relative).is_none() {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if !self.filter.accepts_size(size) {
                debug!("Skipping {} ({} bytes)", relative, size);
                continue;
            }
            paths.push((relative, entry.path().to_path_buf()));
        }

        paths.sort_by(|a, b| a.0.cmp(&b.0));
        if paths.len() > self.max_files {
            warn!("{} analyzable files, keeping the first {}", paths.len(), self.max_files);
            paths.truncate(self.max_files);
        }
        Ok(paths)
    }

    fn read_commits(&self, deadline: &Deadline) -> ProviderResult<(String, Vec<CommitRecord>)> {
        let repo = match Repository::open(&self.root) {
            Ok(repo) => repo,
            Err(_) => {
                debug!("{} is not a git repository; no commit log", self.root.display());
                return Ok((String::new(), Vec::new()));
            }
        };

        let branch = repo
            .head()
            .ok()
            .and_then(|h| h.shorthand().map(|s| s.to_string()))
            .unwrap_or_default();

        let mut revwalk = repo.revwalk().map_err(git_error)?;
        revwalk.set_sorting(Sort::TIME).map_err(git_error)?;
        if revwalk.push_head().is_err() {
            // Unborn HEAD: repository without commits
            return Ok((branch, Vec::new()));
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            if commits.len() >= self.max_commits {
                break;
            }
            deadline.check()?;
            let commit = repo.find_commit(oid.map_err(git_error)?).map_err(git_error)?;
            commits.push(commit_record(&repo, &commit)?);
        }

        Ok((branch, commits))
    }
}

fn git_error(e: git2::Error) -> ProviderError {
    ProviderError::InvalidResponse(format!("git: {}", e.message()))
}

fn commit_record(repo: &Repository, commit: &git2::Commit) -> ProviderResult<CommitRecord> {
    let author = commit.author();
    let identity = author
        .email()
        .filter(|e| !e.trim().is_empty())
        .map(|e| e.trim().to_lowercase())
        .or_else(|| author.name().map(|n| n.to_string()))
        .unwrap_or_else(|| "unknown".to_string());
    let timestamp = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_default();

    let tree = commit.tree().map_err(git_error)?;
    let parent_tree = commit
        .parent(0)
        .ok()
        .map(|p| p.tree())
        .transpose()
        .map_err(git_error)?;
    let stats = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
        .and_then(|diff| diff.stats())
        .map_err(git_error)?;

    Ok(CommitRecord {
        sha: commit.id().to_string(),
        author_identity: identity,
        timestamp,
        additions: stats.insertions() as u64,
        deletions: stats.deletions() as u64,
    })
}

impl RepositoryProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn requires_credentials(&self) -> bool {
        false
    }

    fn fetch(
        &self,
        owner: &str,
        repo: &str,
        _credentials: &Credentials,
        options: &FetchOptions,
    ) -> ProviderResult<RepositorySnapshot> {
        let deadline = options.deadline();
        deadline.check()?;

        if !self.root.is_dir() {
            return Err(ProviderError::NotFound(self.root.display().to_string()));
        }
        info!("Reading local checkout {}", self.root.display());

        let paths = self.collect_paths(&deadline)?;
        let mut files = Vec::with_capacity(paths.len());
        for (relative, absolute) in paths {
            deadline.check()?;
            match std::fs::read(&absolute) {
                Ok(bytes) => {
                    if let Some(record) = FileRecord::new(relative, bytes) {
                        files.push(record);
                    }
                }
                Err(e) => warn!("Failed to read {}: {}", absolute.display(), e),
            }
        }

        let (branch, commits) = self.read_commits(&deadline)?;
        deadline.check()?;

        info!("Read {} files and {} commits", files.len(), commits.len());
        Ok(RepositorySnapshot::new(
            RepositoryId::new(owner, repo),
            branch,
            files,
            commits,
            Utc::now(),
        ))
    }
}
