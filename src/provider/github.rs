//! GitHub REST API provider
//!
//! Uses ureq (sync HTTP), one request at a time, each bounded by what is
//! left of the caller's deadline. Endpoints used:
//!
//! - `GET /repos/{owner}/{repo}` - default branch
//! - `GET /repos/{owner}/{repo}/git/trees/{branch}?recursive=1` - file tree
//! - `GET /repos/{owner}/{repo}/git/blobs/{sha}` (raw media type) - file bytes
//! - `GET /repos/{owner}/{repo}/commits` (paged) - commit log
//! - `GET /repos/{owner}/{repo}/commits/{sha}` - line stats, when enabled

use super::{
    Credentials, Deadline, FetchOptions, PathFilter, ProviderError, ProviderResult,
    RepositoryProvider,
};
use crate::models::{CommitRecord, FileRecord, RepositoryId, RepositorySnapshot};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_API_URL: &str = "https://api.github.com";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw+json";
const API_VERSION: &str = "2022-11-28";

/// Fallback wait when GitHub throttles without saying for how long.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub user_agent: String,
    /// Maximum files fetched per snapshot
    pub max_files: usize,
    /// Maximum commits read from the log
    pub max_commits: usize,
    /// Fetch per-commit additions/deletions (one extra request per commit)
    pub commit_stats: bool,
    pub per_page: usize,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: format!("techhealth/{}", env!("CARGO_PKG_VERSION")),
            max_files: 2000,
            max_commits: 1000,
            commit_stats: false,
            per_page: 100,
        }
    }
}

/// Snapshot provider backed by the GitHub REST API.
pub struct GitHubProvider {
    config: GitHubConfig,
    filter: PathFilter,
    agent: ureq::Agent,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // Status codes map to ProviderError below
        .build()
        .new_agent()
}

impl GitHubProvider {
    pub fn new(config: GitHubConfig, filter: PathFilter) -> Self {
        Self {
            config,
            filter,
            agent: make_agent(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Issue one GET request, mapping non-success statuses to errors.
    fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        accept: &str,
        credentials: &Credentials,
        deadline: &Deadline,
    ) -> ProviderResult<ureq::http::Response<ureq::Body>> {
        deadline.check()?;

        let mut req = self
            .agent
            .get(&self.url(path))
            .header("Accept", accept)
            .header("User-Agent", &self.config.user_agent)
            .header("X-GitHub-Api-Version", API_VERSION);
        if !credentials.is_empty() {
            req = req.header("Authorization", &format!("Bearer {}", credentials.token()));
        }
        for (key, value) in query {
            req = req.query(*key, value);
        }

        let response = req
            .config()
            .timeout_global(Some(deadline.remaining()))
            .build()
            .call()
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => ProviderError::Timeout(deadline.timeout()),
                other => ProviderError::Transport(other.to_string()),
            })?;

        let status = response.status().as_u16();
        if status < 400 {
            return Ok(response);
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        let throttle = RateLimitHeaders {
            remaining: header("x-ratelimit-remaining"),
            retry_after: header("retry-after"),
            reset: header("x-ratelimit-reset"),
        };
        let body = response.into_body().read_to_string().unwrap_or_default();
        Err(classify_status(status, &throttle, path, &body, Utc::now().timestamp()))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        credentials: &Credentials,
        deadline: &Deadline,
    ) -> ProviderResult<T> {
        let response = self.get(path, query, ACCEPT_JSON, credentials, deadline)?;
        response
            .into_body()
            .read_json()
            .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", path, e)))
    }

    fn fetch_tree(
        &self,
        repo_path: &str,
        branch: &str,
        credentials: &Credentials,
        deadline: &Deadline,
    ) -> ProviderResult<Vec<TreeEntry>> {
        let tree: TreeResponse = self.get_json(
            &format!("{}/git/trees/{}", repo_path, branch),
            &[("recursive", "1".to_string())],
            credentials,
            deadline,
        )?;
        if tree.truncated {
            warn!("GitHub truncated the file tree of {}; analyzing a partial tree", repo_path);
        }

        let mut entries: Vec<TreeEntry> = tree
            .tree
            .into_iter()
            .filter(|e| e.entry_type == "blob")
            .filter(|e| self.filter.accept(&e.path).is_some())
            .filter(|e| self.filter.accepts_size(e.size.unwrap_or(0)))
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        if entries.len() > self.config.max_files {
            warn!(
                "{} analyzable files, keeping the first {}",
                entries.len(),
                self.config.max_files
            );
            entries.truncate(self.config.max_files);
        }
        Ok(entries)
    }

    fn fetch_blob(
        &self,
        repo_path: &str,
        sha: &str,
        credentials: &Credentials,
        deadline: &Deadline,
    ) -> ProviderResult<Vec<u8>> {
        let response = self.get(
            &format!("{}/git/blobs/{}", repo_path, sha),
            &[],
            ACCEPT_RAW,
            credentials,
            deadline,
        )?;
        response
            .into_body()
            .with_config()
            .limit(self.filter.max_file_bytes().max(1))
            .read_to_vec()
            .map_err(|e| ProviderError::Transport(format!("blob {}: {}", sha, e)))
    }

    fn fetch_commits(
        &self,
        repo_path: &str,
        branch: &str,
        credentials: &Credentials,
        deadline: &Deadline,
    ) -> ProviderResult<Vec<CommitRecord>> {
        let per_page = self.config.per_page.clamp(1, 100);
        let mut commits = Vec::new();
        let mut page = 1usize;

        while commits.len() < self.config.max_commits {
            let items: Vec<CommitItem> = self.get_json(
                &format!("{}/commits", repo_path),
                &[
                    ("sha", branch.to_string()),
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                ],
                credentials,
                deadline,
            )?;
            let last_page = items.len() < per_page;

            for item in items {
                if commits.len() >= self.config.max_commits {
                    break;
                }
                match item.into_record() {
                    Some(mut record) => {
                        if self.config.commit_stats {
                            let (additions, deletions) =
                                self.fetch_commit_stats(repo_path, &record.sha, credentials, deadline)?;
                            record.additions = additions;
                            record.deletions = deletions;
                        }
                        commits.push(record);
                    }
                    None => warn!("Skipping commit with unparseable author date"),
                }
            }

            if last_page {
                break;
            }
            page += 1;
        }

        Ok(commits)
    }

    fn fetch_commit_stats(
        &self,
        repo_path: &str,
        sha: &str,
        credentials: &Credentials,
        deadline: &Deadline,
    ) -> ProviderResult<(u64, u64)> {
        let detail: CommitDetail =
            self.get_json(&format!("{}/commits/{}", repo_path, sha), &[], credentials, deadline)?;
        Ok(detail
            .stats
            .map(|s| (s.additions, s.deletions))
            .unwrap_or((0, 0)))
    }
}

impl RepositoryProvider for GitHubProvider {
    fn name(&self) -> &str {
        "github"
    }

    fn fetch(
        &self,
        owner: &str,
        repo: &str,
        credentials: &Credentials,
        options: &FetchOptions,
    ) -> ProviderResult<RepositorySnapshot> {
        let deadline = options.deadline();
        let repo_path = format!("/repos/{}/{}", owner, repo);
        info!("Fetching {}/{} from {}", owner, repo, self.config.api_url);

        let meta: RepoResponse = self.get_json(&repo_path, &[], credentials, &deadline)?;
        let branch = meta.default_branch;

        let entries = self.fetch_tree(&repo_path, &branch, credentials, &deadline)?;
        debug!("{} files selected from tree of {}", entries.len(), branch);

        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            let bytes = self.fetch_blob(&repo_path, &entry.sha, credentials, &deadline)?;
            if let Some(record) = FileRecord::new(entry.path, bytes) {
                files.push(record);
            }
        }

        let commits = self.fetch_commits(&repo_path, &branch, credentials, &deadline)?;
        deadline.check()?;

        info!(
            "Fetched {}/{}: {} files, {} commits",
            owner,
            repo,
            files.len(),
            commits.len()
        );

        Ok(RepositorySnapshot::new(
            RepositoryId::new(owner, repo),
            branch,
            files,
            commits,
            Utc::now(),
        ))
    }
}

/// Throttling headers of an error response.
#[derive(Debug, Default)]
struct RateLimitHeaders {
    remaining: Option<String>,
    retry_after: Option<String>,
    reset: Option<String>,
}

/// Map an error status to a [`ProviderError`].
fn classify_status(
    status: u16,
    throttle: &RateLimitHeaders,
    path: &str,
    body: &str,
    now_epoch: i64,
) -> ProviderError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    match status {
        401 => ProviderError::Auth(format!("invalid or expired credentials ({})", message)),
        403 | 429 => match rate_limit_wait(throttle, now_epoch) {
            Some(retry_after) => ProviderError::RateLimited { retry_after },
            None if status == 429 => ProviderError::RateLimited {
                retry_after: DEFAULT_RETRY_AFTER,
            },
            None => ProviderError::Auth(format!("access denied to {} ({})", path, message)),
        },
        404 => ProviderError::NotFound(path.trim_start_matches("/repos/").to_string()),
        _ => ProviderError::Transport(format!("HTTP {} from {}: {}", status, path, message)),
    }
}

/// Wait requested by the host, if the response is a throttle.
fn rate_limit_wait(throttle: &RateLimitHeaders, now_epoch: i64) -> Option<Duration> {
    if let Some(secs) = throttle
        .retry_after
        .as_deref()
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        return Some(Duration::from_secs(secs));
    }

    let exhausted = throttle.remaining.as_deref().map(str::trim) == Some("0");
    if !exhausted {
        return None;
    }

    let wait = throttle
        .reset
        .as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(|reset| Duration::from_secs((reset - now_epoch).max(1) as u64))
        .unwrap_or(DEFAULT_RETRY_AFTER);
    Some(wait)
}

// GitHub API types
#[derive(Deserialize)]
struct RepoResponse {
    default_branch: String,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
    sha: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Deserialize)]
struct CommitItem {
    sha: String,
    commit: CommitBody,
    #[serde(default)]
    author: Option<GitHubUser>,
}

#[derive(Deserialize)]
struct CommitBody {
    author: Option<CommitAuthor>,
}

#[derive(Deserialize)]
struct CommitAuthor {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    date: String,
}

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Deserialize)]
struct CommitDetail {
    #[serde(default)]
    stats: Option<CommitStats>,
}

#[derive(Deserialize)]
struct CommitStats {
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl CommitItem {
    fn into_record(self) -> Option<CommitRecord> {
        let author = self.commit.author?;
        let timestamp = DateTime::parse_from_rfc3339(&author.date)
            .ok()?
            .with_timezone(&Utc);
        let identity = author
            .email
            .filter(|e| !e.trim().is_empty())
            .map(|e| e.trim().to_lowercase())
            .or_else(|| author.name.filter(|n| !n.trim().is_empty()))
            .or_else(|| self.author.map(|u| u.login))
            .unwrap_or_else(|| "unknown".to_string());

        Some(CommitRecord {
            sha: self.sha,
            author_identity: identity,
            timestamp,
            additions: 0,
            deletions: 0,
        })
    }
}
