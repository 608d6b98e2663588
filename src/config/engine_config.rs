//! Engine configuration (`techhealth.toml`)
//!
//! Example:
//!
//! ```toml
//! [provider]
//! timeout_secs = 60
//! max_files = 2000
//! commit_stats = false
//!
//! [filter]
//! exclude_paths = ["generated/**", "legacy/"]
//!
//! [cache]
//! max_age_secs = 300
//! ```

use super::ConfigError;
use crate::provider::{FetchOptions, GitHubConfig, PathFilter, SnapshotCache};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "techhealth.toml";

/// Template written by `techhealth init`.
pub const EXAMPLE_CONFIG: &str = r#"# techhealth configuration

[provider]
# Code host API base URL
# api_url = "https://api.github.com"

# Total budget for fetching one repository, in seconds
timeout_secs = 60

# Files larger than this are not fetched
max_file_bytes = 1000000

# Upper bounds on what is read from the code host
max_files = 2000
max_commits = 1000

# Fetch per-commit additions/deletions (one request per commit)
commit_stats = false

# Longest rate-limit wait honored before giving up, in seconds
max_retry_wait_secs = 120

[filter]
# Paths excluded on top of the built-in vendor/build/minified list
exclude_paths = []

[cache]
# Snapshots younger than this may be reused, in seconds
max_age_secs = 300
"#;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub provider: ProviderSection,
    pub filter: FilterSection,
    pub cache: CacheSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub api_url: String,
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
    pub max_file_bytes: u64,
    pub max_files: usize,
    pub max_commits: usize,
    pub commit_stats: bool,
    pub max_retry_wait_secs: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            api_url: GitHubConfig::default().api_url,
            user_agent: None,
            timeout_secs: 60,
            max_file_bytes: 1_000_000,
            max_files: 2000,
            max_commits: 1000,
            commit_stats: false,
            max_retry_wait_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    /// Glob patterns (`**/x/**`, `*.ext`) or directory prefixes
    pub exclude_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub max_age_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self { max_age_secs: 300 }
    }
}

impl EngineConfig {
    /// Parse TOML text. `origin` is only used in error messages.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "provider.timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        if self.provider.max_files == 0 {
            return Err(ConfigError::Invalid {
                key: "provider.max_files",
                reason: "must be at least 1".into(),
            });
        }
        if !self.provider.api_url.starts_with("http://")
            && !self.provider.api_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid {
                key: "provider.api_url",
                reason: format!("'{}' is not an http(s) URL", self.provider.api_url),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }

    pub fn max_retry_wait(&self) -> Duration {
        Duration::from_secs(self.provider.max_retry_wait_secs)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::with_timeout(self.timeout())
    }

    pub fn path_filter(&self) -> PathFilter {
        PathFilter::new(&self.filter.exclude_paths, self.provider.max_file_bytes)
    }

    pub fn github_config(&self) -> GitHubConfig {
        let mut config = GitHubConfig {
            api_url: self.provider.api_url.trim_end_matches('/').to_string(),
            max_files: self.provider.max_files,
            max_commits: self.provider.max_commits,
            commit_stats: self.provider.commit_stats,
            ..Default::default()
        };
        if let Some(agent) = &self.provider.user_agent {
            config.user_agent = agent.clone();
        }
        config
    }

    /// `None` when caching is disabled (`max_age_secs = 0`).
    pub fn snapshot_cache(&self) -> Option<SnapshotCache> {
        (self.cache.max_age_secs > 0)
            .then(|| SnapshotCache::new(Duration::from_secs(self.cache.max_age_secs)))
    }
}

/// Load an explicitly requested config file.
///
/// A missing file yields the defaults; an unreadable or invalid one is an
/// error.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(EngineConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = EngineConfig::from_toml(&content, path)?;
    debug!("Loaded engine config from {}", path.display());
    Ok(config)
}

/// Load `techhealth.toml` from `dir` if present.
///
/// Problems with an auto-discovered file are logged and the defaults used.
pub fn discover_engine_config(dir: &Path) -> EngineConfig {
    let path = dir.join(CONFIG_FILE_NAME);
    match load_engine_config(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring {}: {}", path.display(), e);
            EngineConfig::default()
        }
    }
}
