//! Repository data providers
//!
//! A provider turns `owner/repo` plus credentials into an in-memory
//! [`RepositorySnapshot`]. The analysis stages only ever see the snapshot,
//! so any code host can be plugged in behind [`RepositoryProvider`].
//!
//! - [`GitHubProvider`] - GitHub REST API over sync HTTP
//! - [`LocalProvider`] - a checkout on disk (files + git log)
//! - [`StaticProvider`] - pre-built snapshots, for tests and embedding
//!
//! Source code is never written to disk by a provider.

mod cache;
mod filter;
mod github;
mod local;
mod memory;

pub use cache::SnapshotCache;
pub use filter::{PathFilter, DEFAULT_DENY_PATTERNS};
pub use github::{GitHubConfig, GitHubProvider};
pub use local::LocalProvider;
pub use memory::StaticProvider;

use crate::models::RepositorySnapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised while fetching a repository.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("repository not found or not accessible: {0}")]
    NotFound(String),

    #[error("rate limited by code host, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("fetch timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Only throttling is worth a retry; everything else propagates.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Opaque access token for the code host.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Credentials for providers that need none (local checkouts).
    pub fn anonymous() -> Self {
        Self(String::new())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "Credentials(<none>)")
        } else {
            write!(f, "Credentials(<redacted>)")
        }
    }
}

/// Cooperative cancellation flag shared between a caller and a running fetch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-call fetch controls.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub cancel: CancelToken,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            cancel: CancelToken::new(),
        }
    }
}

impl FetchOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Start the clock for one fetch.
    pub fn deadline(&self) -> Deadline {
        Deadline {
            expires: Instant::now() + self.timeout,
            timeout: self.timeout,
            cancel: self.cancel.clone(),
        }
    }
}

/// Running budget of a fetch. Checked before every upstream request.
#[derive(Debug, Clone)]
pub struct Deadline {
    expires: Instant,
    timeout: Duration,
    cancel: CancelToken,
}

impl Deadline {
    /// Fail if the caller cancelled or the budget is spent.
    pub fn check(&self) -> ProviderResult<()> {
        if self.cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        if Instant::now() >= self.expires {
            return Err(ProviderError::Timeout(self.timeout));
        }
        Ok(())
    }

    pub fn remaining(&self) -> Duration {
        self.expires.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Total budget this deadline was started with.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Capability to fetch a repository snapshot from some code host.
pub trait RepositoryProvider: Send + Sync {
    /// Name of the backing host (for logging)
    fn name(&self) -> &str;

    /// Whether `fetch` needs a non-empty access token.
    fn requires_credentials(&self) -> bool {
        true
    }

    /// Fetch the file tree, file contents and commit log of `owner/repo`.
    ///
    /// Never returns a partial snapshot: on timeout or cancellation the
    /// data fetched so far is dropped.
    fn fetch(
        &self,
        owner: &str,
        repo: &str,
        credentials: &Credentials,
        options: &FetchOptions,
    ) -> ProviderResult<RepositorySnapshot>;
}

impl<P: RepositoryProvider + ?Sized> RepositoryProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn requires_credentials(&self) -> bool {
        (**self).requires_credentials()
    }

    fn fetch(
        &self,
        owner: &str,
        repo: &str,
        credentials: &Credentials,
        options: &FetchOptions,
    ) -> ProviderResult<RepositorySnapshot> {
        (**self).fetch(owner, repo, credentials, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials::new("ghp_secret");
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("ghp_secret"));
        assert_eq!(format!("{:?}", Credentials::anonymous()), "Credentials(<none>)");
    }

    #[test]
    fn test_deadline_reports_cancel_before_timeout() {
        let cancel = CancelToken::new();
        let options = FetchOptions::with_timeout(Duration::from_secs(30)).with_cancel(cancel.clone());
        let deadline = options.deadline();
        assert!(deadline.check().is_ok());

        cancel.cancel();
        assert!(matches!(deadline.check(), Err(ProviderError::Cancelled)));
    }

    #[test]
    fn test_deadline_expires() {
        let deadline = FetchOptions::with_timeout(Duration::ZERO).deadline();
        assert!(matches!(deadline.check(), Err(ProviderError::Timeout(_))));
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_only_rate_limit_is_retryable() {
        let limited = ProviderError::RateLimited {
            retry_after: Duration::from_secs(5),
        };
        assert!(limited.is_retryable());
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(5)));
        assert!(!ProviderError::Auth("bad token".into()).is_retryable());
        assert!(!ProviderError::NotFound("x/y".into()).is_retryable());
    }
}
