//! Analysis pipeline
//!
//! Orchestrates one health analysis:
//! 1. Validate the request
//! 2. Fetch a snapshot (or reuse a cached one)
//! 3. Quality and activity analysis, concurrently
//! 4. Debt, benchmarks and recommendations
//! 5. Score and assemble the report
//!
//! Stages after the fetch are pure functions of the snapshot, so the same
//! snapshot and `generated_at` always give the same report.

use crate::analysis::{activity, debt, quality};
use crate::benchmark;
use crate::config::{ConfigError, EngineConfig};
use crate::models::{HealthReport, ReportRepository, RepositoryId, RepositorySnapshot};
use crate::provider::{
    CancelToken, Credentials, Deadline, FetchOptions, ProviderError, ProviderResult,
    RepositoryProvider, SnapshotCache,
};
use crate::recommend::{self, Signals};
use crate::scoring::{HealthScorer, ReportParts};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Cancellation is polled at this interval while waiting out a rate limit.
const RETRY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors surfaced to the caller of [`Engine::analyze`].
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid request: {reason}")]
    Input { reason: String },

    #[error("{operation} failed for {repository}: {source}")]
    Fetch {
        operation: &'static str,
        repository: String,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    fn input(reason: impl Into<String>) -> Self {
        EngineError::Input {
            reason: reason.into(),
        }
    }

    /// Suggested wait before trying again, when the code host throttled us.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            EngineError::Fetch { source, .. } => source.retry_after(),
            _ => None,
        }
    }

    /// The provider error behind a failed fetch.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            EngineError::Fetch { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// One analysis request.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub owner: String,
    pub repo: String,
    pub credentials: Credentials,
    /// Reuse a cached snapshot no older than this
    pub reuse_within: Option<Duration>,
}

impl AnalyzeRequest {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            credentials,
            reuse_within: None,
        }
    }

    /// Build a request from an `owner/repo` slug.
    pub fn from_slug(slug: &str, credentials: Credentials) -> Result<Self, EngineError> {
        let id = RepositoryId::parse(slug)
            .ok_or_else(|| EngineError::input(format!("'{}' is not an owner/repo slug", slug)))?;
        Ok(Self::new(id.owner, id.name, credentials))
    }

    pub fn reuse_within(mut self, max_age: Duration) -> Self {
        self.reuse_within = Some(max_age);
        self
    }
}

fn validate_segment(kind: &str, value: &str) -> Result<(), EngineError> {
    if value.is_empty() {
        return Err(EngineError::input(format!("{} is empty", kind)));
    }
    if value == "." || value == ".." {
        return Err(EngineError::input(format!("{} '{}' is not a name", kind, value)));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(EngineError::input(format!(
            "{} '{}' contains invalid character '{}'",
            kind, value, bad
        )));
    }
    Ok(())
}

/// Sleep for `wait`, waking periodically to honor cancellation.
fn sleep_cancellable(wait: Duration, deadline: &Deadline) -> ProviderResult<()> {
    let mut left = wait;
    while !left.is_zero() {
        if deadline.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        let step = left.min(RETRY_POLL_INTERVAL);
        std::thread::sleep(step);
        left = left.saturating_sub(step);
    }
    deadline.check()
}

/// Health analysis engine over one repository provider.
///
/// Holds no per-run state; one engine can serve many requests, including
/// concurrently.
pub struct Engine<P: RepositoryProvider> {
    provider: P,
    options: FetchOptions,
    max_retry_wait: Duration,
    cache: Option<SnapshotCache>,
    scorer: HealthScorer,
}

impl<P: RepositoryProvider> Engine<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            options: FetchOptions::default(),
            max_retry_wait: Duration::from_secs(120),
            cache: None,
            scorer: HealthScorer::new(),
        }
    }

    /// Engine with fetch limits and cache taken from `config`.
    pub fn from_config(provider: P, config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let mut engine = Self::new(provider)
            .with_timeout(config.timeout())
            .with_max_retry_wait(config.max_retry_wait());
        engine.cache = config.snapshot_cache();
        Ok(engine)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.options.cancel = cancel;
        self
    }

    pub fn with_max_retry_wait(mut self, max_wait: Duration) -> Self {
        self.max_retry_wait = max_wait;
        self
    }

    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cache(&self) -> Option<&SnapshotCache> {
        self.cache.as_ref()
    }

    /// Run a full analysis, stamping the report with the current time.
    pub fn analyze(&self, request: &AnalyzeRequest) -> Result<HealthReport, EngineError> {
        self.analyze_at(request, Utc::now())
    }

    /// Run a full analysis with an explicit report timestamp.
    pub fn analyze_at(
        &self,
        request: &AnalyzeRequest,
        generated_at: DateTime<Utc>,
    ) -> Result<HealthReport, EngineError> {
        let id = self.validate(request)?;
        info!("Analyzing {} via {}", id, self.provider.name());

        let snapshot = self.snapshot(&id, request)?;
        Ok(self.analyze_snapshot(&snapshot, generated_at))
    }

    /// Score an already fetched snapshot. Pure.
    pub fn analyze_snapshot(
        &self,
        snapshot: &RepositorySnapshot,
        generated_at: DateTime<Utc>,
    ) -> HealthReport {
        let (quality, activity) = rayon::join(
            || quality::analyze(snapshot.files()),
            || activity::analyze(snapshot.commits()),
        );
        debug!(
            "Quality: CC {:.2}, MI {:.1}, {} LOC; activity: {:.2} commits/week, {} contributors",
            quality.metrics.cyclomatic_complexity,
            quality.metrics.maintainability_index,
            quality.metrics.lines_of_code,
            activity.weekly_average,
            activity.contributors_count
        );

        let debt = debt::assess(&quality, &activity);
        let benchmarks = benchmark::compare(&quality, &activity, &debt);
        let recommendations = recommend::recommend(&Signals {
            quality: &quality.metrics,
            activity: &activity,
            debt: &debt,
            skipped_files: quality.skipped.len(),
        });

        let parts = ReportParts {
            repository: ReportRepository {
                owner: snapshot.id().owner.clone(),
                name: snapshot.id().name.clone(),
                default_branch: snapshot.default_branch().to_string(),
            },
            quality,
            activity,
            debt,
            benchmarks,
            recommendations,
            commits_analyzed: snapshot.commits().len(),
        };
        self.scorer.assemble(parts, generated_at)
    }

    fn validate(&self, request: &AnalyzeRequest) -> Result<RepositoryId, EngineError> {
        validate_segment("owner", &request.owner)?;
        validate_segment("repository name", &request.repo)?;
        if self.provider.requires_credentials() && request.credentials.is_empty() {
            return Err(EngineError::input(format!(
                "the {} provider requires an access token",
                self.provider.name()
            )));
        }
        Ok(RepositoryId::new(&request.owner, &request.repo))
    }

    fn snapshot(
        &self,
        id: &RepositoryId,
        request: &AnalyzeRequest,
    ) -> Result<Arc<RepositorySnapshot>, EngineError> {
        if let (Some(cache), Some(freshness)) = (&self.cache, request.reuse_within) {
            if let Some(snapshot) = cache.get(id, &request.credentials, freshness) {
                info!("Reusing cached snapshot of {}", id);
                return Ok(snapshot);
            }
        }

        let snapshot = self
            .fetch_with_retry(id, &request.credentials)
            .map_err(|source| EngineError::Fetch {
                operation: "fetch",
                repository: id.to_string(),
                source,
            })?;
        info!(
            "Fetched {}: {} files, {} commits",
            id,
            snapshot.files().len(),
            snapshot.commits().len()
        );

        let snapshot = Arc::new(snapshot);
        if let Some(cache) = &self.cache {
            cache.insert(&request.credentials, Arc::clone(&snapshot));
        }
        Ok(snapshot)
    }

    /// Fetch once, retrying a single time after a rate limit when the
    /// wait fits both the deadline and `max_retry_wait`.
    fn fetch_with_retry(
        &self,
        id: &RepositoryId,
        credentials: &Credentials,
    ) -> ProviderResult<RepositorySnapshot> {
        let deadline = self.options.deadline();
        let wait = match self
            .provider
            .fetch(&id.owner, &id.name, credentials, &self.options)
        {
            Err(ProviderError::RateLimited { retry_after }) => retry_after,
            other => return other,
        };

        if wait > self.max_retry_wait || wait >= deadline.remaining() {
            warn!(
                "Rate limited fetching {}; wait of {}s exceeds the remaining budget",
                id,
                wait.as_secs()
            );
            return Err(ProviderError::RateLimited { retry_after: wait });
        }

        warn!("Rate limited fetching {}, retrying in {}ms", id, wait.as_millis());
        sleep_cancellable(wait, &deadline)?;

        let retry_options = FetchOptions {
            timeout: deadline.remaining(),
            cancel: self.options.cancel.clone(),
        };
        self.provider
            .fetch(&id.owner, &id.name, credentials, &retry_options)
            .map_err(|e| match e {
                ProviderError::Timeout(_) => ProviderError::Timeout(self.options.timeout),
                other => other,
            })
    }
}
