//! Time-boxed snapshot cache
//!
//! Entries are keyed by repository plus a SHA-256 fingerprint of the
//! credentials, so a snapshot fetched with one token is never served to a
//! caller holding another. Nothing is written to disk.

use super::Credentials;
use crate::models::{RepositoryId, RepositorySnapshot};
use chrono::Utc;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    repository: RepositoryId,
    fingerprint: [u8; 32],
}

impl CacheKey {
    fn new(repository: &RepositoryId, credentials: &Credentials) -> Self {
        let digest = Sha256::digest(credentials.token().as_bytes());
        Self {
            repository: repository.clone(),
            fingerprint: digest.into(),
        }
    }
}

/// Thread-safe, caller-owned cache of recent snapshots.
#[derive(Clone)]
pub struct SnapshotCache {
    entries: Arc<DashMap<CacheKey, Arc<RepositorySnapshot>>>,
    max_age: Duration,
}

impl SnapshotCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Snapshot of `repository` no older than `min(freshness, max_age)`.
    ///
    /// A stale entry is evicted on the way out.
    pub fn get(
        &self,
        repository: &RepositoryId,
        credentials: &Credentials,
        freshness: Duration,
    ) -> Option<Arc<RepositorySnapshot>> {
        let key = CacheKey::new(repository, credentials);
        let limit = freshness.min(self.max_age);

        let snapshot = self.entries.get(&key).map(|entry| Arc::clone(entry.value()))?;
        let age = (Utc::now() - snapshot.fetched_at())
            .to_std()
            .unwrap_or(Duration::ZERO);

        if age <= limit {
            debug!("Snapshot cache hit for {} (age {}s)", repository, age.as_secs());
            Some(snapshot)
        } else {
            debug!("Evicting stale snapshot of {} (age {}s)", repository, age.as_secs());
            self.entries.remove(&key);
            None
        }
    }

    pub fn insert(&self, credentials: &Credentials, snapshot: Arc<RepositorySnapshot>) {
        let key = CacheKey::new(snapshot.id(), credentials);
        self.entries.insert(key, snapshot);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
