//! In-memory provider serving pre-built snapshots

use super::{Credentials, FetchOptions, ProviderError, ProviderResult, RepositoryProvider};
use crate::models::{RepositoryId, RepositorySnapshot};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Provider backed by a fixed set of snapshots.
///
/// Errors queued with [`StaticProvider::fail_next`] are returned, one per
/// call, before any snapshot is served.
#[derive(Default)]
pub struct StaticProvider {
    snapshots: HashMap<RepositoryId, RepositorySnapshot>,
    pending_errors: Mutex<VecDeque<ProviderError>>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(mut self, snapshot: RepositorySnapshot) -> Self {
        self.snapshots.insert(snapshot.id().clone(), snapshot);
        self
    }

    /// Queue an error for the next `fetch`.
    pub fn fail_next(self, error: ProviderError) -> Self {
        if let Ok(mut queue) = self.pending_errors.lock() {
            queue.push_back(error);
        }
        self
    }

    /// Number of `fetch` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RepositoryProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
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
        self.calls.fetch_add(1, Ordering::SeqCst);
        options.deadline().check()?;

        let queued = self
            .pending_errors
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        if let Some(error) = queued {
            return Err(error);
        }

        let id = RepositoryId::new(owner, repo);
        self.snapshots
            .get(&id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }
}
