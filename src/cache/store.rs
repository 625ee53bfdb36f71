//! Persistent cache store: a repository adapter paired with the freshness policy.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::application::repos::{CacheEntriesRepo, RepoError};
use crate::domain::entry::CacheEntry;
use crate::domain::fixture::VolatilitySignal;
use crate::domain::keys::CacheKey;

use super::policy::FreshnessPolicy;

#[derive(Clone)]
pub struct CacheStore {
    repo: Arc<dyn CacheEntriesRepo>,
    policy: FreshnessPolicy,
}

impl CacheStore {
    pub fn new(repo: Arc<dyn CacheEntriesRepo>, policy: FreshnessPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    pub async fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>, RepoError> {
        self.repo.read(key).await
    }

    /// Replaces whatever is stored under the entry's key.
    pub async fn upsert(&self, entry: &CacheEntry) -> Result<(), RepoError> {
        self.repo.upsert(entry).await
    }

    pub fn is_fresh(&self, entry: &CacheEntry, signal: &VolatilitySignal, now: OffsetDateTime) -> bool {
        self.policy.is_fresh(entry, signal, now)
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
