//! In-process cache rows for tests and database-less runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::application::repos::{CacheEntriesRepo, RepoError};
use crate::domain::entry::CacheEntry;
use crate::domain::keys::CacheKey;
use crate::util::lock::{rw_read, rw_write};

#[derive(Debug, Default)]
pub struct InMemoryCacheEntries {
    rows: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl InMemoryCacheEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.rows, "infra::memory", "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheEntriesRepo for InMemoryCacheEntries {
    async fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>, RepoError> {
        Ok(rw_read(&self.rows, "infra::memory", "read").get(key).cloned())
    }

    async fn upsert(&self, entry: &CacheEntry) -> Result<(), RepoError> {
        rw_write(&self.rows, "infra::memory", "upsert").insert(entry.key, entry.clone());
        Ok(())
    }
}
