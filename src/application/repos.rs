//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entry::CacheEntry;
use crate::domain::keys::CacheKey;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Durable key-value storage for upstream payloads.
///
/// Every error is a store-unavailable condition from the caller's point of view: reads degrade
/// to a miss and writes are dropped after logging.
#[async_trait]
pub trait CacheEntriesRepo: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    async fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>, RepoError>;

    /// Inserts or wholesale replaces the row for `entry.key`.
    async fn upsert(&self, entry: &CacheEntry) -> Result<(), RepoError>;
}
