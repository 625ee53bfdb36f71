use std::time::Duration;

use serde_json::Value;
use time::OffsetDateTime;

use super::keys::CacheKey;

/// One persisted payload and the time it was last refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub data: Value,
    pub updated_at: OffsetDateTime,
}

impl CacheEntry {
    pub fn new(key: CacheKey, data: Value, updated_at: OffsetDateTime) -> Self {
        Self {
            key,
            data,
            updated_at,
        }
    }

    /// Time elapsed since the last refresh. Entries stamped in the future count as brand new.
    pub fn age(&self, now: OffsetDateTime) -> Duration {
        Duration::try_from(now - self.updated_at).unwrap_or(Duration::ZERO)
    }
}
