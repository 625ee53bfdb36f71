use std::sync::Arc;

use serde_json::Value;

/// How a lookup was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// Stored payload was still fresh.
    HitFresh,
    /// Stored payload was missing or stale and the upstream call succeeded.
    Refreshed,
    /// Upstream failed; the last persisted payload was served instead.
    HitStale,
    /// Upstream failed and nothing was stored.
    Failed,
}

impl LookupSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HitFresh => "hit_fresh",
            Self::Refreshed => "refreshed",
            Self::HitStale => "hit_stale",
            Self::Failed => "failed",
        }
    }
}

/// Result of one read-through lookup. Failure is a value, never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    pub success: bool,
    pub data: Option<Arc<Value>>,
    pub source: LookupSource,
}

impl CacheLookup {
    pub fn served(data: Value, source: LookupSource) -> Self {
        Self {
            success: true,
            data: Some(Arc::new(data)),
            source,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            data: None,
            source: LookupSource::Failed,
        }
    }
}
