//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::datetime;

use touchline::application::repos::CacheEntriesRepo;
use touchline::application::upstream::{SportsApi, UpstreamError, UpstreamRequest};
use touchline::cache::{CacheConfig, CacheOrchestrator, CacheStore, FreshnessPolicy};
use touchline::util::clock::FixedClock;

pub const NOW: OffsetDateTime = datetime!(2025-03-01 12:00 UTC);

/// Upstream double keyed by the rendered request (`path?a=b`). Unscripted requests fail.
#[derive(Default)]
pub struct ScriptedApi {
    replies: Mutex<HashMap<String, Result<Value, UpstreamError>>>,
    requests: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every fetch sleeps for `delay` first, so concurrent callers overlap.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn reply(&self, request: &str, reply: Result<Value, UpstreamError>) {
        self.replies
            .lock()
            .unwrap()
            .insert(request.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SportsApi for ScriptedApi {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let rendered = request.to_string();
        self.requests.lock().unwrap().push(rendered.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .get(&rendered)
            .cloned()
            .unwrap_or_else(|| Err(UpstreamError::unavailable(format!("unscripted {rendered}"))))
    }
}

pub fn orchestrator(
    repo: Arc<dyn CacheEntriesRepo>,
    api: Arc<ScriptedApi>,
    clock: Arc<FixedClock>,
    config: CacheConfig,
) -> Arc<CacheOrchestrator> {
    let policy = FreshnessPolicy::new(config, Tz::UTC);
    Arc::new(CacheOrchestrator::new(
        CacheStore::new(repo, policy),
        api,
        clock,
    ))
}
