//! Per-request memoisation of cache lookups.
//!
//! A `RequestScope` lives for one inbound request. The first call for a key starts the
//! orchestrator lookup; every later or concurrent call for the same key awaits that same
//! future and receives a clone of its result. Nothing is shared between scopes.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use metrics::counter;
use tracing::trace;

use crate::domain::fixture::VolatilitySignal;
use crate::domain::keys::CacheKey;

use super::lookup::CacheLookup;
use super::orchestrator::CacheOrchestrator;

const METRIC_REQUEST_SCOPE_DEDUP: &str = "touchline_request_scope_dedup_total";

type PendingLookup = Shared<BoxFuture<'static, CacheLookup>>;

pub struct RequestScope {
    orchestrator: Arc<CacheOrchestrator>,
    lookups: DashMap<CacheKey, PendingLookup>,
}

impl RequestScope {
    pub fn new(orchestrator: Arc<CacheOrchestrator>) -> Self {
        Self {
            orchestrator,
            lookups: DashMap::new(),
        }
    }

    /// Looks `key` up at most once for the lifetime of this scope.
    ///
    /// The hint of the first caller wins for a given key.
    pub async fn get(&self, key: CacheKey, hint: Option<VolatilitySignal>) -> CacheLookup {
        let pending = match self.lookups.entry(key) {
            Entry::Occupied(occupied) => {
                trace!(key = %key, "Joining pending lookup");
                counter!(METRIC_REQUEST_SCOPE_DEDUP, "data_type" => key.data_type().as_str())
                    .increment(1);
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => {
                let orchestrator = Arc::clone(&self.orchestrator);
                let pending = async move { orchestrator.get(key, hint).await }
                    .boxed()
                    .shared();
                vacant.insert(pending.clone());
                pending
            }
        };

        pending.await
    }

    /// Number of distinct keys looked up so far.
    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }
}
