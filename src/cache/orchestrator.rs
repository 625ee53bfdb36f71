//! Read-through orchestration with stale fallback.
//!
//! A lookup consults the store first and only calls upstream when the stored payload is missing
//! or stale. A failed refresh falls back to whatever was stored, however old.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::application::upstream::{SportsApi, UpstreamRequest};
use crate::domain::entry::CacheEntry;
use crate::domain::fixture::VolatilitySignal;
use crate::domain::keys::CacheKey;
use crate::util::clock::Clock;

use super::lookup::{CacheLookup, LookupSource};
use super::store::CacheStore;

const METRIC_CACHE_HIT: &str = "touchline_cache_hit_total";
const METRIC_CACHE_STALE_SERVED: &str = "touchline_cache_stale_served_total";
const METRIC_CACHE_REFRESH: &str = "touchline_cache_refresh_total";
const METRIC_CACHE_FAILED: &str = "touchline_cache_failed_total";
const METRIC_UPSTREAM_REQUEST: &str = "touchline_upstream_request_total";
const METRIC_STORE_ERROR: &str = "touchline_store_error_total";

pub struct CacheOrchestrator {
    store: CacheStore,
    upstream: Arc<dyn SportsApi>,
    clock: Arc<dyn Clock>,
}

impl CacheOrchestrator {
    pub fn new(store: CacheStore, upstream: Arc<dyn SportsApi>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            upstream,
            clock,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Resolves `key` to a payload.
    ///
    /// `hint` overrides the match status otherwise read from the stored payload. Store and
    /// upstream failures are logged and folded into the returned [`CacheLookup`].
    #[instrument(
        skip_all,
        fields(
            subject = %key.subject(),
            data_type = %key.data_type(),
            season = ?key.season().map(|season| season.year()),
        )
    )]
    pub async fn get(&self, key: CacheKey, hint: Option<VolatilitySignal>) -> CacheLookup {
        let data_type = key.data_type().as_str();
        let now = self.clock.now();

        let stored = match self.store.read(&key).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!(
                    target = "touchline::cache::orchestrator",
                    error = %err,
                    "Cache read failed; treating as miss"
                );
                counter!(METRIC_STORE_ERROR, "op" => "read").increment(1);
                None
            }
        };

        if let Some(entry) = &stored {
            let signal = match &hint {
                Some(signal) => signal.clone(),
                None => VolatilitySignal::from_payload(&entry.data),
            };
            if self.store.is_fresh(entry, &signal, now) {
                debug!(outcome = LookupSource::HitFresh.as_str(), "Cache hit");
                counter!(METRIC_CACHE_HIT, "data_type" => data_type).increment(1);
                return CacheLookup::served(entry.data.clone(), LookupSource::HitFresh);
            }
        }

        let request = UpstreamRequest::for_key(&key, self.store.policy().timezone());
        counter!(METRIC_UPSTREAM_REQUEST, "path" => request.path()).increment(1);

        match self.upstream.fetch(&request).await {
            Ok(data) => {
                let entry = CacheEntry::new(key, data, self.clock.now());
                if let Err(err) = self.store.upsert(&entry).await {
                    warn!(
                        target = "touchline::cache::orchestrator",
                        error = %err,
                        "Cache write failed; serving fetched payload without persisting"
                    );
                    counter!(METRIC_STORE_ERROR, "op" => "upsert").increment(1);
                }
                debug!(
                    outcome = LookupSource::Refreshed.as_str(),
                    request = %request,
                    "Cache refreshed from upstream"
                );
                counter!(METRIC_CACHE_REFRESH, "data_type" => data_type).increment(1);
                CacheLookup::served(entry.data, LookupSource::Refreshed)
            }
            Err(err) => match stored {
                Some(entry) => {
                    warn!(
                        target = "touchline::cache::orchestrator",
                        outcome = LookupSource::HitStale.as_str(),
                        request = %request,
                        error = %err,
                        stored_at = %entry.updated_at,
                        "Upstream refresh failed; serving stale payload"
                    );
                    counter!(METRIC_CACHE_STALE_SERVED, "data_type" => data_type).increment(1);
                    CacheLookup::served(entry.data, LookupSource::HitStale)
                }
                None => {
                    warn!(
                        target = "touchline::cache::orchestrator",
                        outcome = LookupSource::Failed.as_str(),
                        request = %request,
                        error = %err,
                        "Upstream fetch failed with nothing cached"
                    );
                    counter!(METRIC_CACHE_FAILED, "data_type" => data_type).increment(1);
                    CacheLookup::failed()
                }
            },
        }
    }
}
