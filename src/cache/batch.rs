//! Bounded-concurrency batches for bulk lookups.
//!
//! Keys are split into fixed-size batches that run one after another. Lookups inside a batch
//! run concurrently and are all awaited before the next batch starts, with a fixed pause in
//! between so bursts stay under the provider's rate limit.

use std::fmt::Display;
use std::future::Future;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use futures::future::join_all;
use metrics::histogram;
use tracing::{debug, warn};

use super::config::CacheConfig;

const METRIC_BATCH_MS: &str = "touchline_batch_ms";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub batches: usize,
    pub pauses: usize,
    pub failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome<K> {
    /// Keys whose probe answered `true`, in input order.
    pub hits: Vec<K>,
    pub report: BatchReport,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchScheduler {
    batch_size: NonZeroUsize,
    pacing: Duration,
}

impl BatchScheduler {
    pub fn new(batch_size: NonZeroUsize, pacing: Duration) -> Self {
        Self { batch_size, pacing }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.batch_size_non_zero(), config.batch_pacing())
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Runs `probe` once per key. A failed probe counts as "no result" for its own key only.
    pub async fn run<K, F, Fut, E>(&self, keys: &[K], mut probe: F) -> BatchOutcome<K>
    where
        K: Clone + Display,
        F: FnMut(K) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: Display,
    {
        let started_at = Instant::now();
        let mut hits = Vec::new();
        let mut report = BatchReport::default();

        for (index, batch) in keys.chunks(self.batch_size.get()).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing).await;
                report.pauses += 1;
            }
            report.batches += 1;

            let probes = batch.iter().map(|key| {
                let lookup = probe(key.clone());
                async move { (key, lookup.await) }
            });

            for (key, result) in join_all(probes).await {
                match result {
                    Ok(true) => hits.push(key.clone()),
                    Ok(false) => {}
                    Err(err) => {
                        report.failures += 1;
                        warn!(key = %key, error = %err, "Batch lookup failed");
                    }
                }
            }
        }

        debug!(
            keys = keys.len(),
            hits = hits.len(),
            batches = report.batches,
            failures = report.failures,
            "Batch run complete"
        );
        histogram!(METRIC_BATCH_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        BatchOutcome { hits, report }
    }
}
