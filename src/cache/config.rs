//! Cache configuration.
//!
//! TTLs per volatility class and batch pacing, loaded from the `[cache]` table of
//! `touchline.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const HOUR: u64 = 60 * 60;

// Default values for cache configuration
const DEFAULT_AGGREGATE_TTL_SECS: u64 = 24 * HOUR;
const DEFAULT_INJURIES_TTL_SECS: u64 = HOUR;
const DEFAULT_DAY_FIXTURES_TTL_SECS: u64 = 15 * 60;
const DEFAULT_MATCH_TTL_SECS: u64 = 15 * 60;
const DEFAULT_MATCH_UNKNOWN_STATUS_TTL_SECS: u64 = 60;
const DEFAULT_MATCH_IMMINENT_TTL_SECS: u64 = 60;
const DEFAULT_MATCH_JUST_FINISHED_TTL_SECS: u64 = 2 * 60;
const DEFAULT_MATCH_RECENTLY_FINISHED_TTL_SECS: u64 = 5 * 60;
const DEFAULT_LIVE_TTL_SECS: u64 = 0;
const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_BATCH_PACING_MS: u64 = 50;

/// Cache configuration from `touchline.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Transfers, standings, squads and trophies of the running season.
    pub aggregate_ttl_secs: u64,
    /// Injury lists of the running season.
    pub injuries_ttl_secs: u64,
    /// Fixture lists of a single day.
    pub day_fixtures_ttl_secs: u64,
    /// Match data when nothing more specific applies.
    pub match_ttl_secs: u64,
    /// Match data whose status is unknown.
    pub match_unknown_status_ttl_secs: u64,
    /// Scheduled matches close to (or past) kickoff.
    pub match_imminent_ttl_secs: u64,
    /// Finished matches within ten minutes of full time.
    pub match_just_finished_ttl_secs: u64,
    /// Finished matches within an hour of full time.
    pub match_recently_finished_ttl_secs: u64,
    /// Live matches. Zero refreshes on every lookup.
    pub live_ttl_secs: u64,
    /// Concurrent lookups per batch in bulk range queries.
    pub batch_size: usize,
    /// Pause between two batches (ms).
    pub batch_pacing_ms: u64,
    /// League ids counted when checking a day for matches. Empty counts every league.
    pub tracked_leagues: Vec<i64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            aggregate_ttl_secs: DEFAULT_AGGREGATE_TTL_SECS,
            injuries_ttl_secs: DEFAULT_INJURIES_TTL_SECS,
            day_fixtures_ttl_secs: DEFAULT_DAY_FIXTURES_TTL_SECS,
            match_ttl_secs: DEFAULT_MATCH_TTL_SECS,
            match_unknown_status_ttl_secs: DEFAULT_MATCH_UNKNOWN_STATUS_TTL_SECS,
            match_imminent_ttl_secs: DEFAULT_MATCH_IMMINENT_TTL_SECS,
            match_just_finished_ttl_secs: DEFAULT_MATCH_JUST_FINISHED_TTL_SECS,
            match_recently_finished_ttl_secs: DEFAULT_MATCH_RECENTLY_FINISHED_TTL_SECS,
            live_ttl_secs: DEFAULT_LIVE_TTL_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pacing_ms: DEFAULT_BATCH_PACING_MS,
            tracked_leagues: Vec::new(),
        }
    }
}

impl CacheConfig {
    pub fn aggregate_ttl(&self) -> Duration {
        Duration::from_secs(self.aggregate_ttl_secs)
    }

    pub fn injuries_ttl(&self) -> Duration {
        Duration::from_secs(self.injuries_ttl_secs)
    }

    pub fn day_fixtures_ttl(&self) -> Duration {
        Duration::from_secs(self.day_fixtures_ttl_secs)
    }

    pub fn match_ttl(&self) -> Duration {
        Duration::from_secs(self.match_ttl_secs)
    }

    pub fn match_unknown_status_ttl(&self) -> Duration {
        Duration::from_secs(self.match_unknown_status_ttl_secs)
    }

    pub fn match_imminent_ttl(&self) -> Duration {
        Duration::from_secs(self.match_imminent_ttl_secs)
    }

    pub fn match_just_finished_ttl(&self) -> Duration {
        Duration::from_secs(self.match_just_finished_ttl_secs)
    }

    pub fn match_recently_finished_ttl(&self) -> Duration {
        Duration::from_secs(self.match_recently_finished_ttl_secs)
    }

    pub fn live_ttl(&self) -> Duration {
        Duration::from_secs(self.live_ttl_secs)
    }

    /// Returns the batch size as NonZeroUsize, clamping to 1 if zero.
    pub fn batch_size_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.batch_size).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn batch_pacing(&self) -> Duration {
        Duration::from_millis(self.batch_pacing_ms)
    }
}
