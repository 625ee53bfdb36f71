//! Freshness policy: how long a cached payload may be served before it must be refetched.
//!
//! Pure decision logic. The policy never reads the store or the network; callers hand it the
//! key, whatever they know about the match, and the current instant.

use std::time::Duration;

use chrono_tz::Tz;
use time::OffsetDateTime;

use crate::domain::entry::CacheEntry;
use crate::domain::fixture::{MatchPhase, VolatilitySignal};
use crate::domain::keys::{CacheKey, DataType};

use super::config::CacheConfig;

/// Estimated time from kickoff to the final whistle, stoppage time and half-time included.
const FULL_TIME_AFTER_KICKOFF: time::Duration = time::Duration::minutes(105);
const JUST_FINISHED_WINDOW: time::Duration = time::Duration::minutes(10);
const RECENTLY_FINISHED_WINDOW: time::Duration = time::Duration::minutes(60);
const IMMINENT_KICKOFF_WINDOW: time::Duration = time::Duration::minutes(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Never expires.
    AlwaysFresh,
    /// Fresh while younger than the duration.
    Ttl(Duration),
    /// Must be refetched on every lookup.
    AlwaysStale,
}

impl Verdict {
    fn from_ttl(ttl: Duration) -> Self {
        if ttl.is_zero() {
            Self::AlwaysStale
        } else {
            Self::Ttl(ttl)
        }
    }

    pub fn admits(self, age: Duration) -> bool {
        match self {
            Self::AlwaysFresh => true,
            Self::Ttl(ttl) => age < ttl,
            Self::AlwaysStale => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FreshnessPolicy {
    config: CacheConfig,
    timezone: Tz,
}

impl FreshnessPolicy {
    pub fn new(config: CacheConfig, timezone: Tz) -> Self {
        Self { config, timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn classify(&self, key: &CacheKey, signal: &VolatilitySignal, now: OffsetDateTime) -> Verdict {
        if let Some(season) = key.season()
            && season.is_closed_at(now, self.timezone)
        {
            return Verdict::AlwaysFresh;
        }

        match key.data_type() {
            DataType::Transfers
            | DataType::LeagueTransfers
            | DataType::Standings
            | DataType::Squad
            | DataType::Trophies => Verdict::from_ttl(self.config.aggregate_ttl()),
            DataType::Injuries => Verdict::from_ttl(self.config.injuries_ttl()),
            DataType::DayFixtures => Verdict::from_ttl(self.config.day_fixtures_ttl()),
            DataType::Fixture
            | DataType::MatchEvents
            | DataType::MatchLineups
            | DataType::MatchStatistics
            | DataType::MatchPlayerStats => self.classify_match(signal, now),
        }
    }

    fn classify_match(&self, signal: &VolatilitySignal, now: OffsetDateTime) -> Verdict {
        let Some(phase) = signal.phase() else {
            return Verdict::from_ttl(self.config.match_unknown_status_ttl());
        };

        match phase {
            MatchPhase::Live => Verdict::from_ttl(self.config.live_ttl()),
            MatchPhase::Finished => match signal
                .kickoff
                .and_then(|kickoff| kickoff.checked_add(FULL_TIME_AFTER_KICKOFF))
            {
                Some(full_time) => {
                    let since_full_time = now - full_time;
                    if since_full_time < JUST_FINISHED_WINDOW {
                        Verdict::from_ttl(self.config.match_just_finished_ttl())
                    } else if since_full_time < RECENTLY_FINISHED_WINDOW {
                        Verdict::from_ttl(self.config.match_recently_finished_ttl())
                    } else {
                        Verdict::AlwaysFresh
                    }
                }
                None => Verdict::from_ttl(self.config.match_ttl()),
            },
            MatchPhase::Scheduled => match signal.kickoff {
                Some(kickoff) if kickoff - now < IMMINENT_KICKOFF_WINDOW => {
                    Verdict::from_ttl(self.config.match_imminent_ttl())
                }
                _ => Verdict::from_ttl(self.config.match_ttl()),
            },
            MatchPhase::Unrecognised => Verdict::from_ttl(self.config.match_ttl()),
        }
    }

    /// Whether a persisted entry may be served as-is at `now`.
    pub fn is_fresh(&self, entry: &CacheEntry, signal: &VolatilitySignal, now: OffsetDateTime) -> bool {
        self.classify(&entry.key, signal, now)
            .admits(entry.age(now))
    }
}
