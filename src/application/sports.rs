//! Consumer-facing access to cached football data.
//!
//! Callers open one [`SportsRequest`] per inbound request and ask it for what they need.
//! Every method answers with a [`Fetched`]; a failure is `success: false`, never an error.

use std::sync::Arc;

use serde_json::Value;
use time::{Date, Month};
use tracing::{error, info};

use crate::cache::{
    BatchReport, BatchScheduler, CacheConfig, CacheLookup, CacheOrchestrator, LookupSource,
    RequestScope,
};
use crate::domain::error::DomainError;
use crate::domain::fixture::{FixtureSummary, VolatilitySignal};
use crate::domain::keys::{CacheKey, DataType, SubjectKey};
use crate::domain::season::Season;

/// What a consumer gets back from a lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub success: bool,
    pub data: Option<Arc<Value>>,
    /// Set when the payload is older than its freshness window.
    pub stale: bool,
}

impl From<CacheLookup> for Fetched {
    fn from(lookup: CacheLookup) -> Self {
        Self {
            success: lookup.success,
            data: lookup.data,
            stale: lookup.source == LookupSource::HitStale,
        }
    }
}

impl Fetched {
    fn failed() -> Self {
        Self {
            success: false,
            data: None,
            stale: false,
        }
    }
}

/// Days of a month with at least one tracked match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCalendar {
    pub days: Vec<Date>,
    pub report: BatchReport,
}

/// Long-lived entry point, shared across requests.
#[derive(Clone)]
pub struct SportsData {
    orchestrator: Arc<CacheOrchestrator>,
    scheduler: BatchScheduler,
    tracked_leagues: Arc<[i64]>,
}

impl SportsData {
    pub fn new(orchestrator: Arc<CacheOrchestrator>, config: &CacheConfig) -> Self {
        Self {
            orchestrator,
            scheduler: BatchScheduler::from_config(config),
            tracked_leagues: config.tracked_leagues.clone().into(),
        }
    }

    /// Opens a deduplicating scope for one inbound request.
    pub fn begin_request(&self) -> SportsRequest {
        SportsRequest {
            scope: RequestScope::new(Arc::clone(&self.orchestrator)),
            scheduler: self.scheduler,
            tracked_leagues: Arc::clone(&self.tracked_leagues),
        }
    }
}

/// Request-scoped handle. Identical lookups made through one handle hit upstream at most once.
pub struct SportsRequest {
    scope: RequestScope,
    scheduler: BatchScheduler,
    tracked_leagues: Arc<[i64]>,
}

impl SportsRequest {
    /// Transfers in and out of a team across all seasons.
    pub async fn team_transfers(&self, team_id: i64) -> Fetched {
        self.lookup(SubjectKey::team(team_id), DataType::Transfers, None, None)
            .await
    }

    pub async fn league_transfers(&self, league_id: i64, season: Season) -> Fetched {
        self.lookup(
            SubjectKey::league(league_id),
            DataType::LeagueTransfers,
            Some(season),
            None,
        )
        .await
    }

    pub async fn standings(&self, league_id: i64, season: Season) -> Fetched {
        self.lookup(
            SubjectKey::league(league_id),
            DataType::Standings,
            Some(season),
            None,
        )
        .await
    }

    pub async fn squad(&self, team_id: i64) -> Fetched {
        self.lookup(SubjectKey::team(team_id), DataType::Squad, None, None)
            .await
    }

    pub async fn injuries(&self, team_id: i64, season: Season) -> Fetched {
        self.lookup(
            SubjectKey::team(team_id),
            DataType::Injuries,
            Some(season),
            None,
        )
        .await
    }

    pub async fn trophies(&self, player_id: i64) -> Fetched {
        self.lookup(SubjectKey::player(player_id), DataType::Trophies, None, None)
            .await
    }

    /// The fixture itself; its status drives the freshness of every other match payload.
    pub async fn fixture(&self, fixture_id: i64) -> Fetched {
        self.lookup(SubjectKey::fixture(fixture_id), DataType::Fixture, None, None)
            .await
    }

    pub async fn match_events(&self, fixture_id: i64) -> Fetched {
        self.match_data(fixture_id, DataType::MatchEvents).await
    }

    pub async fn match_lineups(&self, fixture_id: i64) -> Fetched {
        self.match_data(fixture_id, DataType::MatchLineups).await
    }

    pub async fn match_statistics(&self, fixture_id: i64) -> Fetched {
        self.match_data(fixture_id, DataType::MatchStatistics).await
    }

    pub async fn match_player_stats(&self, fixture_id: i64) -> Fetched {
        self.match_data(fixture_id, DataType::MatchPlayerStats)
            .await
    }

    /// Every fixture played on `date`, in the configured timezone.
    pub async fn day_fixtures(&self, date: Date) -> Fetched {
        self.scope
            .get(CacheKey::day_fixtures(date), None)
            .await
            .into()
    }

    /// Which days of `year`-`month` have at least one match in a tracked league.
    ///
    /// Each day is looked up through this request's scope in paced batches. A day whose lookup
    /// fails is left out without affecting the others.
    pub async fn days_with_matches(
        &self,
        year: i32,
        month: u8,
    ) -> Result<MatchCalendar, DomainError> {
        let month = Month::try_from(month)
            .map_err(|err| DomainError::validation(format!("invalid month {month}: {err}")))?;
        let first = Date::from_calendar_date(year, month, 1)
            .map_err(|err| DomainError::validation(format!("invalid month {year}-{month}: {err}")))?;

        // Days past the end of the month fail to construct.
        let days: Vec<Date> = (1..=31)
            .filter_map(|day| first.replace_day(day).ok())
            .collect();

        let outcome = self
            .scheduler
            .run(&days, |date| async move {
                let fetched = self.day_fixtures(date).await;
                match fetched.data {
                    Some(data) if fetched.success => Ok(self.has_tracked_fixture(&data)),
                    _ => Err(format!("no fixture list for {date}")),
                }
            })
            .await;

        info!(
            year,
            month = u8::from(month),
            matchdays = outcome.hits.len(),
            failures = outcome.report.failures,
            "Resolved match calendar"
        );

        Ok(MatchCalendar {
            days: outcome.hits,
            report: outcome.report,
        })
    }

    fn has_tracked_fixture(&self, data: &Value) -> bool {
        FixtureSummary::list_from(data).iter().any(|fixture| {
            self.tracked_leagues.is_empty() || self.tracked_leagues.contains(&fixture.league.id)
        })
    }

    /// Match payloads take their volatility from the fixture's status, fetched through the same
    /// scope so a page asking for events, lineups and statistics reads the fixture once.
    async fn match_data(&self, fixture_id: i64, data_type: DataType) -> Fetched {
        let fixture = self.fixture(fixture_id).await;
        let hint = fixture
            .data
            .as_deref()
            .map(VolatilitySignal::from_payload)
            .filter(|signal| !signal.is_empty());

        self.lookup(SubjectKey::fixture(fixture_id), data_type, None, hint)
            .await
    }

    /// Any lookup by a generic key, e.g. from the command line.
    pub async fn get(&self, key: CacheKey) -> Fetched {
        self.scope.get(key, None).await.into()
    }

    async fn lookup(
        &self,
        subject: SubjectKey,
        data_type: DataType,
        season: Option<Season>,
        hint: Option<VolatilitySignal>,
    ) -> Fetched {
        match CacheKey::new(subject, data_type, season) {
            Ok(key) => self.scope.get(key, hint).await.into(),
            Err(err) => {
                error!(%subject, %data_type, error = %err, "Rejected cache key");
                // Only a caller bug gets here; make it impossible to miss in debug builds.
                if cfg!(debug_assertions) {
                    panic!("rejected cache key {subject}/{data_type}: {err}");
                }
                Fetched::failed()
            }
        }
    }
}
