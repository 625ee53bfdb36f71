//! Seam between the cache and the third-party football API.

use async_trait::async_trait;
use chrono_tz::Tz;
use serde_json::Value;
use thiserror::Error;

use crate::domain::keys::{CacheKey, DataType};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// Transport failure, non-success status or errors reported by the provider.
    #[error("upstream unavailable: {message}")]
    Unavailable { message: String },
    /// The body could not be parsed as JSON.
    #[error("upstream response malformed: {message}")]
    Malformed { message: String },
}

impl UpstreamError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// One call against the provider: a resource path plus normalised query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpstreamRequest {
    path: &'static str,
    params: Vec<(&'static str, String)>,
}

impl UpstreamRequest {
    /// Drops empty values and sorts by name so equal requests always render the same URL.
    pub fn new(path: &'static str, params: impl IntoIterator<Item = (&'static str, String)>) -> Self {
        let mut params: Vec<_> = params
            .into_iter()
            .map(|(name, value)| (name, value.trim().to_string()))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        params.sort();
        params.dedup_by(|a, b| a.0 == b.0);
        Self { path, params }
    }

    /// The provider call that produces the payload cached under `key`.
    pub fn for_key(key: &CacheKey, timezone: Tz) -> Self {
        let id = key.subject().id.to_string();
        let season = key
            .season()
            .map(|season| season.to_string())
            .unwrap_or_default();

        match key.data_type() {
            DataType::Transfers => Self::new("transfers", [("team", id)]),
            DataType::LeagueTransfers => {
                Self::new("transfers", [("league", id), ("season", season)])
            }
            DataType::Standings => Self::new("standings", [("league", id), ("season", season)]),
            DataType::Squad => Self::new("players/squads", [("team", id)]),
            DataType::Injuries => Self::new("injuries", [("team", id), ("season", season)]),
            DataType::Trophies => Self::new("trophies", [("player", id)]),
            DataType::Fixture => Self::new("fixtures", [("id", id)]),
            DataType::MatchEvents => Self::new("fixtures/events", [("fixture", id)]),
            DataType::MatchLineups => Self::new("fixtures/lineups", [("fixture", id)]),
            DataType::MatchStatistics => Self::new("fixtures/statistics", [("fixture", id)]),
            DataType::MatchPlayerStats => Self::new("fixtures/players", [("fixture", id)]),
            DataType::DayFixtures => {
                let date = key
                    .subject()
                    .as_date()
                    .map(|date| {
                        format!(
                            "{:04}-{:02}-{:02}",
                            date.year(),
                            u8::from(date.month()),
                            date.day()
                        )
                    })
                    .unwrap_or_default();
                Self::new(
                    "fixtures",
                    [("date", date), ("timezone", timezone.name().to_string())],
                )
            }
        }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }
}

impl std::fmt::Display for UpstreamRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path)?;
        for (index, (name, value)) in self.params.iter().enumerate() {
            let separator = if index == 0 { '?' } else { '&' };
            write!(f, "{separator}{name}={value}")?;
        }
        Ok(())
    }
}

/// Fetches the `response` array of one provider call.
#[async_trait]
pub trait SportsApi: Send + Sync {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::domain::keys::SubjectKey;
    use crate::domain::season::Season;

    #[test]
    fn params_are_normalised_and_sorted() {
        let request = UpstreamRequest::new(
            "fixtures",
            [
                ("timezone", "Asia/Seoul".to_string()),
                ("league", " ".to_string()),
                ("date", "2025-03-01".to_string()),
            ],
        );
        assert_eq!(
            request.to_string(),
            "fixtures?date=2025-03-01&timezone=Asia/Seoul"
        );
    }

    #[test]
    fn team_transfers_are_season_agnostic() {
        let key = CacheKey::new(SubjectKey::team(50), DataType::Transfers, None).unwrap();
        let request = UpstreamRequest::for_key(&key, Tz::UTC);
        assert_eq!(request.to_string(), "transfers?team=50");
    }

    #[test]
    fn standings_carry_league_and_season() {
        let key = CacheKey::new(
            SubjectKey::league(39),
            DataType::Standings,
            Some(Season::new(2024)),
        )
        .unwrap();
        let request = UpstreamRequest::for_key(&key, Tz::UTC);
        assert_eq!(request.to_string(), "standings?league=39&season=2024");
    }

    #[test]
    fn match_data_targets_fixture_endpoints() {
        let key = CacheKey::new(SubjectKey::fixture(1_035_037), DataType::MatchEvents, None).unwrap();
        assert_eq!(
            UpstreamRequest::for_key(&key, Tz::UTC).to_string(),
            "fixtures/events?fixture=1035037"
        );
    }

    #[test]
    fn day_fixtures_use_local_timezone() {
        let key = CacheKey::day_fixtures(date!(2025 - 03 - 01));
        assert_eq!(
            UpstreamRequest::for_key(&key, Tz::Asia__Seoul).to_string(),
            "fixtures?date=2025-03-01&timezone=Asia/Seoul"
        );
    }
}
