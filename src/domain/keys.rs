//! Cache key definitions.
//!
//! A cached fact is identified by what it is about (`SubjectKey`), what kind of payload it is
//! (`DataType`) and the season it belongs to. The subject is tagged with its kind so a team id
//! and a league id that happen to share a number never collide.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, Month};

use super::error::DomainError;
use super::season::Season;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Team,
    League,
    Match,
    Player,
    /// A calendar day, id encoded as `YYYYMMDD`.
    Day,
}

impl SubjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::League => "league",
            Self::Match => "match",
            Self::Player => "player",
            Self::Day => "day",
        }
    }
}

impl FromStr for SubjectKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "team" => Ok(Self::Team),
            "league" => Ok(Self::League),
            "match" => Ok(Self::Match),
            "player" => Ok(Self::Player),
            "day" => Ok(Self::Day),
            other => Err(DomainError::policy_violation(format!(
                "unknown subject kind `{other}`"
            ))),
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a cached payload is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectKey {
    pub kind: SubjectKind,
    pub id: i64,
}

impl SubjectKey {
    pub const fn new(kind: SubjectKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub const fn team(id: i64) -> Self {
        Self::new(SubjectKind::Team, id)
    }

    pub const fn league(id: i64) -> Self {
        Self::new(SubjectKind::League, id)
    }

    pub const fn fixture(id: i64) -> Self {
        Self::new(SubjectKind::Match, id)
    }

    pub const fn player(id: i64) -> Self {
        Self::new(SubjectKind::Player, id)
    }

    pub fn day(date: Date) -> Self {
        let id = i64::from(date.year()) * 10_000
            + i64::from(u8::from(date.month())) * 100
            + i64::from(date.day());
        Self::new(SubjectKind::Day, id)
    }

    /// Decode a `Day` subject back into its calendar date.
    pub fn as_date(&self) -> Option<Date> {
        if self.kind != SubjectKind::Day {
            return None;
        }
        let year = i32::try_from(self.id / 10_000).ok()?;
        let month = Month::try_from(u8::try_from(self.id / 100 % 100).ok()?).ok()?;
        let day = u8::try_from(self.id % 100).ok()?;
        Date::from_calendar_date(year, month, day).ok()
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for SubjectKey {
    type Err = DomainError;

    /// Parses `team:50`, `league:39`, `match:1035037`, `player:276` or `day:2025-03-01`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, id) = value.split_once(':').ok_or_else(|| {
            DomainError::validation(format!("subject `{value}` must look like `kind:id`"))
        })?;
        let kind = SubjectKind::from_str(kind)?;

        if kind == SubjectKind::Day {
            let format = time::macros::format_description!("[year]-[month]-[day]");
            let date = Date::parse(id, format).map_err(|err| {
                DomainError::validation(format!("invalid day `{id}`: {err}"))
            })?;
            return Ok(Self::day(date));
        }

        let id = id
            .parse::<i64>()
            .map_err(|err| DomainError::validation(format!("invalid subject id `{id}`: {err}")))?;
        Ok(Self::new(kind, id))
    }
}

/// Discriminates what kind of payload a cache row holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Transfers,
    LeagueTransfers,
    Standings,
    Squad,
    Injuries,
    Trophies,
    Fixture,
    MatchEvents,
    MatchLineups,
    MatchStatistics,
    MatchPlayerStats,
    DayFixtures,
}

impl DataType {
    pub const ALL: [DataType; 12] = [
        Self::Transfers,
        Self::LeagueTransfers,
        Self::Standings,
        Self::Squad,
        Self::Injuries,
        Self::Trophies,
        Self::Fixture,
        Self::MatchEvents,
        Self::MatchLineups,
        Self::MatchStatistics,
        Self::MatchPlayerStats,
        Self::DayFixtures,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfers => "transfers",
            Self::LeagueTransfers => "league_transfers",
            Self::Standings => "standings",
            Self::Squad => "squad",
            Self::Injuries => "injuries",
            Self::Trophies => "trophies",
            Self::Fixture => "fixture",
            Self::MatchEvents => "match_events",
            Self::MatchLineups => "match_lineups",
            Self::MatchStatistics => "match_statistics",
            Self::MatchPlayerStats => "match_player_stats",
            Self::DayFixtures => "day_fixtures",
        }
    }

    /// The only subject kind this payload can be about.
    pub fn subject_kind(self) -> SubjectKind {
        match self {
            Self::Transfers | Self::Squad | Self::Injuries => SubjectKind::Team,
            Self::LeagueTransfers | Self::Standings => SubjectKind::League,
            Self::Trophies => SubjectKind::Player,
            Self::Fixture
            | Self::MatchEvents
            | Self::MatchLineups
            | Self::MatchStatistics
            | Self::MatchPlayerStats => SubjectKind::Match,
            Self::DayFixtures => SubjectKind::Day,
        }
    }

    /// Payloads scoped to a single season cannot be requested season-agnostically.
    pub fn requires_season(self) -> bool {
        matches!(self, Self::LeagueTransfers | Self::Standings)
    }

    /// Match-scoped payloads whose volatility follows the match's live status.
    pub fn is_match_data(self) -> bool {
        self.subject_kind() == SubjectKind::Match
    }
}

impl FromStr for DataType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|data_type| data_type.as_str() == value)
            .ok_or_else(|| DomainError::policy_violation(format!("unknown data type `{value}`")))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key of one cache row. Only constructible in a shape the freshness policy
/// understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    subject: SubjectKey,
    data_type: DataType,
    season: Option<Season>,
}

impl CacheKey {
    pub fn new(
        subject: SubjectKey,
        data_type: DataType,
        season: Option<Season>,
    ) -> Result<Self, DomainError> {
        let expected = data_type.subject_kind();
        if subject.kind != expected {
            return Err(DomainError::policy_violation(format!(
                "`{data_type}` is keyed by {expected} ids, got {subject}"
            )));
        }
        if season.is_none() && data_type.requires_season() {
            return Err(DomainError::policy_violation(format!(
                "`{data_type}` requires a season"
            )));
        }
        if let Some(season) = season
            && season.year() <= 0
        {
            return Err(DomainError::policy_violation(format!(
                "season {season} is not a valid season year"
            )));
        }
        let season = match subject.kind {
            SubjectKind::Day => {
                let date = subject.as_date().ok_or_else(|| {
                    DomainError::policy_violation(format!("{subject} is not a valid calendar day"))
                })?;
                season.or(Some(Season::containing(date)))
            }
            _ => season,
        };
        Ok(Self {
            subject,
            data_type,
            season,
        })
    }

    /// Fixtures played on a calendar day; the season is implied by the date.
    pub fn day_fixtures(date: Date) -> Self {
        Self {
            subject: SubjectKey::day(date),
            data_type: DataType::DayFixtures,
            season: Some(Season::containing(date)),
        }
    }

    pub fn subject(&self) -> SubjectKey {
        self.subject
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn season(&self) -> Option<Season> {
        self.season
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.season {
            Some(season) => write!(f, "{}/{}/{}", self.subject, self.data_type, season),
            None => write!(f, "{}/{}/all", self.subject, self.data_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn team_and_league_with_same_id_are_distinct() {
        let team = CacheKey::new(SubjectKey::team(39), DataType::Transfers, None).unwrap();
        let league = CacheKey::new(
            SubjectKey::league(39),
            DataType::LeagueTransfers,
            Some(Season::new(2024)),
        )
        .unwrap();
        assert_ne!(team.subject(), league.subject());
    }

    #[test]
    fn mismatched_subject_kind_is_a_policy_violation() {
        let err = CacheKey::new(SubjectKey::league(39), DataType::Transfers, None).unwrap_err();
        assert!(matches!(err, DomainError::PolicyViolation { .. }));
    }

    #[test]
    fn standings_need_a_season() {
        let err = CacheKey::new(SubjectKey::league(39), DataType::Standings, None).unwrap_err();
        assert!(matches!(err, DomainError::PolicyViolation { .. }));
    }

    #[test]
    fn unknown_data_type_is_rejected() {
        let err = "odds".parse::<DataType>().unwrap_err();
        assert!(matches!(err, DomainError::PolicyViolation { .. }));
    }

    #[test]
    fn data_type_names_round_trip() {
        for data_type in DataType::ALL {
            assert_eq!(data_type.as_str().parse::<DataType>(), Ok(data_type));
        }
    }

    #[test]
    fn day_subject_encodes_calendar_date() {
        let subject = SubjectKey::day(date!(2025 - 03 - 01));
        assert_eq!(subject.id, 20_250_301);
        assert_eq!(subject.as_date(), Some(date!(2025 - 03 - 01)));
        assert_eq!(SubjectKey::team(20_250_301).as_date(), None);
    }

    #[test]
    fn day_fixtures_take_season_from_date() {
        let key = CacheKey::day_fixtures(date!(2025 - 03 - 01));
        assert_eq!(key.season(), Some(Season::new(2024)));
        assert_eq!(key.to_string(), "day:20250301/day_fixtures/2024");

        let generic = CacheKey::new(
            SubjectKey::day(date!(2025 - 03 - 01)),
            DataType::DayFixtures,
            None,
        )
        .unwrap();
        assert_eq!(generic, key);
    }

    #[test]
    fn non_positive_season_is_a_policy_violation() {
        for year in [0, -1] {
            let err = CacheKey::new(
                SubjectKey::league(39),
                DataType::Standings,
                Some(Season::new(year)),
            )
            .unwrap_err();
            assert!(matches!(err, DomainError::PolicyViolation { .. }), "season {year}");
        }
    }

    #[test]
    fn impossible_day_is_a_policy_violation() {
        let subject = SubjectKey::new(SubjectKind::Day, 20_250_230);
        let err = CacheKey::new(subject, DataType::DayFixtures, None).unwrap_err();
        assert!(matches!(err, DomainError::PolicyViolation { .. }));
    }

    #[test]
    fn parses_subjects_from_cli_form() {
        assert_eq!("team:50".parse::<SubjectKey>(), Ok(SubjectKey::team(50)));
        assert_eq!(
            "day:2025-03-01".parse::<SubjectKey>(),
            Ok(SubjectKey::day(date!(2025 - 03 - 01)))
        );
        assert!("team".parse::<SubjectKey>().is_err());
        assert!("coach:1".parse::<SubjectKey>().is_err());
    }
}
