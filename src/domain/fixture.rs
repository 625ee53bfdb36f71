//! Match status signals and defensive fixture decoding.
//!
//! The provider's fixture schema is not contractually stable, so every field read here is
//! optional and defaults rather than failing.

use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

/// Timestamps below this are Unix seconds; above it, milliseconds.
const MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// Coarse lifecycle of a match as far as data volatility is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Not kicked off yet, postponed, suspended or cancelled.
    Scheduled,
    /// Between kickoff and the final whistle, breaks included.
    Live,
    /// Result is in.
    Finished,
    /// A status code this crate does not recognise.
    Unrecognised,
}

impl MatchPhase {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "1H" | "HT" | "2H" | "ET" | "BT" | "P" | "LIVE" | "INT" => Self::Live,
            "FT" | "AET" | "PEN" | "AWD" | "WO" => Self::Finished,
            "NS" | "TBD" | "PST" | "SUSP" | "CANC" => Self::Scheduled,
            _ => Self::Unrecognised,
        }
    }
}

/// What the freshness policy needs to know about a match: its status and kickoff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolatilitySignal {
    pub status: Option<String>,
    pub kickoff: Option<OffsetDateTime>,
}

impl VolatilitySignal {
    pub fn new(status: impl Into<String>, kickoff: Option<OffsetDateTime>) -> Self {
        Self {
            status: Some(status.into()),
            kickoff,
        }
    }

    pub fn phase(&self) -> Option<MatchPhase> {
        self.status.as_deref().map(MatchPhase::from_code)
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.kickoff.is_none()
    }

    /// Reads the signal from a cached fixture payload (the provider's `response` array or a
    /// single fixture object). Returns an empty signal when the payload carries no status.
    pub fn from_payload(data: &Value) -> Self {
        let fixture = match data {
            Value::Array(items) => items.first(),
            other => Some(other),
        };
        let Some(fixture) = fixture else {
            return Self::default();
        };

        let summary = FixtureSummary::deserialize(fixture).unwrap_or_default();
        let kickoff = summary.fixture.kickoff();
        let status = Some(summary.fixture.status.short).filter(|code| !code.is_empty());
        Self { status, kickoff }
    }
}

/// The handful of fixture fields this crate reads; everything else stays opaque.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixtureSummary {
    pub fixture: FixtureInfo,
    pub league: LeagueInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixtureInfo {
    pub id: i64,
    pub timestamp: Option<i64>,
    pub status: StatusInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusInfo {
    pub short: String,
    pub long: String,
    pub elapsed: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LeagueInfo {
    pub id: i64,
    pub name: String,
}

impl FixtureInfo {
    pub fn kickoff(&self) -> Option<OffsetDateTime> {
        let raw = self.timestamp.filter(|value| *value > 0)?;
        if raw < MILLIS_THRESHOLD {
            OffsetDateTime::from_unix_timestamp(raw).ok()
        } else {
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(raw) * 1_000_000).ok()
        }
    }
}

impl FixtureSummary {
    /// Decodes every element of a fixtures list, keeping malformed elements as defaults.
    pub fn list_from(data: &Value) -> Vec<FixtureSummary> {
        match data {
            Value::Array(items) => items
                .iter()
                .map(|item| FixtureSummary::deserialize(item).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        }
    }
}
