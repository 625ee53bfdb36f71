//! Read-through behaviour of the orchestrator against the in-memory store.

mod support;

use std::sync::Arc;

use serde_json::json;
use time::Duration;

use support::{NOW, ScriptedApi, orchestrator};
use touchline::application::repos::CacheEntriesRepo;
use touchline::application::sports::SportsData;
use touchline::application::upstream::UpstreamError;
use touchline::cache::{CacheConfig, LookupSource};
use touchline::domain::entry::CacheEntry;
use touchline::domain::keys::{CacheKey, DataType, SubjectKey};
use touchline::domain::season::Season;
use touchline::infra::memory::InMemoryCacheEntries;
use touchline::util::clock::FixedClock;

fn team_transfers() -> CacheKey {
    CacheKey::new(SubjectKey::team(50), DataType::Transfers, None).unwrap()
}

#[tokio::test]
async fn upstream_outage_serves_the_stale_payload() {
    let repo = Arc::new(InMemoryCacheEntries::new());
    let stored_at = NOW - Duration::days(3);
    repo.upsert(&CacheEntry::new(
        team_transfers(),
        json!([{ "player": { "id": 7 } }]),
        stored_at,
    ))
    .await
    .unwrap();

    let api = ScriptedApi::new();
    api.reply("transfers?team=50", Err(UpstreamError::unavailable("503")));
    let orchestrator = orchestrator(
        repo.clone(),
        api.clone(),
        Arc::new(FixedClock::new(NOW)),
        CacheConfig::default(),
    );

    let lookup = orchestrator.get(team_transfers(), None).await;

    assert!(lookup.success);
    assert_eq!(lookup.source, LookupSource::HitStale);
    assert_eq!(lookup.data.as_deref(), Some(&json!([{ "player": { "id": 7 } }])));
    assert_eq!(api.calls(), 1);

    let row = repo.read(&team_transfers()).await.unwrap().unwrap();
    assert_eq!(row.updated_at, stored_at, "a failed refresh must not touch the row");
}

#[tokio::test]
async fn upstream_outage_with_nothing_stored_fails_softly() {
    let repo = Arc::new(InMemoryCacheEntries::new());
    let api = ScriptedApi::new();
    let orchestrator = orchestrator(
        repo.clone(),
        api.clone(),
        Arc::new(FixedClock::new(NOW)),
        CacheConfig::default(),
    );

    let lookup = orchestrator.get(team_transfers(), None).await;

    assert!(!lookup.success);
    assert!(lookup.data.is_none());
    assert_eq!(lookup.source, LookupSource::Failed);
    assert!(repo.is_empty());
}

#[tokio::test]
async fn closed_season_is_never_refetched() {
    let key = CacheKey::new(SubjectKey::league(39), DataType::Standings, Some(Season::new(2020)))
        .unwrap();
    let repo = Arc::new(InMemoryCacheEntries::new());
    repo.upsert(&CacheEntry::new(key, json!([{ "rank": 1 }]), NOW - Duration::days(900)))
        .await
        .unwrap();

    let api = ScriptedApi::new();
    let orchestrator = orchestrator(
        repo,
        api.clone(),
        Arc::new(FixedClock::new(NOW)),
        CacheConfig::default(),
    );

    let lookup = orchestrator.get(key, None).await;

    assert_eq!(lookup.source, LookupSource::HitFresh);
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn team_transfers_are_fetched_once_and_then_served_from_the_store() {
    let repo = Arc::new(InMemoryCacheEntries::new());
    let api = ScriptedApi::new();
    api.reply("transfers?team=50", Ok(json!([{ "player": { "id": 7 } }])));
    let clock = Arc::new(FixedClock::new(NOW));
    let config = CacheConfig::default();
    let sports = SportsData::new(
        orchestrator(repo.clone(), api.clone(), clock.clone(), config.clone()),
        &config,
    );

    let request = sports.begin_request();
    let first = request.team_transfers(50).await;
    let again = request.team_transfers(50).await;

    assert!(first.success && !first.stale);
    assert_eq!(first, again);
    assert_eq!(api.calls(), 1);
    assert_eq!(repo.len(), 1);

    // An hour later, a new request reads the row without calling upstream.
    clock.advance(Duration::hours(1));
    let later = sports.begin_request().team_transfers(50).await;
    assert_eq!(later.data, first.data);
    assert_eq!(api.calls(), 1);

    // Past the aggregate TTL the row is refreshed in place.
    clock.advance(Duration::days(1));
    sports.begin_request().team_transfers(50).await;
    assert_eq!(api.calls(), 2);
    assert_eq!(repo.len(), 1);
    let row = repo.read(&team_transfers()).await.unwrap().unwrap();
    assert_eq!(row.updated_at, NOW + Duration::hours(25));
}

#[tokio::test]
async fn out_of_range_kickoff_does_not_break_the_lookup() {
    let key = CacheKey::new(SubjectKey::fixture(9), DataType::Fixture, None).unwrap();
    let payload = json!([{
        "fixture": { "timestamp": 253_402_300_740_000_i64, "status": { "short": "FT" } }
    }]);
    let repo = Arc::new(InMemoryCacheEntries::new());
    repo.upsert(&CacheEntry::new(key, payload.clone(), NOW - Duration::minutes(1)))
        .await
        .unwrap();

    let api = ScriptedApi::new();
    let orchestrator = orchestrator(
        repo,
        api.clone(),
        Arc::new(FixedClock::new(NOW)),
        CacheConfig::default(),
    );

    let lookup = orchestrator.get(key, None).await;

    assert_eq!(lookup.source, LookupSource::HitFresh);
    assert_eq!(lookup.data.as_deref(), Some(&payload));
    assert_eq!(api.calls(), 0);
}
