//! Per-request deduplication of identical lookups.

mod support;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::json;

use support::{NOW, ScriptedApi, orchestrator};
use touchline::cache::{CacheConfig, LookupSource, RequestScope};
use touchline::domain::keys::{CacheKey, DataType, SubjectKey};
use touchline::infra::memory::InMemoryCacheEntries;
use touchline::util::clock::FixedClock;

fn squad(team: i64) -> CacheKey {
    CacheKey::new(SubjectKey::team(team), DataType::Squad, None).unwrap()
}

#[tokio::test(start_paused = true)]
async fn concurrent_identical_lookups_share_one_fetch() {
    let api = ScriptedApi::slow(Duration::from_millis(200));
    api.reply("players/squads?team=50", Ok(json!([{ "team": { "id": 50 } }])));
    let scope = RequestScope::new(orchestrator(
        Arc::new(InMemoryCacheEntries::new()),
        api.clone(),
        Arc::new(FixedClock::new(NOW)),
        CacheConfig::default(),
    ));

    let lookups = join_all((0..5).map(|_| scope.get(squad(50), None))).await;

    assert_eq!(api.calls(), 1);
    assert_eq!(scope.len(), 1);
    for lookup in &lookups {
        assert!(lookup.success);
        assert_eq!(lookup.source, LookupSource::Refreshed);
        assert_eq!(lookup.data, lookups[0].data);
    }
}

#[tokio::test]
async fn failures_are_memoised_for_the_scope() {
    let api = ScriptedApi::new();
    let scope = RequestScope::new(orchestrator(
        Arc::new(InMemoryCacheEntries::new()),
        api.clone(),
        Arc::new(FixedClock::new(NOW)),
        CacheConfig::default(),
    ));

    assert!(!scope.get(squad(50), None).await.success);
    assert!(!scope.get(squad(50), None).await.success);
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn scopes_do_not_share_results() {
    let api = ScriptedApi::new();
    api.reply("players/squads?team=50", Ok(json!([])));
    api.reply("players/squads?team=33", Ok(json!([])));
    let orchestrator = orchestrator(
        Arc::new(InMemoryCacheEntries::new()),
        api.clone(),
        Arc::new(FixedClock::new(NOW)),
        CacheConfig::default(),
    );

    let first = RequestScope::new(Arc::clone(&orchestrator));
    first.get(squad(50), None).await;
    first.get(squad(33), None).await;
    assert_eq!(first.len(), 2);

    // The second scope finds the rows persisted by the first, so upstream stays quiet.
    let second = RequestScope::new(orchestrator);
    assert!(second.is_empty());
    let lookup = second.get(squad(50), None).await;
    assert_eq!(lookup.source, LookupSource::HitFresh);
    assert_eq!(api.calls(), 2);
}
