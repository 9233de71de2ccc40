#![allow(clippy::unwrap_used)]
// Fetch-cycle behaviour of the engine: first load, deduplication,
// supersession, failure accounting, mutation, and per-config caching.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use refetch_core::{CoreError, RequestConfig, ResourceKey};

use common::{Reply, ScriptedFetcher, manual, revalidator, settle_tasks};

fn suspense() -> RequestConfig {
    RequestConfig::new().with_suspense(true)
}

// ── First load ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_first_load_commits_success_state() {
    let fetcher = ScriptedFetcher::new();
    fetcher.push(50, Reply::Ok(200, json!({"id": 1})));
    let rev = revalidator(&fetcher);

    let res = rev.open("/users", RequestConfig::new()).await.unwrap();
    assert_eq!(res.key().to_value(), json!("GET /users"));
    assert!(res.state().loading);
    assert!(!res.state().revalidating);

    let state = res.settled().await;
    assert_eq!(state.data, Some(json!({"id": 1})));
    assert!(!state.loading);
    assert!(state.success);
    assert!(!state.error);
    assert_eq!(state.status, Some(200));
    assert!(state.end.is_some());
    assert!(state.response_time.unwrap() >= 50);

    settle_tasks().await;
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(fetcher.requests()[0].method, "GET");
    assert_eq!(fetcher.requests()[0].url, "/users");
}

#[tokio::test(start_paused = true)]
async fn test_auto_disabled_never_fetches() {
    let fetcher = ScriptedFetcher::new();
    let rev = revalidator(&fetcher);

    let res = rev
        .open("/users", manual().with_default(json!([])))
        .await
        .unwrap();
    settle_tasks().await;

    let state = res.state();
    assert!(!state.loading);
    assert_eq!(state.data, Some(json!([])));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_suspense_open_waits_for_first_load() {
    let fetcher = ScriptedFetcher::new();
    fetcher.push(200, Reply::Ok(200, json!("ready")));
    let rev = revalidator(&fetcher);

    let res = rev.open("/slow", suspense()).await.unwrap();

    let state = res.state();
    assert!(!state.loading);
    assert_eq!(state.data, Some(json!("ready")));
}

#[tokio::test(start_paused = true)]
async fn test_second_suspense_opener_waits_on_in_flight_load() {
    let fetcher = ScriptedFetcher::new();
    fetcher.push(100, Reply::Ok(200, json!("shared")));
    let rev = revalidator(&fetcher);

    let first = tokio::spawn({
        let rev = rev.clone();
        async move { rev.open("/shared", suspense()).await }
    });
    settle_tasks().await;

    let second = rev.open("/shared", suspense()).await.unwrap();
    assert_eq!(second.state().data, Some(json!("shared")));
    assert!(!second.state().loading);

    first.await.unwrap().unwrap();
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_suspense_load_releases_waiting_opener() {
    let fetcher = ScriptedFetcher::new();
    fetcher.push(1_000, Reply::Ok(200, json!("abandoned")));
    fetcher.push(100, Reply::Ok(200, json!("reloaded")));
    let rev = revalidator(&fetcher);

    let first = tokio::spawn({
        let rev = rev.clone();
        async move { rev.open("/k", suspense()).await }
    });
    settle_tasks().await;
    let second = tokio::spawn({
        let rev = rev.clone();
        async move { rev.open("/k", suspense()).await }
    });
    settle_tasks().await;
    assert_eq!(fetcher.calls(), 1);

    first.abort();
    let second = tokio::time::timeout(Duration::from_secs(3600), second)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let state = second.state();
    assert!(!state.loading);
    assert!(state.success);
    assert_eq!(state.data, Some(json!("reloaded")));
    assert_eq!(fetcher.calls(), 2);
    assert!(!second.is_running());
}

// ── Deduplication ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_unchanged_configuration_is_a_no_op() {
    let fetcher = ScriptedFetcher::new();
    fetcher.push(10, Reply::Ok(200, json!({"id": 1})));
    let rev = revalidator(&fetcher);

    let res = rev.open("/users", RequestConfig::new()).await.unwrap();
    let before = res.settled().await;
    settle_tasks().await;

    let again = rev.open("/users", RequestConfig::new()).await.unwrap();
    settle_tasks().await;

    assert_eq!(again.state(), before);
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_openers_share_one_fetch() {
    let fetcher = ScriptedFetcher::new();
    fetcher.push(100, Reply::Ok(200, json!("once")));
    let rev = revalidator(&fetcher);

    let a = rev.open("/users", RequestConfig::new()).await.unwrap();
    let b = rev.open("/users", RequestConfig::new()).await.unwrap();
    assert_eq!(a.key(), b.key());

    let state = b.settled().await;
    settle_tasks().await;
    assert_eq!(state.data, Some(json!("once")));
    assert_eq!(a.state(), b.state());
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(rev.keys(), vec![a.key()]);
}

// ── Supersession ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_newer_cycle_supersedes_slower_one() {
    let fetcher = ScriptedFetcher::new();
    fetcher
        .push(100, Reply::Ok(200, json!("a")))
        .push(10, Reply::Ok(200, json!("b")));
    let rev = revalidator(&fetcher);
    let res = rev.open("/race", manual()).await.unwrap();

    let first = tokio::spawn({
        let res = res.clone();
        async move { res.revalidate().await }
    });
    settle_tasks().await;
    assert!(res.is_running());

    let state = res.revalidate().await;
    assert_eq!(state.data, Some(json!("b")));
    assert!(state.success);
    assert!(first.is_finished());

    first.await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(res.state().data, Some(json!("b")));
    assert!(!res.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_superseded_fast_response_is_never_committed() {
    let fetcher = ScriptedFetcher::new();
    fetcher
        .push(10, Reply::Ok(200, json!("a")))
        .push(100, Reply::Ok(200, json!("b")));
    let rev = revalidator(&fetcher);
    let res = rev.open("/race", manual()).await.unwrap();

    let first = tokio::spawn({
        let res = res.clone();
        async move { res.revalidate().await }
    });
    settle_tasks().await;
    let second = tokio::spawn({
        let res = res.clone();
        async move { res.revalidate().await }
    });
    settle_tasks().await;

    // Past the point where the first response would have landed.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let state = res.state();
    assert!(state.loading);
    assert_eq!(state.data, None);
    assert!(res.is_running());

    second.await.unwrap();
    first.await.unwrap();
    assert_eq!(res.state().data, Some(json!("b")));
    assert!(!res.is_running());
}

// ── Failure accounting ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_failure_counter_increments_and_resets() {
    let fetcher = ScriptedFetcher::new();
    fetcher
        .push(0, Reply::Ok(500, json!({"err": 1})))
        .push(0, Reply::Ok(503, json!({"err": 2})))
        .push(0, Reply::Ok(200, json!({"ok": true})));
    let rev = revalidator(&fetcher);

    let res = rev.open("/flaky", suspense()).await.unwrap();
    let state = res.state();
    assert!(state.error && !state.success);
    assert_eq!(state.status, Some(500));
    assert_eq!(state.data, Some(json!({"err": 1})));
    assert_eq!(res.failures(), 1);

    res.revalidate().await;
    assert_eq!(res.failures(), 2);

    let state = res.revalidate().await;
    assert!(state.success && !state.error);
    assert_eq!(res.failures(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_configuration_change_resets_failure_counter() {
    let fetcher = ScriptedFetcher::new();
    fetcher.always(0, Reply::Ok(500, json!(null)));
    let rev = revalidator(&fetcher);

    let res = rev.open("/flaky", suspense()).await.unwrap();
    res.revalidate().await;
    assert_eq!(res.failures(), 2);

    res.reconfigure("/flaky", suspense().with_query("v", 2))
        .await
        .unwrap();
    assert_eq!(res.failures(), 1);
    assert_eq!(fetcher.calls(), 3);
    assert_eq!(fetcher.requests()[2].url, "/flaky?v=2");
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_preserves_data() {
    let fetcher = ScriptedFetcher::new();
    fetcher
        .push(0, Reply::Ok(200, json!({"id": 1})))
        .push(0, Reply::Fail(None))
        .push(0, Reply::Fail(Some(502)));
    let rev = revalidator(&fetcher);

    let res = rev.open("/users/1", suspense()).await.unwrap();

    let state = res.revalidate().await;
    assert!(state.error);
    assert_eq!(state.data, Some(json!({"id": 1})));
    assert_eq!(state.status, None);

    let state = res.revalidate().await;
    assert_eq!(state.data, Some(json!({"id": 1})));
    assert_eq!(state.status, Some(502));
    assert_eq!(res.failures(), 2);
}

// ── Mutation ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_mutate_overwrites_only_data() {
    let fetcher = ScriptedFetcher::new();
    fetcher.push(0, Reply::Ok(404, json!({"missing": true})));
    let rev = revalidator(&fetcher);

    let res = rev.open("/todo", suspense()).await.unwrap();
    let before = res.state();

    rev.mutate(&res.key(), json!({"title": "local"})).unwrap();
    let after = res.state();
    assert_eq!(after.data, Some(json!({"title": "local"})));
    assert_eq!(after.loading, before.loading);
    assert_eq!(after.error, before.error);
    assert_eq!(after.success, before.success);
    assert_eq!(after.status, before.status);
    assert_eq!(res.failures(), 1);

    res.mutate(json!([1, 2]));
    assert_eq!(res.state().data, Some(json!([1, 2])));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_mutate_unknown_key_is_an_error() {
    let rev = revalidator(&ScriptedFetcher::new());
    let key = ResourceKey::from_value(&json!("GET /never"));
    let err = rev.mutate(&key, json!(1)).unwrap_err();
    assert!(matches!(err, CoreError::UnknownKey { .. }));
    assert!(rev.state(&key).is_none());
}

// ── Per-config cache ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_switching_back_reseeds_cached_payload() {
    let fetcher = ScriptedFetcher::new();
    fetcher
        .push(0, Reply::Ok(200, json!("page one")))
        .push(0, Reply::Ok(200, json!("page two")))
        .push(100, Reply::Ok(200, json!("page one, fresh")));
    let rev = revalidator(&fetcher);

    let res = rev
        .open("/items", suspense().with_query("page", 1))
        .await
        .unwrap();
    res.reconfigure("/items", suspense().with_query("page", 2))
        .await
        .unwrap();
    assert_eq!(res.state().data, Some(json!("page two")));

    let back = tokio::spawn({
        let res = res.clone();
        async move {
            res.reconfigure("/items", suspense().with_query("page", 1))
                .await
        }
    });
    settle_tasks().await;

    let state = res.state();
    assert_eq!(state.data, Some(json!("page one")));
    assert!(state.loading && state.revalidating);

    let state = back.await.unwrap().unwrap();
    assert_eq!(state.data, Some(json!("page one, fresh")));
    assert!(!state.revalidating);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_key_change_moves_the_handle() {
    let fetcher = ScriptedFetcher::new();
    fetcher.always(0, Reply::Ok(200, json!("x")));
    let rev = revalidator(&fetcher);

    let res = rev
        .open("/a", suspense().with_key("first"))
        .await
        .unwrap();
    res.reconfigure("/a", suspense().with_key("second"))
        .await
        .unwrap();

    assert_eq!(res.key().to_value(), json!("second"));
    assert_eq!(rev.keys().len(), 2);
    assert_eq!(fetcher.calls(), 2);
}

// ── Streams ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_subscribers_observe_loading_then_result() {
    let fetcher = ScriptedFetcher::new();
    fetcher.push(10, Reply::Ok(200, json!({"id": 9})));
    let rev = revalidator(&fetcher);
    let res = rev.open("/users/9", manual()).await.unwrap();

    let mut stream = res.subscribe();
    assert!(!stream.current().loading);

    let cycle = tokio::spawn({
        let res = res.clone();
        async move { res.revalidate().await }
    });

    let loading = stream.changed().await.unwrap();
    assert!(loading.loading);
    let done = stream.changed().await.unwrap();
    assert!(done.success);
    assert_eq!(done.data, Some(json!({"id": 9})));
    assert_eq!(stream.latest(), done);

    cycle.await.unwrap();
    assert_eq!(rev.subscribe(&res.key()).unwrap().current(), &done);
}
