#![allow(clippy::unwrap_used)]
// Revalidation triggers: interval, error retry, environment events, and
// the scoped lifetime of a `Watcher`.

mod common;

use std::time::Duration;

use serde_json::json;

use refetch_core::RequestConfig;

use common::{Reply, ScriptedFetcher, revalidator, settle_tasks};

fn suspense() -> RequestConfig {
    RequestConfig::new().with_suspense(true)
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    settle_tasks().await;
}

// ── Interval ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_interval_issues_forced_revalidation() {
    let fetcher = ScriptedFetcher::new();
    fetcher.always(0, Reply::Ok(200, json!("tick")));
    let rev = revalidator(&fetcher);

    let res = rev
        .open("/clock", suspense().with_revalidate_interval("1 sec"))
        .await
        .unwrap();
    let _watcher = res.watch();
    assert_eq!(fetcher.calls(), 1);

    advance(999).await;
    assert_eq!(fetcher.calls(), 1);

    advance(51).await;
    assert_eq!(fetcher.calls(), 2);

    advance(1000).await;
    assert_eq!(fetcher.calls(), 3);
    assert!(res.state().success);
}

#[tokio::test(start_paused = true)]
async fn test_interval_skips_ticks_while_running() {
    let fetcher = ScriptedFetcher::new();
    fetcher.push(0, Reply::Ok(200, json!(0)));
    fetcher.always(2500, Reply::Ok(200, json!("slow")));
    let rev = revalidator(&fetcher);

    let res = rev
        .open("/slow", suspense().with_revalidate_interval(1000.0))
        .await
        .unwrap();
    let _watcher = res.watch();

    // Tick at 1s starts a fetch running until 3.5s; ticks at 2s and 3s
    // find it running and are skipped.
    advance(1100).await;
    assert_eq!(fetcher.calls(), 2);
    assert!(res.is_running());
    assert!(res.state().revalidating);

    advance(2500).await;
    assert_eq!(fetcher.calls(), 2);
    assert!(!res.is_running());
    assert_eq!(res.state().data, Some(json!("slow")));

    advance(500).await;
    assert_eq!(fetcher.calls(), 3);
}

// ── Error retry ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_retry_stops_at_attempt_ceiling() {
    let fetcher = ScriptedFetcher::new();
    fetcher.always(0, Reply::Fail(Some(500)));
    let rev = revalidator(&fetcher);

    let res = rev
        .open("/down", suspense().with_attempts(3))
        .await
        .unwrap();
    let _watcher = res.watch();
    assert_eq!(fetcher.calls(), 1);

    // Default backoff is 2 sec.
    advance(1900).await;
    assert_eq!(fetcher.calls(), 1);
    advance(200).await;
    assert_eq!(fetcher.calls(), 2);
    advance(2000).await;
    assert_eq!(fetcher.calls(), 3);

    advance(10_000).await;
    assert_eq!(fetcher.calls(), 3);
    assert_eq!(res.failures(), 3);
    assert!(res.state().error);
}

#[tokio::test(start_paused = true)]
async fn test_retry_succeeds_and_stops() {
    let fetcher = ScriptedFetcher::new();
    fetcher
        .push(0, Reply::Fail(None))
        .push(0, Reply::Ok(200, json!({"back": true})));
    let rev = revalidator(&fetcher);

    let res = rev
        .open("/flaky", suspense().with_attempt_interval("500 ms"))
        .await
        .unwrap();
    let _watcher = res.watch();

    advance(600).await;
    assert_eq!(fetcher.calls(), 2);
    assert!(res.state().success);
    assert_eq!(res.failures(), 0);

    advance(5000).await;
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_interval_dominates_retry() {
    let fetcher = ScriptedFetcher::new();
    fetcher.always(0, Reply::Fail(Some(503)));
    let rev = revalidator(&fetcher);

    let res = rev
        .open(
            "/down",
            suspense()
                .with_revalidate_interval("5 sec")
                .with_attempt_interval("1 sec"),
        )
        .await
        .unwrap();
    let _watcher = res.watch();

    advance(4000).await;
    assert_eq!(fetcher.calls(), 1);

    advance(1100).await;
    assert_eq!(fetcher.calls(), 2);
}

// ── Environment events ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_focus_and_reconnect_follow_their_options() {
    let fetcher = ScriptedFetcher::new();
    fetcher.always(0, Reply::Ok(200, json!("fresh")));
    let rev = revalidator(&fetcher);

    let res = rev
        .open("/feed", suspense().with_revalidate_on_focus(true))
        .await
        .unwrap();
    let watcher = res.watch();

    assert_eq!(rev.notify_focus(), 1);
    settle_tasks().await;
    assert_eq!(fetcher.calls(), 2);

    rev.notify_reconnect();
    settle_tasks().await;
    assert_eq!(fetcher.calls(), 2);

    watcher.stop().await;
    assert_eq!(rev.notify_focus(), 0);
    settle_tasks().await;
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_environment_event_is_skipped_while_running() {
    let fetcher = ScriptedFetcher::new();
    fetcher.push(0, Reply::Ok(200, json!(1)));
    fetcher.always(1000, Reply::Ok(200, json!(2)));
    let rev = revalidator(&fetcher);

    let res = rev
        .open("/feed", suspense().with_revalidate_on_reconnect(true))
        .await
        .unwrap();
    let _watcher = res.watch();

    rev.notify_reconnect();
    settle_tasks().await;
    rev.notify_reconnect();
    settle_tasks().await;
    assert_eq!(fetcher.calls(), 2);

    advance(1100).await;
    assert_eq!(res.state().data, Some(json!(2)));
}

// ── Watcher lifetime ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_dropping_watcher_clears_timers() {
    let fetcher = ScriptedFetcher::new();
    fetcher.always(0, Reply::Ok(200, json!("tick")));
    let rev = revalidator(&fetcher);

    let res = rev
        .open("/clock", suspense().with_revalidate_interval("1 sec"))
        .await
        .unwrap();
    let watcher = res.watch();
    assert!(watcher.is_active());

    advance(1500).await;
    assert_eq!(fetcher.calls(), 2);

    drop(watcher);
    advance(5000).await;
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_watcher_follows_reconfiguration() {
    let fetcher = ScriptedFetcher::new();
    fetcher.always(0, Reply::Ok(200, json!("tick")));
    let rev = revalidator(&fetcher);

    let res = rev
        .open("/clock", suspense().with_revalidate_interval("1 sec"))
        .await
        .unwrap();
    let _watcher = res.watch();

    res.reconfigure("/clock", suspense()).await.unwrap();
    assert_eq!(fetcher.calls(), 2);
    settle_tasks().await;

    advance(3000).await;
    assert_eq!(fetcher.calls(), 2);

    res.reconfigure("/clock", suspense().with_revalidate_interval("2 sec"))
        .await
        .unwrap();
    settle_tasks().await;
    assert_eq!(fetcher.calls(), 3);

    advance(2100).await;
    assert_eq!(fetcher.calls(), 4);
}
