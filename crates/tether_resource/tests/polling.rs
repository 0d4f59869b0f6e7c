//! Poll timer tests.
//!
//! All tests run on a paused clock so tick times are exact.

mod common;

use core::time::Duration;

use common::{CountingView, ScriptedView, advance_to};
use tether_resource::{Aggregate, PollingScheduler, ResolutionPolicy, ResourceOptions, ResourceUnit, Status};
use tokio::time::Instant;

const SECOND: Duration = Duration::from_millis(1000);

// ═══════════════════════════════════════════════════════════════════════════════
// OVERLAPPING TICKS
// ═══════════════════════════════════════════════════════════════════════════════

// Latencies: the initial fetch answers at 10ms, the 1000ms tick is slow
// (answers at 3500ms) and the 2000ms tick is fast (answers at 2100ms).
const RACE_SCRIPT: &[u64] = &[10, 2500, 100];

/// Under `LastResolved` the slow tick lands last and overwrites the newer
/// value.
#[tokio::test(start_paused = true)]
async fn slow_tick_overwrites_under_last_resolved() {
    let start = Instant::now();
    let view = ScriptedView::new(RACE_SCRIPT);
    let unit = ResourceUnit::observe(
        view.clone(),
        Some("acct".to_owned()),
        ResourceOptions::default()
            .with_policy(ResolutionPolicy::LastResolved)
            .with_single_flight(false),
    );
    let guard = PollingScheduler::new(SECOND).schedule(&unit);

    advance_to(start, 2200).await;
    assert_eq!(guard.tick_count(), 2);
    assert_eq!(view.calls(), 3);
    assert_eq!(unit.value().as_deref(), Some("acct@3"));
    drop(guard);

    advance_to(start, 3600).await;
    assert_eq!(unit.value().as_deref(), Some("acct@2"));
    assert_eq!(unit.status(), Status::Ready);
}

/// Under `LastIssued` the slow tick's result is discarded.
#[tokio::test(start_paused = true)]
async fn slow_tick_is_discarded_under_last_issued() {
    let start = Instant::now();
    let view = ScriptedView::new(RACE_SCRIPT);
    let unit = ResourceUnit::observe(
        view.clone(),
        Some("acct".to_owned()),
        ResourceOptions::default().with_single_flight(false),
    );
    let guard = PollingScheduler::new(SECOND).schedule(&unit);

    advance_to(start, 2200).await;
    assert_eq!(view.calls(), 3);
    assert_eq!(unit.value().as_deref(), Some("acct@3"));
    drop(guard);

    advance_to(start, 3600).await;
    assert_eq!(unit.value().as_deref(), Some("acct@3"));
    assert_eq!(unit.status(), Status::Ready);
}

/// With single-flight, the 2000ms tick joins the slow fetch instead of
/// racing it.
#[tokio::test(start_paused = true)]
async fn tick_joins_outstanding_fetch_under_single_flight() {
    let start = Instant::now();
    let view = ScriptedView::new(RACE_SCRIPT);
    let unit = ResourceUnit::observe(
        view.clone(),
        Some("acct".to_owned()),
        ResourceOptions::default(),
    );
    let guard = PollingScheduler::new(SECOND).schedule(&unit);

    advance_to(start, 2200).await;
    assert_eq!(guard.tick_count(), 2);
    assert_eq!(view.calls(), 2);
    assert!(unit.loading());
    assert_eq!(unit.value().as_deref(), Some("acct@1"));
    drop(guard);

    advance_to(start, 3600).await;
    assert_eq!(unit.value().as_deref(), Some("acct@2"));
    assert_eq!(unit.fetches_issued(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════════
// TIMER SCOPE
// ═══════════════════════════════════════════════════════════════════════════════

/// A params change tears down the timer and re-arms it from the change.
#[tokio::test(start_paused = true)]
async fn params_change_rearms_timer() {
    let start = Instant::now();
    let view = CountingView::default();
    let unit = ResourceUnit::observe(view.clone(), Some("a".to_owned()), ResourceOptions::default());
    let guard = PollingScheduler::new(SECOND).schedule(&unit);

    advance_to(start, 500).await;
    assert_eq!(guard.arm_count(), 1);
    unit.set_params(Some("b".to_owned()));

    // The original timer would have fired at 1000ms.
    advance_to(start, 1200).await;
    assert_eq!(guard.arm_count(), 2);
    assert_eq!(guard.tick_count(), 0);

    // Re-armed ticks land at 1500ms and 2500ms, and only those.
    advance_to(start, 2600).await;
    assert_eq!(guard.tick_count(), 2);
    assert_eq!(view.calls(), 4);
    assert_eq!(unit.value().as_deref(), Some("b#4"));
}

/// Equal params do not disturb the timer.
#[tokio::test(start_paused = true)]
async fn equal_params_keep_timer() {
    let start = Instant::now();
    let unit = ResourceUnit::observe(
        CountingView::default(),
        Some("a".to_owned()),
        ResourceOptions::default(),
    );
    let guard = PollingScheduler::new(SECOND).schedule(&unit);

    advance_to(start, 500).await;
    assert!(!unit.set_params(Some("a".to_owned())));

    advance_to(start, 1100).await;
    assert_eq!(guard.arm_count(), 1);
    assert_eq!(guard.tick_count(), 1);
}

/// Dropping the guard stops further ticks.
#[tokio::test(start_paused = true)]
async fn dropping_guard_cancels_timer() {
    let start = Instant::now();
    let view = CountingView::default();
    let unit = ResourceUnit::observe(view.clone(), Some("a".to_owned()), ResourceOptions::default());
    let guard = PollingScheduler::new(SECOND).schedule(&unit);

    advance_to(start, 1500).await;
    assert!(guard.is_active());
    assert_eq!(view.calls(), 2);
    guard.cancel();

    advance_to(start, 6000).await;
    assert_eq!(view.calls(), 2);
}

/// Polling a not-ready resource ticks without calling the view.
#[tokio::test(start_paused = true)]
async fn ticks_on_not_ready_resource_are_noops() {
    let start = Instant::now();
    let view = CountingView::default();
    let unit = ResourceUnit::observe(view.clone(), None, ResourceOptions::default());
    let guard = PollingScheduler::new(SECOND).schedule(&unit);

    advance_to(start, 3500).await;
    assert_eq!(guard.tick_count(), 3);
    assert_eq!(view.calls(), 0);
    assert_eq!(unit.status(), Status::Idle);
}

/// Polling an aggregate refreshes every member on each tick.
#[tokio::test(start_paused = true)]
async fn aggregate_poll_refreshes_all_members() {
    let start = Instant::now();
    let first = CountingView::default();
    let second = CountingView::default();
    let a = ResourceUnit::observe(first.clone(), Some("a".to_owned()), ResourceOptions::default());
    let b = ResourceUnit::observe(second.clone(), Some("b".to_owned()), ResourceOptions::default());
    let aggregate = Aggregate::new().with("a", &a).with("b", &b);

    let guard = PollingScheduler::new(SECOND).schedule(&aggregate);

    advance_to(start, 2500).await;
    assert!(guard.is_active());
    assert_eq!(guard.arm_count(), 1);
    assert_eq!(first.calls(), 3);
    assert_eq!(second.calls(), 3);
    assert_eq!(aggregate.status(), Status::Ready);
}

#[test]
#[should_panic(expected = "poll interval must be greater than zero")]
fn zero_interval_is_rejected() {
    let _ = PollingScheduler::new(Duration::ZERO);
}
