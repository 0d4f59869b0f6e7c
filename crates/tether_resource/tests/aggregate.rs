//! Aggregate composition tests.

mod common;

use core::time::Duration;

use async_trait::async_trait;
use common::{GatedView, run_until_idle};
use tether_core::error::RemoteError;
use tether_resource::{Aggregate, ResourceOptions, ResourceUnit, Status, View};
use tokio::time::Instant;

/// Answers after `latency`, failing with `"<name> broke"` when `fails`.
#[derive(Clone)]
struct Outcome {
    name: &'static str,
    fails: bool,
    latency: Duration,
}

impl Outcome {
    fn ok(name: &'static str, latency_ms: u64) -> Self {
        Self {
            name,
            fails: false,
            latency: Duration::from_millis(latency_ms),
        }
    }

    fn err(name: &'static str, latency_ms: u64) -> Self {
        Self {
            fails: true,
            ..Self::ok(name, latency_ms)
        }
    }
}

#[async_trait]
impl View for Outcome {
    type Params = ();
    type Output = u64;

    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, _params: ()) -> Result<u64, RemoteError> {
        tokio::time::sleep(self.latency).await;
        if self.fails {
            Err(RemoteError::rejected(format!("{} broke", self.name)))
        } else {
            Ok(1)
        }
    }
}

fn unit(view: Outcome) -> ResourceUnit<Outcome> {
    ResourceUnit::observe(view, Some(()), ResourceOptions::default())
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR ORDER
// ═══════════════════════════════════════════════════════════════════════════════

/// The surfaced error follows declaration order, not completion order.
#[tokio::test(start_paused = true)]
async fn first_error_follows_declared_order() {
    let slow = unit(Outcome::err("balance", 300));
    let fast = unit(Outcome::err("flags", 10));
    let aggregate = Aggregate::new().with("balance", &slow).with("flags", &fast);

    aggregate.refetch().await;

    assert_eq!(aggregate.status(), Status::Failed);
    assert_eq!(aggregate.error().unwrap().message, "balance broke");

    let reversed = Aggregate::new().with("flags", &fast).with("balance", &slow);
    assert_eq!(reversed.error().unwrap().message, "flags broke");
}

/// Healthy members keep their values while a sibling fails.
#[tokio::test(start_paused = true)]
async fn failing_member_does_not_affect_siblings() {
    let good = unit(Outcome::ok("balance", 50));
    let bad = unit(Outcome::err("disputes", 10));
    let aggregate = Aggregate::new().with("balance", &good).with("disputes", &bad);

    aggregate.refetch().await;

    assert_eq!(good.value(), Some(1));
    assert_eq!(aggregate.member_status("balance"), Some(Status::Ready));
    assert_eq!(aggregate.member_status("disputes"), Some(Status::Failed));
    assert_eq!(aggregate.member_status("missing"), None);
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATUS
// ═══════════════════════════════════════════════════════════════════════════════

/// The aggregate is loading exactly while some member is.
#[tokio::test(start_paused = true)]
async fn loading_while_any_member_loads() {
    let (first_view, mut first_gate) = GatedView::new();
    let (second_view, mut second_gate) = GatedView::new();
    let first = ResourceUnit::observe(first_view, Some("a".to_owned()), ResourceOptions::default());
    let second = ResourceUnit::observe(second_view, Some("b".to_owned()), ResourceOptions::default());
    let aggregate = Aggregate::new().with("first", &first).with("second", &second);

    let first_fetch = first_gate.next().await;
    let second_fetch = second_gate.next().await;
    assert!(aggregate.loading());

    first_fetch.succeed("1");
    run_until_idle().await;
    assert!(aggregate.loading());
    assert_eq!(aggregate.member_status("first"), Some(Status::Ready));

    second_fetch.fail(RemoteError::Timeout);
    run_until_idle().await;
    assert!(!aggregate.loading());

    let view = aggregate.view();
    assert_eq!(view.status, Status::Failed);
    assert_eq!(
        view.members,
        vec![
            ("first".to_owned(), Status::Ready),
            ("second".to_owned(), Status::Failed),
        ]
    );
}

/// Not-ready members stay idle and do not hold the aggregate in loading.
#[tokio::test(start_paused = true)]
async fn idle_members_do_not_block_ready() {
    let ready = unit(Outcome::ok("balance", 0));
    let idle = ResourceUnit::observe(Outcome::ok("stream", 0), None, ResourceOptions::default());
    let aggregate = Aggregate::new().with("balance", &ready).with("stream", &idle);

    aggregate.refetch().await;

    assert_eq!(aggregate.status(), Status::Ready);
    assert_eq!(idle.status(), Status::Idle);
    assert_eq!(idle.fetches_issued(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// REFETCH
// ═══════════════════════════════════════════════════════════════════════════════

/// Refetch waits for the slowest member even when another fails at once.
#[tokio::test(start_paused = true)]
async fn refetch_waits_for_every_member() {
    let start = Instant::now();
    let quick_failure = unit(Outcome::err("flags", 0));
    let slow = unit(Outcome::ok("balance", 5_000));
    let aggregate = Aggregate::new().with("flags", &quick_failure).with("balance", &slow);

    aggregate.refetch().await;

    assert!(start.elapsed() >= Duration::from_millis(5_000));
    assert_eq!(slow.status(), Status::Ready);
    assert_eq!(aggregate.status(), Status::Failed);
    assert_eq!(aggregate.error().unwrap().message, "flags broke");
}

/// Members refetch side by side: two one-second members take one second.
#[tokio::test(start_paused = true)]
async fn refetch_runs_members_concurrently() {
    let balance = unit(Outcome::ok("balance", 1_000));
    let flags = unit(Outcome::ok("flags", 1_000));
    let aggregate = Aggregate::new().with("balance", &balance).with("flags", &flags);
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(aggregate.status(), Status::Ready);

    let start = Instant::now();
    aggregate.refetch().await;

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(1_000));
    assert!(elapsed < Duration::from_millis(2_000), "refetch took {elapsed:?}");
    assert_eq!(aggregate.status(), Status::Ready);
}

/// Aggregates nest: an aggregate can be a member of another.
#[tokio::test(start_paused = true)]
async fn aggregates_nest() {
    let balance = unit(Outcome::ok("balance", 10));
    let flags = unit(Outcome::err("flags", 10));
    let inner = Aggregate::new().with("flags", &flags);
    let outer = Aggregate::new().with("balance", &balance).with("compliance", &inner);

    outer.refetch().await;

    assert_eq!(outer.len(), 2);
    assert_eq!(outer.names(), vec!["balance", "compliance"]);
    assert_eq!(outer.member_status("compliance"), Some(Status::Failed));
    assert_eq!(outer.error().unwrap().message, "flags broke");
}

#[test]
#[should_panic(expected = "aggregate member 'balance' is already registered")]
fn duplicate_member_names_are_rejected() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let _guard = runtime.enter();
    let balance = unit(Outcome::ok("balance", 0));
    let _ = Aggregate::new().with("balance", &balance).with("balance", &balance);
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROPERTY-BASED TESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Property-based tests for status combination and error selection.
///
/// `combine_status` is checked against a rank model: Loading outranks
/// Failed, which outranks Ready, which outranks Idle.
///
/// The aggregate property builds members with random outcomes and latencies
/// and checks that, after one refetch, nothing is loading, the status is
/// `Failed` iff some member failed, and the error is the first failing
/// member's in declared order. Each case runs on its own paused
/// current-thread runtime.
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use tether_resource::combine_status;

    fn rank(status: Status) -> u8 {
        match status {
            Status::Idle => 0,
            Status::Ready => 1,
            Status::Failed => 2,
            Status::Loading => 3,
        }
    }

    fn arb_status() -> impl Strategy<Value = Status> {
        prop_oneof![
            Just(Status::Idle),
            Just(Status::Loading),
            Just(Status::Ready),
            Just(Status::Failed),
        ]
    }

    const NAMES: [&str; 6] = ["m0", "m1", "m2", "m3", "m4", "m5"];

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        /// The combined status is the highest-ranked member status.
        #[test]
        fn prop_combined_status_matches_rank_model(
            statuses in prop::collection::vec(arb_status(), 0..8usize),
        ) {
            let expected = statuses
                .iter()
                .copied()
                .max_by_key(|s| rank(*s))
                .unwrap_or(Status::Idle);
            prop_assert_eq!(combine_status(statuses), expected);
        }

        /// After a refetch the error belongs to the first failing member.
        #[test]
        fn prop_error_is_first_failure_in_declared_order(
            outcomes in prop::collection::vec((any::<bool>(), 0..500u64), 1..=6usize),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .start_paused(true)
                .build()
                .expect("tokio runtime");
            runtime.block_on(async {
                let mut aggregate = Aggregate::new();
                for (name, (fails, latency)) in NAMES.iter().zip(&outcomes) {
                    let view = if *fails {
                        Outcome::err(*name, *latency)
                    } else {
                        Outcome::ok(*name, *latency)
                    };
                    aggregate = aggregate.with(*name, &unit(view));
                }

                aggregate.refetch().await;

                let first_failure = NAMES
                    .iter()
                    .zip(&outcomes)
                    .find(|(_, (fails, _))| *fails)
                    .map(|(name, _)| format!("{name} broke"));
                let expected_status = if first_failure.is_some() {
                    Status::Failed
                } else {
                    Status::Ready
                };

                prop_assert!(!aggregate.loading());
                prop_assert_eq!(aggregate.status(), expected_status);
                prop_assert_eq!(aggregate.error().map(|e| e.message), first_failure);
                Ok(())
            })?;
        }
    }
}
