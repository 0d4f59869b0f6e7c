//! Fixed-interval polling.
//!
//! [`PollingScheduler::schedule`] arms a repeating timer that refetches a
//! resource every interval. The timer is scoped: it lives exactly as long
//! as the returned [`PollGuard`], and it is torn down and re-armed whenever
//! the resource's params change, so a (resource, params) pair never has more
//! than one timer.
//!
//! Each tick spawns its refetch without waiting for the previous one.
//! Timer-driven and manual refetches are indistinguishable to the resource.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tether_core::error::RemoteError;
//! use tether_resource::{PollingScheduler, ResourceOptions, ResourceUnit, view_fn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let view = view_fn("height", |_: ()| async { Ok::<_, RemoteError>(1_u64) });
//! let unit = ResourceUnit::observe(view, Some(()), ResourceOptions::default());
//!
//! let guard = PollingScheduler::new(Duration::from_secs(10)).schedule(&unit);
//! assert!(guard.is_active());
//! drop(guard); // timer cancelled
//! # }
//! ```

use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;
use std::sync::Arc;

use tether_core::config::SyncConfig;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::aggregate::Refreshable;

/// Arms poll timers with a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingScheduler {
    interval: Duration,
}

impl PollingScheduler {
    /// Creates a scheduler ticking every `interval`.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        assert!(!interval.is_zero(), "poll interval must be greater than zero");
        Self { interval }
    }

    /// Creates a scheduler using the config's poll interval.
    ///
    /// # Panics
    ///
    /// Panics if the config's interval is zero; [`SyncConfig::validate`]
    /// rejects such configs.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.poll_interval())
    }

    /// Returns the tick interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts polling `target` until the returned guard is dropped.
    ///
    /// The first tick fires one interval after scheduling; the resource's
    /// own initial fetch covers time zero.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn schedule<T>(&self, target: &T) -> PollGuard
    where
        T: Refreshable + Clone,
    {
        let target = target.clone();
        let period = self.interval;
        let arms = Arc::new(AtomicU64::new(0));
        let ticks = Arc::new(AtomicU64::new(0));

        let task = {
            let arms = Arc::clone(&arms);
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                let mut epoch = target.params_epoch();
                // Targets without params (aggregates) close their epoch channel.
                let mut watching = true;
                loop {
                    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
                    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    arms.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!(resource = %target.label(), ?period, "poll timer armed");

                    loop {
                        tokio::select! {
                            _ = timer.tick() => {
                                ticks.fetch_add(1, Ordering::SeqCst);
                                tracing::trace!(resource = %target.label(), "poll tick");
                                tokio::spawn(target.refresh());
                            }
                            changed = epoch.changed(), if watching => {
                                if changed.is_err() {
                                    watching = false;
                                    continue;
                                }
                                tracing::debug!(
                                    resource = %target.label(),
                                    "params changed, re-arming poll timer"
                                );
                                break;
                            }
                        }
                    }
                    // The old timer is dropped here, before the next one is armed.
                }
            })
        };

        PollGuard { task, arms, ticks }
    }
}

/// Keeps a poll timer alive. Dropping it cancels the timer.
///
/// Refetches already spawned by past ticks are not cancelled; they run to
/// completion like any other fetch.
#[derive(Debug)]
pub struct PollGuard {
    task: JoinHandle<()>,
    arms: Arc<AtomicU64>,
    ticks: Arc<AtomicU64>,
}

impl PollGuard {
    /// Cancels the timer.
    pub fn cancel(self) {
        drop(self);
    }

    /// Returns `true` while the timer task is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Returns how many times a timer has been armed (initial arm plus one
    /// per params change).
    #[must_use]
    pub fn arm_count(&self) -> u64 {
        self.arms.load(Ordering::SeqCst)
    }

    /// Returns how many ticks have fired.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
