//! Shared helpers for resource integration tests.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;
use std::sync::Arc;

use async_trait::async_trait;
use tether_core::error::RemoteError;
use tether_resource::View;
use tokio::sync::{mpsc, oneshot};

/// A fetch parked inside [`GatedView`], waiting for the test to answer it.
pub struct PendingFetch {
    pub params: String,
    reply: oneshot::Sender<Result<String, RemoteError>>,
}

impl PendingFetch {
    pub fn succeed(self, value: &str) {
        let _ = self.reply.send(Ok(value.to_owned()));
    }

    pub fn fail(self, err: RemoteError) {
        let _ = self.reply.send(Err(err));
    }
}

/// A view whose every call blocks until the test resolves it.
pub struct GatedView {
    calls: mpsc::UnboundedSender<PendingFetch>,
}

impl GatedView {
    pub fn new() -> (Self, Gate) {
        let (calls, rx) = mpsc::unbounded_channel();
        (Self { calls }, Gate { rx })
    }
}

#[async_trait]
impl View for GatedView {
    type Params = String;
    type Output = String;

    fn name(&self) -> &str {
        "gated"
    }

    async fn fetch(&self, params: String) -> Result<String, RemoteError> {
        let (reply, answer) = oneshot::channel();
        self.calls
            .send(PendingFetch { params, reply })
            .expect("gate dropped");
        answer
            .await
            .unwrap_or_else(|_| Err(RemoteError::rejected("gate dropped")))
    }
}

/// Test side of a [`GatedView`].
pub struct Gate {
    rx: mpsc::UnboundedReceiver<PendingFetch>,
}

impl Gate {
    /// Waits for the next view call.
    pub async fn next(&mut self) -> PendingFetch {
        self.rx.recv().await.expect("view dropped")
    }

    /// Returns `true` if no view call is waiting.
    pub fn is_quiet(&mut self) -> bool {
        self.rx.try_recv().is_err()
    }
}

/// A view that answers immediately with `"<params>#<n>"` and counts calls.
#[derive(Clone, Default)]
pub struct CountingView {
    calls: Arc<AtomicU64>,
}

impl CountingView {
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl View for CountingView {
    type Params = String;
    type Output = String;

    fn name(&self) -> &str {
        "counting"
    }

    async fn fetch(&self, params: String) -> Result<String, RemoteError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{params}#{n}"))
    }
}

/// A view whose n-th call takes `latencies[n - 1]` before answering
/// `"<params>@<n>"`. Calls past the script answer immediately.
#[derive(Clone)]
pub struct ScriptedView {
    latencies: Arc<Vec<Duration>>,
    calls: Arc<AtomicU64>,
}

impl ScriptedView {
    pub fn new(latencies_ms: &[u64]) -> Self {
        Self {
            latencies: Arc::new(latencies_ms.iter().copied().map(Duration::from_millis).collect()),
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl View for ScriptedView {
    type Params = String;
    type Output = String;

    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, params: String) -> Result<String, RemoteError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let index = usize::try_from(n - 1).unwrap_or(usize::MAX);
        if let Some(latency) = self.latencies.get(index) {
            tokio::time::sleep(*latency).await;
        }
        Ok(format!("{params}@{n}"))
    }
}

/// Sleeps until `ms` milliseconds after `start` on the paused clock.
pub async fn advance_to(start: tokio::time::Instant, ms: u64) {
    tokio::time::sleep_until(start + Duration::from_millis(ms)).await;
}

/// Lets every runnable task run. Requires a paused clock: the runtime only
/// auto-advances time once nothing else can make progress.
pub async fn run_until_idle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
