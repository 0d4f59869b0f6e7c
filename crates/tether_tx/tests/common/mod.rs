//! Test doubles for the signer and finality collaborators.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tether_core::address::Address;
use tether_core::error::RemoteError;
use tether_core::wallet::{PendingTransaction, Signer, TransactionPayload, TxHash, WalletSession};
use tether_tx::{BuildError, FinalityWatcher, FnBuilder, builder_fn};

#[derive(Debug, thiserror::Error)]
#[error("connection reset")]
pub struct ConnectionReset;

/// What a [`ScriptedSigner`] answers.
pub enum SubmitOutcome {
    Accept(&'static str),
    Reject(&'static str),
    Opaque,
}

/// A signer that records payloads and answers with a fixed outcome.
pub struct ScriptedSigner {
    outcome: SubmitOutcome,
    latency: Duration,
    pub calls: AtomicU64,
    pub payloads: Mutex<Vec<TransactionPayload>>,
}

impl ScriptedSigner {
    pub fn new(outcome: SubmitOutcome) -> Arc<Self> {
        Self::with_latency(outcome, Duration::ZERO)
    }

    pub fn with_latency(outcome: SubmitOutcome, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            latency,
            calls: AtomicU64::new(0),
            payloads: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signer for ScriptedSigner {
    async fn submit(&self, payload: TransactionPayload) -> Result<PendingTransaction, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().push(payload);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.outcome {
            SubmitOutcome::Accept(hash) => Ok(PendingTransaction::new(TxHash::new(hash))),
            SubmitOutcome::Reject(message) => Err(RemoteError::rejected(message)),
            SubmitOutcome::Opaque => Err(RemoteError::opaque(ConnectionReset)),
        }
    }
}

/// A finality watcher that records hashes and answers with a fixed result.
pub struct ScriptedFinality {
    revert: Option<&'static str>,
    pub calls: AtomicU64,
    pub hashes: Mutex<Vec<TxHash>>,
}

impl ScriptedFinality {
    pub fn ok() -> Arc<Self> {
        Self::build(None)
    }

    pub fn reverting(reason: &'static str) -> Arc<Self> {
        Self::build(Some(reason))
    }

    fn build(revert: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            revert,
            calls: AtomicU64::new(0),
            hashes: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FinalityWatcher for ScriptedFinality {
    async fn await_finality(&self, hash: &TxHash) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hashes.lock().push(hash.clone());
        match self.revert {
            Some(reason) => Err(RemoteError::Reverted(reason.to_owned())),
            None => Ok(()),
        }
    }
}

/// A session connected as `0xa11ce` with `signer`.
pub fn connected(signer: Arc<ScriptedSigner>) -> WalletSession {
    let session = WalletSession::new();
    session.connect(Address::new("0xa11ce"), signer);
    session
}

/// A withdraw builder that rejects stream id zero.
pub fn withdraw_builder()
-> FnBuilder<impl Fn(u64) -> Result<TransactionPayload, BuildError> + Send + Sync + 'static, u64> {
    builder_fn("withdraw", |stream_id: u64| {
        if stream_id == 0 {
            return Err(BuildError::invalid("stream_id", "must be non-zero"));
        }
        Ok(TransactionPayload::entry("tether::stream::withdraw").with_argument(stream_id))
    })
}
