//! An in-process ledger for demos and tests.
//!
//! [`InMemoryLedger`] answers the view functions in [`functions`], accepts
//! signed entry calls through [`LedgerSigner`], and executes them when their
//! finality is awaited. Entry calls that break a ledger rule revert with a
//! reason instead of mutating state.
//!
//! Faults can be injected to exercise error paths: a failing view function,
//! a rejected submit, or added latency.

use core::time::Duration;
use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tether_core::address::Address;
use tether_core::error::RemoteError;
use tether_core::wallet::{PendingTransaction, Signer, TransactionPayload, TxHash};
use tether_tx::FinalityWatcher;

use crate::client::{
    ComplianceRecord, DisputeRecord, LedgerClient, StreamRecord, StreamState, decode_arg,
    decode_u64_arg, functions,
};

#[derive(Default)]
struct LedgerState {
    balances: HashMap<Address, u64>,
    compliance: HashMap<Address, ComplianceRecord>,
    streams: Vec<StreamRecord>,
    disputes: Vec<DisputeRecord>,
    pending: HashMap<TxHash, (Address, TransactionPayload)>,
    submitted: u64,
    view_faults: HashMap<String, String>,
    reject_next_submit: Option<String>,
}

impl LedgerState {
    fn stream_mut(&mut self, id: u64) -> Result<&mut StreamRecord, String> {
        self.streams
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| format!("stream {id} not found"))
    }

    fn execute(&mut self, sender: &Address, payload: &TransactionPayload) -> Result<(), String> {
        let args = &payload.arguments;
        let reason = |err: RemoteError| err.to_string();
        match payload.function.as_str() {
            functions::CREATE_STREAM => {
                let recipient: Address = decode_arg(args, 0, "recipient").map_err(reason)?;
                let amount = decode_u64_arg(args, 1, "amount").map_err(reason)?;
                let duration_secs = decode_u64_arg(args, 2, "duration_secs").map_err(reason)?;

                let flags = self.compliance.get(sender).cloned().unwrap_or_default();
                if flags.frozen {
                    return Err("account frozen".to_owned());
                }
                if flags.threshold > 0 && amount > flags.threshold {
                    return Err("amount exceeds compliance threshold".to_owned());
                }
                let balance = self.balances.entry(sender.clone()).or_default();
                if *balance < amount {
                    return Err("insufficient balance".to_owned());
                }
                *balance -= amount;

                let id = self.streams.len() as u64 + 1;
                self.streams.push(StreamRecord {
                    id,
                    sender: sender.clone(),
                    recipient,
                    amount,
                    withdrawn: 0,
                    duration_secs,
                    state: StreamState::Active,
                });
                Ok(())
            }
            functions::WITHDRAW => {
                let id = decode_u64_arg(args, 0, "stream_id").map_err(reason)?;
                let stream = self.stream_mut(id)?;
                if &stream.recipient != sender {
                    return Err("only the recipient can withdraw".to_owned());
                }
                if stream.state != StreamState::Active {
                    return Err("stream is not active".to_owned());
                }
                let remaining = stream.amount - stream.withdrawn;
                let credited = self
                    .balances
                    .get(sender)
                    .copied()
                    .unwrap_or_default()
                    .checked_add(remaining)
                    .ok_or_else(|| "recipient balance overflow".to_owned())?;

                let stream = self.stream_mut(id)?;
                stream.withdrawn = stream.amount;
                stream.state = StreamState::Completed;
                self.balances.insert(sender.clone(), credited);
                Ok(())
            }
            functions::RAISE_DISPUTE => {
                let id = decode_u64_arg(args, 0, "stream_id").map_err(reason)?;
                let text: String = decode_arg(args, 1, "reason").map_err(reason)?;
                let stream = self.stream_mut(id)?;
                if &stream.sender != sender && &stream.recipient != sender {
                    return Err("not a party to the stream".to_owned());
                }
                if stream.state != StreamState::Active {
                    return Err("stream is not active".to_owned());
                }
                stream.state = StreamState::Disputed;

                let dispute_id = self.disputes.len() as u64 + 1;
                self.disputes.push(DisputeRecord {
                    id: dispute_id,
                    stream_id: id,
                    raised_by: sender.clone(),
                    reason: text,
                    open: true,
                });
                Ok(())
            }
            functions::SET_THRESHOLD => {
                let threshold = decode_u64_arg(args, 0, "threshold").map_err(reason)?;
                self.compliance.entry(sender.clone()).or_default().threshold = threshold;
                Ok(())
            }
            other => Err(format!("unknown entry function {other}")),
        }
    }

    fn view(&self, function: &str, arguments: &[Value]) -> Result<Value, RemoteError> {
        let owner: Address = decode_arg(arguments, 0, "owner")?;
        let involves = |stream: &StreamRecord| stream.sender == owner || stream.recipient == owner;
        match function {
            functions::BALANCE_OF => {
                let balance = self.balances.get(&owner).copied().unwrap_or_default();
                Ok(Value::String(balance.to_string()))
            }
            functions::STREAMS_OF => {
                let streams: Vec<&StreamRecord> = self.streams.iter().filter(|&s| involves(s)).collect();
                Ok(serde_json::to_value(streams)?)
            }
            functions::FLAGS_OF => {
                let flags = self.compliance.get(&owner).cloned().unwrap_or_default();
                Ok(serde_json::to_value(flags)?)
            }
            functions::DISPUTES_OF => {
                let disputes: Vec<&DisputeRecord> = self
                    .disputes
                    .iter()
                    .filter(|d| {
                        d.raised_by == owner
                            || self
                                .streams
                                .iter()
                                .any(|s| s.id == d.stream_id && involves(s))
                    })
                    .collect();
                Ok(serde_json::to_value(disputes)?)
            }
            other => Err(RemoteError::rejected(format!("unknown view function {other}"))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InMemoryLedger
// ─────────────────────────────────────────────────────────────────────────────

/// A ledger held in process memory.
///
/// Cloning yields another handle to the same ledger.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    latency: Duration,
    finality_delay: Duration,
}

impl core::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InMemoryLedger")
            .field("accounts", &state.balances.len())
            .field("streams", &state.streams.len())
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl InMemoryLedger {
    /// Creates an empty ledger with no latency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every view call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delays finality of every transaction by `delay`.
    #[must_use]
    pub fn with_finality_delay(mut self, delay: Duration) -> Self {
        self.finality_delay = delay;
        self
    }

    /// Credits `amount` to `account`, saturating at `u64::MAX`.
    pub fn fund(&self, account: &Address, amount: u64) {
        let mut state = self.state.lock();
        let balance = state.balances.entry(account.clone()).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Freezes or unfreezes `account`.
    pub fn set_frozen(&self, account: &Address, frozen: bool) {
        self.state
            .lock()
            .compliance
            .entry(account.clone())
            .or_default()
            .frozen = frozen;
    }

    /// Returns the balance of `account`.
    #[must_use]
    pub fn balance_of(&self, account: &Address) -> u64 {
        self.state
            .lock()
            .balances
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    /// Makes every call to the view `function` fail with `message` until
    /// [`clear_faults`](Self::clear_faults).
    pub fn fail_view(&self, function: &str, message: impl Into<String>) {
        self.state
            .lock()
            .view_faults
            .insert(function.to_owned(), message.into());
    }

    /// Rejects the next submitted transaction with `message`.
    pub fn reject_next_submit(&self, message: impl Into<String>) {
        self.state.lock().reject_next_submit = Some(message.into());
    }

    /// Removes all injected faults.
    pub fn clear_faults(&self) {
        let mut state = self.state.lock();
        state.view_faults.clear();
        state.reject_next_submit = None;
    }

    /// Returns a signer submitting as `sender`.
    #[must_use]
    pub fn signer_for(&self, sender: Address) -> Arc<dyn Signer> {
        Arc::new(LedgerSigner {
            ledger: self.clone(),
            sender,
        })
    }

    fn submit_as(&self, sender: &Address, payload: TransactionPayload) -> Result<TxHash, RemoteError> {
        let mut state = self.state.lock();
        if let Some(message) = state.reject_next_submit.take() {
            return Err(RemoteError::Rejected(message));
        }
        if !functions::ENTRY.contains(&payload.function.as_str()) {
            return Err(RemoteError::rejected(format!(
                "unknown entry function {}",
                payload.function
            )));
        }
        state.submitted += 1;
        let hash = TxHash::new(format!("0x{:064x}", state.submitted));
        tracing::debug!(%sender, function = %payload.function, %hash, "transaction accepted");
        state.pending.insert(hash.clone(), (sender.clone(), payload));
        Ok(hash)
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn view(&self, function: &str, arguments: Vec<Value>) -> Result<Value, RemoteError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let state = self.state.lock();
        if let Some(message) = state.view_faults.get(function) {
            return Err(RemoteError::Http(message.clone()));
        }
        state.view(function, &arguments)
    }
}

#[async_trait]
impl FinalityWatcher for InMemoryLedger {
    async fn await_finality(&self, hash: &TxHash) -> Result<(), RemoteError> {
        if !self.finality_delay.is_zero() {
            tokio::time::sleep(self.finality_delay).await;
        }
        let mut state = self.state.lock();
        let (sender, payload) = state
            .pending
            .remove(hash)
            .ok_or_else(|| RemoteError::rejected(format!("unknown transaction {hash}")))?;
        state.execute(&sender, &payload).map_err(|reason| {
            tracing::debug!(%hash, %reason, "transaction reverted");
            RemoteError::Reverted(reason)
        })
    }
}

/// Signs entry calls for one account of an [`InMemoryLedger`].
pub struct LedgerSigner {
    ledger: InMemoryLedger,
    sender: Address,
}

#[async_trait]
impl Signer for LedgerSigner {
    async fn submit(&self, payload: TransactionPayload) -> Result<PendingTransaction, RemoteError> {
        self.ledger
            .submit_as(&self.sender, payload)
            .map(PendingTransaction::new)
    }
}
