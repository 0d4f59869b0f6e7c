//! Wire-level access to the ledger's view functions.
//!
//! Views and payloads name ledger functions by their fully qualified path and
//! pass arguments as JSON. Unsigned 64-bit quantities travel as decimal
//! strings so they survive JSON number precision limits.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tether_core::address::Address;
use tether_core::error::RemoteError;

/// Fully qualified ledger function names.
pub mod functions {
    /// View: balance of an account, as a decimal string.
    pub const BALANCE_OF: &str = "tether::stream::balance_of";
    /// View: streams an account sends or receives.
    pub const STREAMS_OF: &str = "tether::stream::streams_of";
    /// View: compliance flags of an account.
    pub const FLAGS_OF: &str = "tether::compliance::flags_of";
    /// View: disputes involving an account.
    pub const DISPUTES_OF: &str = "tether::dispute::disputes_of";

    /// Entry: open a payment stream.
    pub const CREATE_STREAM: &str = "tether::stream::create_stream";
    /// Entry: withdraw a stream's remaining amount to its recipient.
    pub const WITHDRAW: &str = "tether::stream::withdraw";
    /// Entry: raise a dispute against a stream.
    pub const RAISE_DISPUTE: &str = "tether::dispute::raise";
    /// Entry: set the sender's per-stream compliance threshold.
    pub const SET_THRESHOLD: &str = "tether::compliance::set_threshold";

    /// Every entry function the ledger accepts.
    pub const ENTRY: [&str; 4] = [CREATE_STREAM, WITHDRAW, RAISE_DISPUTE, SET_THRESHOLD];
}

/// Read access to ledger view functions.
#[async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    /// Calls a view function and returns its JSON result.
    async fn view(&self, function: &str, arguments: Vec<Value>) -> Result<Value, RemoteError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of a payment stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    /// Funds are locked and withdrawable by the recipient.
    Active,
    /// The recipient has withdrawn everything.
    Completed,
    /// A party has raised a dispute; withdrawals are blocked.
    Disputed,
}

/// One payment stream as returned by [`functions::STREAMS_OF`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    /// Stream id, starting at 1.
    pub id: u64,
    /// Funding account.
    pub sender: Address,
    /// Receiving account.
    pub recipient: Address,
    /// Total locked amount.
    #[serde(with = "u64_string")]
    pub amount: u64,
    /// Amount already withdrawn.
    #[serde(with = "u64_string")]
    pub withdrawn: u64,
    /// Stream duration in seconds.
    pub duration_secs: u64,
    /// Current state.
    pub state: StreamState,
}

/// Compliance flags of one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    /// Frozen accounts cannot open streams.
    pub frozen: bool,
    /// Largest stream the account may open; zero means unlimited.
    #[serde(with = "u64_string")]
    pub threshold: u64,
}

/// One dispute as returned by [`functions::DISPUTES_OF`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeRecord {
    /// Dispute id, starting at 1.
    pub id: u64,
    /// Disputed stream.
    pub stream_id: u64,
    /// Account that raised it.
    pub raised_by: Address,
    /// Free-form reason.
    pub reason: String,
    /// Whether the dispute is unresolved.
    pub open: bool,
}

/// Serde adapter for `u64` values encoded as decimal strings.
pub mod u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes `value` as a decimal string.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    /// Parses a decimal string.
    ///
    /// # Errors
    ///
    /// Fails if the string is not a valid `u64`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Decodes argument `index` of a call.
///
/// # Errors
///
/// Returns [`RemoteError::Rejected`] when the argument is missing and
/// [`RemoteError::Malformed`] when it does not decode as `T`.
pub fn decode_arg<T: DeserializeOwned>(
    arguments: &[Value],
    index: usize,
    name: &str,
) -> Result<T, RemoteError> {
    let value = arguments
        .get(index)
        .cloned()
        .ok_or_else(|| RemoteError::rejected(format!("missing argument `{name}`")))?;
    Ok(serde_json::from_value(value)?)
}

/// Decodes argument `index` as a `u64` carried as a decimal string.
///
/// # Errors
///
/// See [`decode_arg`].
pub fn decode_u64_arg(arguments: &[Value], index: usize, name: &str) -> Result<u64, RemoteError> {
    let raw: String = decode_arg(arguments, index, name)?;
    raw.parse()
        .map_err(|_| RemoteError::malformed(format!("`{name}` is not a u64: {raw}")))
}
