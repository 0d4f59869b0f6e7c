//! Wallet identity and signing capability.
//!
//! The wallet collaborator owns the connected identity. It mutates a
//! [`WalletSession`]; everything else in Tether only reads [`Identity`]
//! snapshots from it or subscribes to changes.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tether_core::wallet::{PendingTransaction, Signer, TransactionPayload, TxHash, WalletSession};
//! use tether_core::error::RemoteError;
//! use tether_core::address::Address;
//!
//! struct BrowserWallet;
//!
//! #[async_trait]
//! impl Signer for BrowserWallet {
//!     async fn submit(&self, _payload: TransactionPayload) -> Result<PendingTransaction, RemoteError> {
//!         Ok(PendingTransaction::new(TxHash::new("0xfeed")))
//!     }
//! }
//!
//! let session = WalletSession::new();
//! session.connect(Address::new("0xa11ce"), Arc::new(BrowserWallet));
//! assert!(session.identity().is_connected());
//! ```

use core::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::address::Address;
use crate::error::RemoteError;

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

/// Hash identifying a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    /// Creates a transaction hash.
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Returns the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A structured description of a state-changing ledger call, built client-side.
///
/// Payloads name an entry function and carry its type and value arguments
/// already encoded as JSON, the way the signer forwards them to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// Fully qualified entry function, e.g. `0x1::stream::create`.
    pub function: String,
    /// Generic type arguments.
    #[serde(default)]
    pub type_arguments: Vec<String>,
    /// Encoded call arguments in declaration order.
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
}

impl TransactionPayload {
    /// Creates a payload for the given entry function with no arguments.
    #[must_use]
    pub fn entry(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            type_arguments: Vec::new(),
            arguments: Vec::new(),
        }
    }

    /// Appends a type argument.
    #[must_use]
    pub fn with_type_argument(mut self, type_argument: impl Into<String>) -> Self {
        self.type_arguments.push(type_argument.into());
        self
    }

    /// Appends an encoded argument.
    #[must_use]
    pub fn with_argument(mut self, argument: impl Into<serde_json::Value>) -> Self {
        self.arguments.push(argument.into());
        self
    }
}

/// Handle returned by a signer once a transaction has been dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Hash of the dispatched transaction.
    pub hash: TxHash,
}

impl PendingTransaction {
    /// Wraps a transaction hash.
    #[must_use]
    pub fn new(hash: TxHash) -> Self {
        Self { hash }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Signer
// ─────────────────────────────────────────────────────────────────────────────

/// Capability to sign and dispatch a transaction.
///
/// Implemented by the wallet collaborator. Rejections (the user declining to
/// sign, network failure) are reported as [`RemoteError`].
#[async_trait]
pub trait Signer: Send + Sync + 'static {
    /// Signs and dispatches `payload`, returning the pending transaction.
    async fn submit(&self, payload: TransactionPayload) -> Result<PendingTransaction, RemoteError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of the connected wallet.
#[derive(Clone, Default)]
pub struct Identity {
    address: Option<Address>,
    signer: Option<Arc<dyn Signer>>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .field("signer", &self.signer.as_ref().map(|_| "<signer>"))
            .finish()
    }
}

impl Identity {
    /// An identity with neither address nor signer.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns the authenticated address, if any.
    #[must_use]
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Returns the signing capability, if any.
    #[must_use]
    pub fn signer(&self) -> Option<&Arc<dyn Signer>> {
        self.signer.as_ref()
    }

    /// Returns `true` when both an address and a signer are present.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.address.as_ref().is_some_and(|a| !a.is_empty()) && self.signer.is_some()
    }
}

/// Process-wide holder of the connected [`Identity`].
///
/// Cloning a session yields another handle to the same identity. Changes are
/// broadcast to [`subscribe`](Self::subscribe)rs. Switching to the current
/// account, or disconnecting twice, publishes nothing.
#[derive(Clone)]
pub struct WalletSession {
    identity: Arc<watch::Sender<Identity>>,
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSession")
            .field("identity", &*self.identity.borrow())
            .finish()
    }
}

impl WalletSession {
    /// Creates a session with no connected wallet.
    #[must_use]
    pub fn new() -> Self {
        let (identity, _) = watch::channel(Identity::anonymous());
        Self {
            identity: Arc::new(identity),
        }
    }

    /// Connects a wallet with its address and signer.
    pub fn connect(&self, address: Address, signer: Arc<dyn Signer>) {
        tracing::info!(%address, "wallet connected");
        self.identity.send_replace(Identity {
            address: Some(address),
            signer: Some(signer),
        });
    }

    /// Switches the active account, keeping the current signer.
    pub fn switch_account(&self, address: Address) {
        self.identity.send_if_modified(|identity| {
            if identity.address.as_ref() == Some(&address) {
                return false;
            }
            tracing::info!(%address, "wallet account switched");
            identity.address = Some(address);
            true
        });
    }

    /// Disconnects the wallet.
    pub fn disconnect(&self) {
        self.identity.send_if_modified(|identity| {
            if identity.address.is_none() && identity.signer.is_none() {
                return false;
            }
            tracing::info!("wallet disconnected");
            *identity = Identity::anonymous();
            true
        });
    }

    /// Returns a snapshot of the current identity.
    #[must_use]
    pub fn identity(&self) -> Identity {
        self.identity.borrow().clone()
    }

    /// Returns the current address, if any.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        self.identity.borrow().address.clone()
    }

    /// Subscribes to identity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Identity> {
        self.identity.subscribe()
    }
}
