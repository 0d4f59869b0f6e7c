//! Shared foundations for Tether (Layer 1).
//!
//! `tether_core` holds the pieces every other Tether crate leans on:
//!
//! - [`address`] - ledger addresses and the [`AddressResolver`]
//! - [`wallet`] - the connected identity, signer capability and transaction wire types
//! - [`error`] - remote failures and the cloneable [`ErrorInfo`] surfaced to consumers
//! - [`config`] - [`SyncConfig`] and the [`ResolutionPolicy`] for overlapping fetches
//! - [`tracing_setup`] - subscriber initialization via [`TracingSetup`]
//!
//! # Architecture
//!
//! - **Layer 1** (`tether_core`): identity, errors, configuration (this crate)
//! - **Layer 2** (`tether_resource`, `tether_tx`): reads and writes
//! - **Layer 3** (`tether_ledger`): concrete ledger views and operations
//!
//! # Example
//!
//! ```
//! use tether_core::address::{Address, AddressResolver};
//! use tether_core::wallet::WalletSession;
//!
//! let session = WalletSession::new();
//! assert!(AddressResolver::resolve_for(None, &session.identity()).is_none());
//!
//! session.switch_account(Address::new("0xa11ce"));
//! let subject = AddressResolver::resolve_for(None, &session.identity());
//! assert_eq!(subject, Some(Address::new("0xa11ce")));
//! ```

pub mod address;
pub mod config;
pub mod error;
pub mod tracing_setup;
pub mod wallet;

pub use address::{Address, AddressResolver};
pub use config::{ConfigError, ResolutionPolicy, SyncConfig};
pub use error::{ErrorInfo, ErrorKind, RemoteError};
pub use tracing_setup::{TracingFormat, TracingSetup};
pub use wallet::{Identity, PendingTransaction, Signer, TransactionPayload, TxHash, WalletSession};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::address::*;
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::tracing_setup::*;
    pub use crate::wallet::*;
}
