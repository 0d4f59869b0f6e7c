//! Stream, compliance and dispute state built on Tether (Layer 3).
//!
//! This crate wires the generic machinery from [`tether_resource`] and
//! [`tether_tx`] to one concrete ledger:
//!
//! - [`client`] - the [`LedgerClient`] read trait, function names and wire records
//! - [`ledger`] - [`InMemoryLedger`], a local ledger with signer, finality and fault injection
//! - [`views`] - balance, stream, compliance and dispute views
//! - [`operations`] - payload builders and [`LedgerOperations`]
//! - [`dashboard`] - [`AccountDashboard`], every account resource behind one aggregate
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tether_core::address::Address;
//! use tether_core::config::SyncConfig;
//! use tether_core::wallet::WalletSession;
//! use tether_ledger::prelude::*;
//! use tether_resource::Status;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let alice = Address::new("0xa11ce");
//! let ledger = InMemoryLedger::new();
//! ledger.fund(&alice, 1_000);
//!
//! let session = WalletSession::new();
//! let config = SyncConfig::default();
//! let dashboard = AccountDashboard::new(Arc::new(ledger.clone()), &session, None, &config);
//! assert_eq!(dashboard.status(), Status::Idle);
//!
//! session.connect(alice.clone(), ledger.signer_for(alice));
//! # tokio::task::yield_now().await;
//! dashboard.refetch().await;
//! assert_eq!(dashboard.balance.value(), Some(1_000));
//! # }
//! ```

pub mod client;
pub mod dashboard;
pub mod ledger;
pub mod operations;
pub mod views;

pub use client::{ComplianceRecord, DisputeRecord, LedgerClient, StreamRecord, StreamState, functions};
pub use dashboard::{AccountDashboard, DashboardSnapshot};
pub use ledger::InMemoryLedger;
pub use operations::{
    CreateStream, CreateStreamArgs, LedgerOperations, RaiseDispute, RaiseDisputeArgs,
    SetComplianceThreshold, WithdrawStream,
};
pub use views::{AccountBalance, ComplianceFlags, DisputeRecords, StreamStatus};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::client::{
        ComplianceRecord, DisputeRecord, LedgerClient, StreamRecord, StreamState,
    };
    pub use crate::dashboard::{AccountDashboard, DashboardSnapshot};
    pub use crate::ledger::InMemoryLedger;
    pub use crate::operations::*;
    pub use crate::views::*;
}
