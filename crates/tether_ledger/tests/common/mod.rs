//! Shared fixture for ledger integration tests.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use core::time::Duration;
use std::sync::Arc;

use tether_core::address::Address;
use tether_core::config::SyncConfig;
use tether_core::wallet::WalletSession;
use tether_ledger::{AccountDashboard, InMemoryLedger, LedgerOperations};

pub fn alice() -> Address {
    Address::new("0xa11ce")
}

pub fn bob() -> Address {
    Address::new("0xb0b")
}

/// Lets spawned trackers and fetches run. Time is paused in these tests,
/// so this only advances the clock by a millisecond.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// One participant: a wallet session, its dashboard and its operations,
/// all against a shared ledger.
pub struct Participant {
    pub session: WalletSession,
    pub dashboard: AccountDashboard,
    pub ops: LedgerOperations,
}

impl Participant {
    /// Creates a disconnected participant. Must run inside a runtime.
    pub fn new(ledger: &InMemoryLedger) -> Self {
        Self::watching(ledger, None)
    }

    /// Creates a participant whose dashboard shows `explicit` when given.
    pub fn watching(ledger: &InMemoryLedger, explicit: Option<Address>) -> Self {
        let config = SyncConfig::default();
        let session = WalletSession::new();
        let dashboard = AccountDashboard::new(Arc::new(ledger.clone()), &session, explicit, &config);
        let ops = LedgerOperations::new(&session, Arc::new(ledger.clone()), &config);
        Self {
            session,
            dashboard,
            ops,
        }
    }

    /// Connects as `who` and waits for the dashboard's first fetches.
    pub async fn connect(&self, ledger: &InMemoryLedger, who: &Address) {
        self.session.connect(who.clone(), ledger.signer_for(who.clone()));
        settle().await;
    }
}
