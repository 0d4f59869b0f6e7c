//! The account dashboard: every account-scoped resource behind one aggregate.

use std::sync::Arc;

use serde::Serialize;
use tether_core::address::Address;
use tether_core::config::SyncConfig;
use tether_core::error::ErrorInfo;
use tether_core::wallet::WalletSession;
use tether_resource::{
    Aggregate, IdentityTracker, PollGuard, PollingScheduler, Refreshable, ResourceUnit, Status,
    track_identity,
};

use crate::client::{ComplianceRecord, DisputeRecord, LedgerClient, StreamRecord};
use crate::views::{AccountBalance, ComplianceFlags, DisputeRecords, StreamStatus};

/// Balance, streams, compliance flags and disputes of one account.
///
/// The account is `explicit` when given, else the connected wallet's; the
/// resources follow wallet connects, account switches and disconnects.
/// Member values stay typed on their units; the aggregate only combines
/// status, error and refetch.
pub struct AccountDashboard {
    /// Spendable balance. Reads as zero after a failed fetch.
    pub balance: ResourceUnit<AccountBalance>,
    /// Streams the account sends or receives.
    pub streams: ResourceUnit<StreamStatus>,
    /// Compliance flags.
    pub compliance: ResourceUnit<ComplianceFlags>,
    /// Disputes involving the account.
    pub disputes: ResourceUnit<DisputeRecords>,
    aggregate: Aggregate,
    _trackers: Vec<IdentityTracker>,
}

impl core::fmt::Debug for AccountDashboard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountDashboard")
            .field("owner", &self.owner())
            .field("aggregate", &self.aggregate)
            .finish()
    }
}

/// Serializable snapshot of an [`AccountDashboard`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Account shown, if one is resolved.
    pub owner: Option<Address>,
    /// Combined status, lowercase.
    pub status: String,
    /// First member error in declared order.
    pub error: Option<String>,
    /// Spendable balance.
    pub balance: Option<u64>,
    /// Streams.
    pub streams: Option<Vec<StreamRecord>>,
    /// Compliance flags.
    pub compliance: Option<ComplianceRecord>,
    /// Disputes.
    pub disputes: Option<Vec<DisputeRecord>>,
}

impl AccountDashboard {
    /// Observes all four resources for the resolved account.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(
        client: Arc<dyn LedgerClient>,
        session: &WalletSession,
        explicit: Option<Address>,
        config: &SyncConfig,
    ) -> Self {
        let balance = ResourceUnit::observe(
            AccountBalance::new(Arc::clone(&client)),
            None,
            AccountBalance::options(config),
        );
        let streams = ResourceUnit::observe(
            StreamStatus::new(Arc::clone(&client)),
            None,
            StreamStatus::options(config),
        );
        let compliance = ResourceUnit::observe(
            ComplianceFlags::new(Arc::clone(&client)),
            None,
            ComplianceFlags::options(config),
        );
        let disputes = ResourceUnit::observe(
            DisputeRecords::new(client),
            None,
            DisputeRecords::options(config),
        );

        let trackers = vec![
            track_identity(&balance, session, explicit.clone(), |owner| owner),
            track_identity(&streams, session, explicit.clone(), |owner| owner),
            track_identity(&compliance, session, explicit.clone(), |owner| owner),
            track_identity(&disputes, session, explicit, |owner| owner),
        ];

        let aggregate = Aggregate::new()
            .with("balance", &balance)
            .with("streams", &streams)
            .with("compliance", &compliance)
            .with("disputes", &disputes);

        Self {
            balance,
            streams,
            compliance,
            disputes,
            aggregate,
            _trackers: trackers,
        }
    }

    /// Returns the account currently shown.
    #[must_use]
    pub fn owner(&self) -> Option<Address> {
        self.balance.params()
    }

    /// Returns the combined status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.aggregate.status()
    }

    /// Returns `true` while any member is loading.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.aggregate.loading()
    }

    /// Returns the first member error in declared order.
    #[must_use]
    pub fn error(&self) -> Option<ErrorInfo> {
        self.aggregate.error()
    }

    /// Returns the underlying aggregate.
    #[must_use]
    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    /// Refetches every member and waits for all of them to settle.
    pub async fn refetch(&self) {
        self.aggregate.refetch().await;
    }

    /// Polls every member on its own timer, re-armed when the account changes.
    #[must_use]
    pub fn poll(&self, scheduler: &PollingScheduler) -> Vec<PollGuard> {
        vec![
            scheduler.schedule(&self.balance),
            scheduler.schedule(&self.streams),
            scheduler.schedule(&self.compliance),
            scheduler.schedule(&self.disputes),
        ]
    }

    /// Returns every member as a refreshable, for refetching after a write.
    #[must_use]
    pub fn members(&self) -> [&dyn Refreshable; 4] {
        [&self.balance, &self.streams, &self.compliance, &self.disputes]
    }

    /// Captures the current values, status and error.
    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot {
        let status = match self.status() {
            Status::Idle => "idle",
            Status::Loading => "loading",
            Status::Ready => "ready",
            Status::Failed => "failed",
        };
        DashboardSnapshot {
            owner: self.owner(),
            status: status.to_owned(),
            error: self.error().map(|e| e.message),
            balance: self.balance.value(),
            streams: self.streams.value(),
            compliance: self.compliance.value(),
            disputes: self.disputes.value(),
        }
    }
}
