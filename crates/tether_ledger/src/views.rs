//! Account-scoped ledger views.
//!
//! Each view encodes its owner argument, calls one ledger view function, and
//! decodes the JSON result. Decoding failures surface as
//! [`RemoteError::Malformed`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tether_core::address::Address;
use tether_core::config::SyncConfig;
use tether_core::error::RemoteError;
use tether_resource::{ResourceOptions, View};

use crate::client::{ComplianceRecord, DisputeRecord, LedgerClient, StreamRecord, functions};

async fn call(client: &dyn LedgerClient, function: &str, owner: &Address) -> Result<Value, RemoteError> {
    client
        .view(function, vec![Value::String(owner.to_string())])
        .await
}

/// Spendable balance of an account.
#[derive(Clone)]
pub struct AccountBalance {
    client: Arc<dyn LedgerClient>,
}

impl AccountBalance {
    /// Creates the view.
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self { client }
    }

    /// Resource options for balances: shown as zero when the read fails.
    #[must_use]
    pub fn options(config: &SyncConfig) -> ResourceOptions<u64> {
        ResourceOptions::from_config(config)
            .with_label("balance")
            .with_error_message("Failed to fetch balance")
            .reset_on_error(0)
    }
}

#[async_trait]
impl View for AccountBalance {
    type Params = Address;
    type Output = u64;

    fn name(&self) -> &str {
        "balance"
    }

    async fn fetch(&self, owner: Address) -> Result<u64, RemoteError> {
        let value = call(&*self.client, functions::BALANCE_OF, &owner).await?;
        let raw: String = serde_json::from_value(value)?;
        raw.parse()
            .map_err(|_| RemoteError::malformed(format!("balance is not a u64: {raw}")))
    }
}

/// Streams an account sends or receives.
#[derive(Clone)]
pub struct StreamStatus {
    client: Arc<dyn LedgerClient>,
}

impl StreamStatus {
    /// Creates the view.
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self { client }
    }

    /// Resource options for stream listings.
    #[must_use]
    pub fn options(config: &SyncConfig) -> ResourceOptions<Vec<StreamRecord>> {
        ResourceOptions::from_config(config)
            .with_label("streams")
            .with_error_message("Failed to fetch streams")
    }
}

#[async_trait]
impl View for StreamStatus {
    type Params = Address;
    type Output = Vec<StreamRecord>;

    fn name(&self) -> &str {
        "streams"
    }

    async fn fetch(&self, owner: Address) -> Result<Vec<StreamRecord>, RemoteError> {
        let value = call(&*self.client, functions::STREAMS_OF, &owner).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Compliance flags of an account.
#[derive(Clone)]
pub struct ComplianceFlags {
    client: Arc<dyn LedgerClient>,
}

impl ComplianceFlags {
    /// Creates the view.
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self { client }
    }

    /// Resource options for compliance flags.
    #[must_use]
    pub fn options(config: &SyncConfig) -> ResourceOptions<ComplianceRecord> {
        ResourceOptions::from_config(config)
            .with_label("compliance")
            .with_error_message("Failed to fetch compliance flags")
    }
}

#[async_trait]
impl View for ComplianceFlags {
    type Params = Address;
    type Output = ComplianceRecord;

    fn name(&self) -> &str {
        "compliance"
    }

    async fn fetch(&self, owner: Address) -> Result<ComplianceRecord, RemoteError> {
        let value = call(&*self.client, functions::FLAGS_OF, &owner).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Disputes involving an account.
#[derive(Clone)]
pub struct DisputeRecords {
    client: Arc<dyn LedgerClient>,
}

impl DisputeRecords {
    /// Creates the view.
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self { client }
    }

    /// Resource options for dispute listings.
    #[must_use]
    pub fn options(config: &SyncConfig) -> ResourceOptions<Vec<DisputeRecord>> {
        ResourceOptions::from_config(config)
            .with_label("disputes")
            .with_error_message("Failed to fetch disputes")
    }
}

#[async_trait]
impl View for DisputeRecords {
    type Params = Address;
    type Output = Vec<DisputeRecord>;

    fn name(&self) -> &str {
        "disputes"
    }

    async fn fetch(&self, owner: Address) -> Result<Vec<DisputeRecord>, RemoteError> {
        let value = call(&*self.client, functions::DISPUTES_OF, &owner).await?;
        Ok(serde_json::from_value(value)?)
    }
}
