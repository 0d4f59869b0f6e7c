//! Account dashboard demo against an in-memory ledger.
//!
//! Connects a wallet, polls the account's resources, opens a stream, and logs
//! dashboard snapshots as the ledger changes.
//!
//! # Usage
//!
//! ```bash
//! TETHER_LOG=tether_resource=debug,info TETHER_POLL_MS=500 dashboard
//! ```
//!
//! `TETHER_CONFIG` may name a JSON file with [`SyncConfig`] fields;
//! `TETHER_POLL_MS` overrides its poll interval.

use std::sync::Arc;
use std::time::Duration;

use tether_core::address::Address;
use tether_core::config::SyncConfig;
use tether_core::tracing_setup::{TracingFormat, TracingSetup};
use tether_core::wallet::WalletSession;
use tether_ledger::{AccountDashboard, CreateStreamArgs, InMemoryLedger, LedgerOperations};
use tether_resource::PollingScheduler;

fn load_config() -> Result<SyncConfig, String> {
    let mut config = match std::env::var("TETHER_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path).map_err(|e| format!("cannot read {path}: {e}"))?;
            SyncConfig::from_json(&raw).map_err(|e| format!("invalid config {path}: {e}"))?
        }
        Err(_) => SyncConfig::default(),
    };
    if let Ok(raw) = std::env::var("TETHER_POLL_MS") {
        let ms: u64 = raw
            .parse()
            .map_err(|_| format!("TETHER_POLL_MS is not a number: {raw}"))?;
        config = config.with_poll_interval(Duration::from_millis(ms));
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn log_snapshot(dashboard: &AccountDashboard, stage: &str) {
    match serde_json::to_string(&dashboard.snapshot()) {
        Ok(json) => tracing::info!(stage, snapshot = %json, "dashboard"),
        Err(e) => tracing::warn!(stage, error = %e, "snapshot not serializable"),
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let mut setup = TracingSetup::new().with_format(TracingFormat::Compact);
    if let Ok(filter) = std::env::var("TETHER_LOG") {
        setup = setup.with_env_filter(filter);
    }
    setup.init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration rejected");
            std::process::exit(1);
        }
    };

    let alice = Address::new("0xa11ce");
    let bob = Address::new("0xb0b");
    let ledger = InMemoryLedger::new()
        .with_latency(Duration::from_millis(50))
        .with_finality_delay(Duration::from_millis(200));
    ledger.fund(&alice, 10_000);

    let session = WalletSession::new();
    let dashboard = AccountDashboard::new(Arc::new(ledger.clone()), &session, None, &config);
    let operations = LedgerOperations::new(&session, Arc::new(ledger.clone()), &config);
    let _polls = dashboard.poll(&PollingScheduler::from_config(&config));
    log_snapshot(&dashboard, "disconnected");

    session.connect(alice.clone(), ledger.signer_for(alice));
    // Identity trackers run on their own tasks.
    tokio::time::sleep(Duration::from_millis(10)).await;
    dashboard.refetch().await;
    log_snapshot(&dashboard, "connected");

    let args = CreateStreamArgs {
        recipient: bob,
        amount: 2_500,
        duration: Duration::from_secs(3_600),
    };
    match operations
        .create_stream
        .invoke_then_refetch(args, &dashboard.members())
        .await
    {
        Some(hash) => tracing::info!(%hash, "stream created"),
        None => {
            let reason = operations.create_stream.error().map(|e| e.message);
            tracing::warn!(?reason, "stream not created");
        }
    }
    log_snapshot(&dashboard, "after create_stream");

    tokio::time::sleep(config.poll_interval() * 2).await;
    log_snapshot(&dashboard, "after polling");

    session.disconnect();
    tokio::time::sleep(Duration::from_millis(10)).await;
    log_snapshot(&dashboard, "disconnected again");
}
