//! Waiting for submitted transactions to become final.

use async_trait::async_trait;
use tether_core::error::RemoteError;
use tether_core::wallet::TxHash;

/// Capability to wait until a dispatched transaction is final.
///
/// Implementations poll or subscribe to the ledger; a reverted or dropped
/// transaction is reported as [`RemoteError`]. Tether imposes no timeout of
/// its own.
#[async_trait]
pub trait FinalityWatcher: Send + Sync + 'static {
    /// Resolves once `hash` is final and successful.
    async fn await_finality(&self, hash: &TxHash) -> Result<(), RemoteError>;
}
