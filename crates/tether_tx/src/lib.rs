//! Submit-then-confirm transaction operations (Layer 2, writes).
//!
//! `tether_tx` turns a state-changing call into a single awaitable operation
//! with consistent failure semantics:
//!
//! - [`payload`] - [`PayloadBuilder`], typed arguments to wire payload
//! - [`finality`] - [`FinalityWatcher`], waiting for a hash to become final
//! - [`op`] - [`TransactionOp`] and the [`TxPhase`] state machine
//! - [`executor`] - [`TransactionExecutor`], the per-operation accessor
//!
//! # Failure semantics
//!
//! | Phase | Failure | Surfaced as |
//! |-------|---------|-------------|
//! | precondition | no wallet or no signer | `NotConnected`, "Wallet not connected" |
//! | building | invalid arguments | `Build` |
//! | submitting | signer or network rejection | `SubmitRejected` |
//! | confirming | revert, drop, timeout | `FinalityFailure` |
//!
//! Structured remote failures keep their message verbatim; opaque ones are
//! replaced by the operation's generic message.

pub mod executor;
pub mod finality;
pub mod op;
pub mod payload;

pub use executor::{OperationOptions, TransactionExecutor};
pub use finality::FinalityWatcher;
pub use op::{TransactionOp, TxPhase};
pub use payload::{BuildError, FnBuilder, PayloadBuilder, builder_fn};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::executor::{OperationOptions, TransactionExecutor};
    pub use crate::finality::FinalityWatcher;
    pub use crate::op::{TransactionOp, TxPhase};
    pub use crate::payload::{BuildError, FnBuilder, PayloadBuilder, builder_fn};
}
