//! Reactive resource synchronization for clients of a remote ledger.
//!
//! - [`tether_core`] - addresses, wallet identity, errors, configuration, tracing
//! - [`tether_resource`] - live, poll-refreshed views of remote state
//! - [`tether_tx`] - submit-then-confirm transaction operations
//! - `tether_ledger` (feature `ledger`) - stream, compliance and dispute state
//!   over an in-memory ledger
//!

pub use tether_core;
pub use tether_resource;
pub use tether_tx;

#[cfg(feature = "ledger")]
pub use tether_ledger;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tether_core::prelude::*;
    #[cfg(feature = "ledger")]
    pub use tether_ledger::prelude::*;
    pub use tether_resource::prelude::*;
    pub use tether_tx::prelude::*;
}
