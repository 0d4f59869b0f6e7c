//! Live, poll-refreshed views of remote ledger state (Layer 2, reads).
//!
//! `tether_resource` turns an arbitrary asynchronous read into a unit of
//! presentation state that knows whether it is loading, what went wrong last,
//! and how to refresh itself:
//!
//! - [`view`] - the [`View`] trait implemented by remote queries
//! - [`unit`] - [`ResourceUnit`], the reactive primitive
//! - [`poll`] - [`PollingScheduler`], fixed-interval refresh scoped to a guard
//! - [`aggregate`] - [`Aggregate`], combined status/error/refetch over members
//! - [`identity`] - [`track_identity`], params that follow the connected wallet
//!
//! # Data flow
//!
//! Reads flow one way: remote → [`ResourceUnit`] → [`Aggregate`] →
//! presentation. Nothing here invalidates resources after a write; callers
//! refetch the units a transaction affected.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tether_core::error::RemoteError;
//! use tether_resource::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let flags = ResourceUnit::observe(
//!     view_fn("flags", |_: ()| async { Ok::<_, RemoteError>(vec!["kyc"]) }),
//!     Some(()),
//!     ResourceOptions::default(),
//! );
//! let _poll = PollingScheduler::new(Duration::from_secs(30)).schedule(&flags);
//!
//! let state = flags.settled().await;
//! assert_eq!(state.value, Some(vec!["kyc"]));
//! # }
//! ```

pub mod aggregate;
pub mod identity;
pub mod poll;
pub mod state;
pub mod unit;
pub mod view;

pub use aggregate::{Aggregate, AggregateView, Refreshable, combine_status};
pub use identity::{IdentityTracker, track_identity};
pub use poll::{PollGuard, PollingScheduler};
pub use state::{ResourceState, Status};
pub use tether_core::config::ResolutionPolicy;
pub use unit::{ResourceOptions, ResourceUnit};
pub use view::{FnView, View, view_fn};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::aggregate::{Aggregate, AggregateView, Refreshable, combine_status};
    pub use crate::identity::{IdentityTracker, track_identity};
    pub use crate::poll::{PollGuard, PollingScheduler};
    pub use crate::state::{ResourceState, Status};
    pub use crate::unit::{ResourceOptions, ResourceUnit};
    pub use crate::view::{FnView, View, view_fn};
}
