//! Deriving resource params from the connected wallet.
//!
//! Resources scoped to "the current account" must follow the wallet: a
//! connect makes them ready, an account switch changes their params, a
//! disconnect makes them not ready again. [`track_identity`] wires a unit to
//! a [`WalletSession`] through the [`AddressResolver`] rule.

use tether_core::address::{Address, AddressResolver};
use tether_core::wallet::WalletSession;
use tokio::task::JoinHandle;

use crate::unit::ResourceUnit;
use crate::view::View;

/// Keeps a unit's params in sync with the wallet. Dropping it stops tracking.
#[derive(Debug)]
pub struct IdentityTracker {
    task: JoinHandle<()>,
}

impl IdentityTracker {
    /// Stops tracking.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for IdentityTracker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Derives `unit`'s params from `explicit` or the session's address.
///
/// The params are set immediately from the current identity, then again on
/// every identity change. `derive` maps the resolved address to params; an
/// unresolved address sets the params to `None`.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
///
/// # Example
///
/// ```
/// use tether_core::address::Address;
/// use tether_core::error::RemoteError;
/// use tether_core::wallet::WalletSession;
/// use tether_resource::{ResourceOptions, ResourceUnit, Status, track_identity, view_fn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let session = WalletSession::new();
/// let unit = ResourceUnit::observe(
///     view_fn("owner", |owner: Address| async move { Ok::<_, RemoteError>(owner.to_string()) }),
///     None,
///     ResourceOptions::default(),
/// );
///
/// let _tracker = track_identity(&unit, &session, None, |address| address);
/// assert_eq!(unit.status(), Status::Idle);
///
/// session.switch_account(Address::new("0xa11ce"));
/// # tokio::task::yield_now().await;
/// # }
/// ```
pub fn track_identity<V, F>(
    unit: &ResourceUnit<V>,
    session: &WalletSession,
    explicit: Option<Address>,
    derive: F,
) -> IdentityTracker
where
    V: View,
    F: Fn(Address) -> V::Params + Send + Sync + 'static,
{
    let mut identity = session.subscribe();
    let resolve = move |unit: &ResourceUnit<V>, fallback: Option<&Address>| {
        let params = AddressResolver::resolve(explicit.as_ref(), fallback).map(&derive);
        unit.set_params(params);
    };

    let initial = identity.borrow_and_update().clone();
    resolve(unit, initial.address());

    let unit = unit.clone();
    let task = tokio::spawn(async move {
        while identity.changed().await.is_ok() {
            let current = identity.borrow_and_update().clone();
            tracing::debug!(resource = %unit.label(), address = ?current.address(), "identity changed");
            resolve(&unit, current.address());
        }
    });

    IdentityTracker { task }
}
