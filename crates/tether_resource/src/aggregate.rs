//! Composition of several resources into one derived view.
//!
//! An [`Aggregate`] does not own or merge member values. Consumers keep
//! their typed [`ResourceUnit`] handles for values and ask the aggregate for
//! the combined status, the first error, and a single refetch that refreshes
//! every member concurrently.
//!
//! # Status precedence
//!
//! | Members | Combined |
//! |---------|----------|
//! | any `Loading` | `Loading` |
//! | otherwise any `Failed` | `Failed` |
//! | otherwise at least one `Ready` | `Ready` |
//! | all `Idle` (or no members) | `Idle` |
//!
//! # Example
//!
//! ```
//! use tether_core::error::RemoteError;
//! use tether_resource::{Aggregate, ResourceOptions, ResourceUnit, Status, view_fn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let balance = ResourceUnit::observe(
//!     view_fn("balance", |_: ()| async { Ok::<_, RemoteError>(100_u64) }),
//!     Some(()),
//!     ResourceOptions::default(),
//! );
//! let frozen = ResourceUnit::observe(
//!     view_fn("frozen", |_: ()| async { Ok::<_, RemoteError>(false) }),
//!     Some(()),
//!     ResourceOptions::default(),
//! );
//!
//! let account = Aggregate::new()
//!     .with("balance", &balance)
//!     .with("frozen", &frozen);
//!
//! account.refetch().await;
//! assert_eq!(account.status(), Status::Ready);
//! assert_eq!(balance.value(), Some(100));
//! # }
//! ```

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tether_core::error::ErrorInfo;
use tokio::sync::watch;

use crate::state::Status;
use crate::unit::ResourceUnit;
use crate::view::View;

// ─────────────────────────────────────────────────────────────────────────────
// Refreshable
// ─────────────────────────────────────────────────────────────────────────────

/// Type-erased view of a resource, as seen by aggregates and poll timers.
pub trait Refreshable: Send + Sync + 'static {
    /// Label used in logs.
    fn label(&self) -> &str;

    /// Current status.
    fn status(&self) -> Status;

    /// Error of the latest applied fetch.
    fn error(&self) -> Option<ErrorInfo>;

    /// Refetches; the future resolves once the outcome is applied.
    fn refresh(&self) -> BoxFuture<'static, ()>;

    /// Receiver notified on every params change.
    fn params_epoch(&self) -> watch::Receiver<u64>;
}

impl<V: View> Refreshable for ResourceUnit<V> {
    fn label(&self) -> &str {
        ResourceUnit::label(self)
    }

    fn status(&self) -> Status {
        ResourceUnit::status(self)
    }

    fn error(&self) -> Option<ErrorInfo> {
        ResourceUnit::error(self)
    }

    fn refresh(&self) -> BoxFuture<'static, ()> {
        let unit = self.clone();
        async move { unit.refetch().await }.boxed()
    }

    fn params_epoch(&self) -> watch::Receiver<u64> {
        ResourceUnit::params_epoch(self)
    }
}

/// Combines member statuses using the precedence in the module docs.
#[must_use]
pub fn combine_status(statuses: impl IntoIterator<Item = Status>) -> Status {
    let mut combined = Status::Idle;
    for status in statuses {
        combined = match (combined, status) {
            (_, Status::Loading) => return Status::Loading,
            (Status::Failed, _) | (_, Status::Failed) => Status::Failed,
            (Status::Ready, _) | (_, Status::Ready) => Status::Ready,
            _ => combined,
        };
    }
    combined
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate
// ─────────────────────────────────────────────────────────────────────────────

struct Member {
    name: String,
    resource: Arc<dyn Refreshable>,
}

/// Snapshot of an aggregate's combined state.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateView {
    /// Combined status.
    pub status: Status,
    /// First member error in declared order.
    pub error: Option<ErrorInfo>,
    /// Member names and statuses, in declared order.
    pub members: Vec<(String, Status)>,
}

impl AggregateView {
    /// Returns `true` if any member is loading.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.status == Status::Loading
    }
}

/// An ordered, named bundle of resources.
///
/// Declaration order matters: it decides which error surfaces when several
/// members fail, so the same fault always shows up the same way.
#[derive(Clone, Default)]
pub struct Aggregate {
    members: Vec<Arc<Member>>,
}

impl core::fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Aggregate")
            .field("members", &self.names())
            .finish()
    }
}

impl Aggregate {
    /// Creates an empty aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member.
    ///
    /// # Panics
    ///
    /// Panics if a member with the same name was already added.
    #[must_use]
    pub fn with<R>(mut self, name: impl Into<String>, resource: &R) -> Self
    where
        R: Refreshable + Clone,
    {
        let name = name.into();
        assert!(
            !self.members.iter().any(|m| m.name == name),
            "aggregate member '{name}' is already registered"
        );
        self.members.push(Arc::new(Member {
            name,
            resource: Arc::new(resource.clone()),
        }));
        self
    }

    /// Returns member names in declared order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the aggregate has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the combined status.
    #[must_use]
    pub fn status(&self) -> Status {
        combine_status(self.members.iter().map(|m| m.resource.status()))
    }

    /// Returns `true` if any member is loading.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.status() == Status::Loading
    }

    /// Returns the first member error in declared order.
    #[must_use]
    pub fn error(&self) -> Option<ErrorInfo> {
        self.members.iter().find_map(|m| m.resource.error())
    }

    /// Returns the status of the named member.
    #[must_use]
    pub fn member_status(&self, name: &str) -> Option<Status> {
        self.members
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.resource.status())
    }

    /// Returns a snapshot of the combined state.
    #[must_use]
    pub fn view(&self) -> AggregateView {
        let members: Vec<(String, Status)> = self
            .members
            .iter()
            .map(|m| (m.name.clone(), m.resource.status()))
            .collect();
        AggregateView {
            status: combine_status(members.iter().map(|(_, status)| *status)),
            error: self.error(),
            members,
        }
    }

    /// Refetches every member concurrently and waits until all have settled.
    ///
    /// A failing member does not short-circuit its siblings; its error is
    /// recorded on the member like any other fetch failure.
    pub async fn refetch(&self) {
        tracing::debug!(members = self.members.len(), "aggregate refetch");
        join_all(self.members.iter().map(|m| m.resource.refresh())).await;
    }
}

impl Refreshable for Aggregate {
    fn label(&self) -> &str {
        "aggregate"
    }

    fn status(&self) -> Status {
        Aggregate::status(self)
    }

    fn error(&self) -> Option<ErrorInfo> {
        Aggregate::error(self)
    }

    fn refresh(&self) -> BoxFuture<'static, ()> {
        let aggregate = self.clone();
        async move { aggregate.refetch().await }.boxed()
    }

    fn params_epoch(&self) -> watch::Receiver<u64> {
        // Aggregates have no params of their own; the sender is dropped so
        // the receiver never reports a change.
        let (_, rx) = watch::channel(0);
        rx
    }
}
