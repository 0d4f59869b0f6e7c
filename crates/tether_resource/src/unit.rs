//! The [`ResourceUnit`] reactive primitive.
//!
//! A unit owns one piece of remote-derived state: the last good value, a
//! [`Status`], the last error, and the ability to refetch. Every concrete
//! resource in an application is a `ResourceUnit` over some [`View`].
//!
//! # Fetch lifecycle
//!
//! - `observe` and every by-value params change issue one fetch.
//! - A fetch flips the status to [`Status::Loading`] but keeps the previous
//!   value visible until the new one arrives.
//! - Fetches run on their own Tokio task and always run to completion; a
//!   caller that stops awaiting [`ResourceUnit::refetch`] does not cancel it.
//! - Each fetch is tagged with a generation. Under
//!   [`ResolutionPolicy::LastIssued`] a resolution that is not the latest
//!   issued one (or belongs to superseded params) is discarded.
//! - With single-flight enabled, a refetch requested while a fetch for the
//!   same params is outstanding attaches to it instead of calling the view
//!   again.

use core::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tether_core::config::{ResolutionPolicy, SyncConfig};
use tether_core::error::{ErrorInfo, ErrorKind, RemoteError};
use tokio::sync::watch;

use crate::state::{ResourceState, Status};
use crate::view::View;

// ─────────────────────────────────────────────────────────────────────────────
// ResourceOptions
// ─────────────────────────────────────────────────────────────────────────────

/// Per-resource settings.
///
/// Defaults come from [`SyncConfig::default`]; use
/// [`from_config`](Self::from_config) to start from an application config.
#[derive(Debug, Clone)]
pub struct ResourceOptions<R> {
    policy: ResolutionPolicy,
    single_flight: bool,
    error_message: String,
    reset_on_error: Option<R>,
    label: Option<String>,
}

impl<R> Default for ResourceOptions<R> {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl<R> ResourceOptions<R> {
    /// Creates options from the given config.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            policy: config.resolution_policy,
            single_flight: config.single_flight,
            error_message: config.query_error_message.clone(),
            reset_on_error: None,
            label: None,
        }
    }

    /// Sets the resolution policy for overlapping fetches.
    #[must_use]
    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enables or disables single-flight refetching.
    #[must_use]
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Sets the message shown when the view fails without a displayable one.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    /// Declares a neutral value the resource resets to when a fetch fails.
    ///
    /// Intended for display-only quantities such as a zero balance. Without
    /// it, a failed fetch leaves the last good value in place.
    #[must_use]
    pub fn reset_on_error(mut self, neutral: R) -> Self {
        self.reset_on_error = Some(neutral);
        self
    }

    /// Sets the label used in logs and aggregate member listings.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the resolution policy.
    #[must_use]
    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Returns whether single-flight is enabled.
    #[must_use]
    pub fn single_flight(&self) -> bool {
        self.single_flight
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internals
// ─────────────────────────────────────────────────────────────────────────────

type FetchDone = Shared<BoxFuture<'static, ()>>;

#[derive(Debug, thiserror::Error)]
#[error("view panicked while fetching")]
struct ViewPanicked;

/// Bookkeeping for the fetch currently eligible for single-flight joins.
struct InFlight {
    generation: u64,
    epoch: u64,
    done: FetchDone,
}

struct Core<P> {
    params: Option<P>,
    /// Bumped on every by-value params change.
    epoch: u64,
    /// Generation of the most recently issued fetch.
    issued: u64,
    in_flight: Option<InFlight>,
}

struct UnitInner<V: View> {
    id: String,
    label: String,
    view: V,
    options: ResourceOptions<V::Output>,
    core: Mutex<Core<V::Params>>,
    state: watch::Sender<ResourceState<V::Output>>,
    epoch: watch::Sender<u64>,
}

impl<V: View> UnitInner<V> {
    /// Applies the outcome of fetch `generation`, issued under `epoch`.
    fn settle(&self, generation: u64, epoch: u64, result: Result<V::Output, RemoteError>) {
        let mut guard = self.core.lock();
        let core = &mut *guard;
        if core
            .in_flight
            .as_ref()
            .is_some_and(|f| f.generation == generation)
        {
            core.in_flight = None;
        }

        if core.params.is_none() {
            tracing::debug!(resource = %self.label, generation, "discarding response for cleared params");
            return;
        }

        let current = generation == core.issued && epoch == core.epoch;
        if !current && self.options.policy == ResolutionPolicy::LastIssued {
            tracing::debug!(
                resource = %self.label,
                generation,
                latest = core.issued,
                "discarding stale response"
            );
            return;
        }

        match result {
            Ok(value) => {
                tracing::debug!(resource = %self.label, generation, "fetch resolved");
                self.state.send_modify(|state| {
                    state.value = Some(value);
                    state.status = Status::Ready;
                    state.error = None;
                });
            }
            Err(err) => {
                let info = ErrorInfo::from_remote(
                    ErrorKind::RemoteQuery,
                    &err,
                    &self.options.error_message,
                );
                tracing::warn!(
                    resource = %self.label,
                    generation,
                    error = %err,
                    "fetch failed"
                );
                self.state.send_modify(|state| {
                    if let Some(neutral) = &self.options.reset_on_error {
                        state.value = Some(neutral.clone());
                    }
                    state.status = Status::Failed;
                    state.error = Some(info);
                });
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceUnit
// ─────────────────────────────────────────────────────────────────────────────

/// One reactively observed unit of remote-derived state.
///
/// Cloning a unit yields another handle to the same state.
///
/// # Example
///
/// ```
/// use tether_core::error::RemoteError;
/// use tether_resource::{ResourceOptions, ResourceUnit, Status, view_fn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let view = view_fn("square", |n: u64| async move { Ok::<_, RemoteError>(n * n) });
/// let unit = ResourceUnit::observe(view, Some(7), ResourceOptions::default());
///
/// let state = unit.settled().await;
/// assert_eq!(state.status, Status::Ready);
/// assert_eq!(state.value, Some(49));
/// # }
/// ```
pub struct ResourceUnit<V: View> {
    inner: Arc<UnitInner<V>>,
}

impl<V: View> Clone for ResourceUnit<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: View> fmt::Debug for ResourceUnit<V>
where
    V::Output: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceUnit")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl<V: View> ResourceUnit<V> {
    /// Creates a unit and issues its first fetch.
    ///
    /// `params` of `None` means "not ready": the unit stays
    /// [`Status::Idle`] until [`set_params`](Self::set_params) supplies them.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime while `params` is `Some`.
    pub fn observe(view: V, params: Option<V::Params>, options: ResourceOptions<V::Output>) -> Self {
        let label = options
            .label
            .clone()
            .unwrap_or_else(|| view.name().to_owned());
        let (state, _) = watch::channel(ResourceState::default());
        let (epoch, _) = watch::channel(0);

        let unit = Self {
            inner: Arc::new(UnitInner {
                id: nanoid::nanoid!(10),
                label,
                view,
                options,
                core: Mutex::new(Core {
                    params,
                    epoch: 0,
                    issued: 0,
                    in_flight: None,
                }),
                state,
                epoch,
            }),
        };

        tracing::debug!(resource = %unit.inner.label, id = %unit.inner.id, "resource observed");
        drop(unit.issue());
        unit
    }

    /// Replaces the params. Returns `false` when they are equal by value.
    ///
    /// A change issues one fetch for the new params, even if a fetch for
    /// the old ones is still outstanding. Changing to `None` resets the unit
    /// to an empty [`Status::Idle`] state, since its value described a
    /// subject that is no longer selected.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime while the new params are `Some`.
    pub fn set_params(&self, params: Option<V::Params>) -> bool {
        {
            let mut guard = self.inner.core.lock();
            let core = &mut *guard;
            if core.params == params {
                return false;
            }
            tracing::debug!(
                resource = %self.inner.label,
                from = ?core.params,
                to = ?params,
                "params changed"
            );
            core.params = params;
            core.epoch += 1;
            core.in_flight = None;
            if core.params.is_none() {
                self.inner.state.send_replace(ResourceState::default());
            }
            self.inner.epoch.send_replace(core.epoch);
        }
        drop(self.issue());
        true
    }

    /// Fetches the current params and waits for this fetch to settle.
    ///
    /// A no-op when params are not ready: no status change, no error, no
    /// view call.
    pub async fn refetch(&self) {
        if let Some(done) = self.issue() {
            done.await;
        }
    }

    /// Issues a fetch, or joins the outstanding one under single-flight.
    fn issue(&self) -> Option<FetchDone> {
        let mut guard = self.inner.core.lock();
        let core = &mut *guard;
        let Some(params) = core.params.clone() else {
            tracing::trace!(resource = %self.inner.label, "params not ready, skipping fetch");
            return None;
        };

        if self.inner.options.single_flight
            && let Some(in_flight) = core.in_flight.as_ref().filter(|f| f.epoch == core.epoch)
        {
            tracing::trace!(
                resource = %self.inner.label,
                generation = in_flight.generation,
                "joining outstanding fetch"
            );
            return Some(in_flight.done.clone());
        }

        core.issued += 1;
        let generation = core.issued;
        let epoch = core.epoch;
        self.inner
            .state
            .send_modify(|state| state.status = Status::Loading);
        tracing::debug!(
            resource = %self.inner.label,
            generation,
            params = ?params,
            "fetch issued"
        );

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = AssertUnwindSafe(inner.view.fetch(params))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(RemoteError::opaque(ViewPanicked)));
            inner.settle(generation, epoch, result);
        });

        let done: FetchDone = async move {
            // The task owns the fetch; a join error only means it was aborted
            // by runtime shutdown.
            let _ = task.await;
        }
        .boxed()
        .shared();

        core.in_flight = Some(InFlight {
            generation,
            epoch,
            done: done.clone(),
        });
        Some(done)
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> ResourceState<V::Output> {
        self.inner.state.borrow().clone()
    }

    /// Returns the last good value.
    #[must_use]
    pub fn value(&self) -> Option<V::Output> {
        self.inner.state.borrow().value.clone()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.inner.state.borrow().status
    }

    /// Returns `true` while a fetch is outstanding.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.status() == Status::Loading
    }

    /// Returns the error of the latest applied fetch.
    #[must_use]
    pub fn error(&self) -> Option<ErrorInfo> {
        self.inner.state.borrow().error.clone()
    }

    /// Returns the current params.
    #[must_use]
    pub fn params(&self) -> Option<V::Params> {
        self.inner.core.lock().params.clone()
    }

    /// Returns how many fetches this unit has issued to its view.
    #[must_use]
    pub fn fetches_issued(&self) -> u64 {
        self.inner.core.lock().issued
    }

    /// Returns the label used in logs.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Returns the unit's unique id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<V::Output>> {
        self.inner.state.subscribe()
    }

    /// Subscribes to params changes; the value is the params epoch.
    #[must_use]
    pub fn params_epoch(&self) -> watch::Receiver<u64> {
        self.inner.epoch.subscribe()
    }

    /// Waits until no fetch is outstanding and returns the state.
    pub async fn settled(&self) -> ResourceState<V::Output> {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }
}
