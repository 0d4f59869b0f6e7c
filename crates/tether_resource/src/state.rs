//! Observable state of a resource.

use tether_core::error::ErrorInfo;

/// Lifecycle status of a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// No fetch has been issued, or params are not ready.
    #[default]
    Idle,
    /// A fetch is outstanding.
    Loading,
    /// The latest applied fetch succeeded.
    Ready,
    /// The latest applied fetch failed.
    Failed,
}

/// Snapshot of a resource: value, status and last error.
///
/// The three fields are always updated together, so a snapshot never mixes
/// the outcome of one fetch with the status of another.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<R> {
    /// Last good value. Kept visible while reloading and after failures.
    pub value: Option<R>,
    /// Current status.
    pub status: Status,
    /// Error of the latest applied fetch, if it failed.
    pub error: Option<ErrorInfo>,
}

impl<R> Default for ResourceState<R> {
    fn default() -> Self {
        Self {
            value: None,
            status: Status::Idle,
            error: None,
        }
    }
}

impl<R> ResourceState<R> {
    /// Returns `true` while a fetch is outstanding.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.status == Status::Loading
    }
}
