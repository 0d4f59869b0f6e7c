//! Payload construction for state-changing calls.

use core::marker::PhantomData;

use tether_core::wallet::TransactionPayload;

/// Errors raised while building a payload from user arguments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A required argument is empty or absent.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// An argument is present but out of range or malformed.
    #[error("invalid {name}: {reason}")]
    InvalidArgument {
        /// Argument name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl BuildError {
    /// Creates an [`InvalidArgument`](Self::InvalidArgument) error.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Turns typed call arguments into a wire payload.
///
/// Building is synchronous and side-effect free; it is the only place an
/// operation validates its arguments before any remote call is made.
///
/// # Example
///
/// ```
/// use tether_core::wallet::TransactionPayload;
/// use tether_tx::{BuildError, PayloadBuilder};
///
/// struct SetThreshold;
///
/// impl PayloadBuilder for SetThreshold {
///     type Args = u64;
///
///     fn build(&self, threshold: u64) -> Result<TransactionPayload, BuildError> {
///         Ok(TransactionPayload::entry("compliance::set_threshold").with_argument(threshold))
///     }
/// }
/// ```
pub trait PayloadBuilder: Send + Sync + 'static {
    /// Typed arguments of one invocation.
    type Args: Send + 'static;

    /// Name used in logs and as the default operation label.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Builds the payload.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the arguments are invalid.
    fn build(&self, args: Self::Args) -> Result<TransactionPayload, BuildError>;
}

/// A [`PayloadBuilder`] backed by a closure. Created by [`builder_fn`].
pub struct FnBuilder<F, A> {
    name: &'static str,
    build: F,
    _marker: PhantomData<fn(A)>,
}

/// Wraps a closure as a [`PayloadBuilder`].
pub fn builder_fn<F, A>(name: &'static str, build: F) -> FnBuilder<F, A>
where
    F: Fn(A) -> Result<TransactionPayload, BuildError> + Send + Sync + 'static,
    A: Send + 'static,
{
    FnBuilder {
        name,
        build,
        _marker: PhantomData,
    }
}

impl<F, A> PayloadBuilder for FnBuilder<F, A>
where
    F: Fn(A) -> Result<TransactionPayload, BuildError> + Send + Sync + 'static,
    A: Send + 'static,
{
    type Args = A;

    fn name(&self) -> &str {
        self.name
    }

    fn build(&self, args: A) -> Result<TransactionPayload, BuildError> {
        (self.build)(args)
    }
}
