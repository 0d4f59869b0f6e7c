//! The [`View`] trait for remote read-only queries.

use core::future::Future;
use core::marker::PhantomData;

use async_trait::async_trait;
use tether_core::error::RemoteError;

/// A read-only remote query.
///
/// Views know the wire format of one remote query and nothing about
/// loading flags, errors shown to users, or refresh cadence; that is the
/// job of the [`ResourceUnit`](crate::ResourceUnit) that drives them.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use tether_core::address::Address;
/// use tether_core::error::RemoteError;
/// use tether_resource::View;
///
/// struct Balance;
///
/// #[async_trait]
/// impl View for Balance {
///     type Params = Address;
///     type Output = u64;
///
///     async fn fetch(&self, _owner: Address) -> Result<u64, RemoteError> {
///         Ok(42)
///     }
/// }
/// ```
#[async_trait]
pub trait View: Send + Sync + 'static {
    /// Inputs of one query. Compared by value to detect parameter changes.
    type Params: Clone + PartialEq + core::fmt::Debug + Send + Sync + 'static;

    /// Decoded query result.
    type Output: Clone + Send + Sync + 'static;

    /// Name used in logs and as the default resource label.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Runs the query.
    async fn fetch(&self, params: Self::Params) -> Result<Self::Output, RemoteError>;
}

/// A [`View`] backed by an async closure. Created by [`view_fn`].
pub struct FnView<F, P, R, Fut> {
    name: &'static str,
    fetch: F,
    _marker: PhantomData<fn(P) -> (R, Fut)>,
}

/// Wraps an async closure as a [`View`].
///
/// # Example
///
/// ```
/// use tether_core::error::RemoteError;
/// use tether_resource::{View, view_fn};
///
/// let doubled = view_fn("doubled", |n: u64| async move { Ok::<_, RemoteError>(n * 2) });
/// assert_eq!(doubled.name(), "doubled");
/// ```
pub fn view_fn<F, P, R, Fut>(name: &'static str, fetch: F) -> FnView<F, P, R, Fut>
where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RemoteError>> + Send + 'static,
{
    FnView {
        name,
        fetch,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, P, R, Fut> View for FnView<F, P, R, Fut>
where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    P: Clone + PartialEq + core::fmt::Debug + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RemoteError>> + Send + 'static,
{
    type Params = P;
    type Output = R;

    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, params: P) -> Result<R, RemoteError> {
        (self.fetch)(params).await
    }
}
