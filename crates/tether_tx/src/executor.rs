//! The [`TransactionExecutor`]: one awaitable call per write.
//!
//! An executor bundles a [`PayloadBuilder`], the [`WalletSession`] it signs
//! with, and a [`FinalityWatcher`]. Each [`invoke`](TransactionExecutor::invoke)
//! runs build → submit → confirm and reports the outcome through a single
//! loading flag and a single error slot. Nothing escapes: failures of any
//! phase end up in [`error`](TransactionExecutor::error) and `invoke` returns
//! `None`.
//!
//! Exactly one submit is attempted per invocation. There is no retry and no
//! automatic invalidation of resources; callers refetch what the write
//! affected, or use [`invoke_then_refetch`](TransactionExecutor::invoke_then_refetch).

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tether_core::config::SyncConfig;
use tether_core::error::{ErrorInfo, ErrorKind};
use tether_core::wallet::{TxHash, WalletSession};
use tether_resource::Refreshable;
use tokio::sync::watch;

use crate::finality::FinalityWatcher;
use crate::op::{TransactionOp, TxPhase};
use crate::payload::PayloadBuilder;

// ─────────────────────────────────────────────────────────────────────────────
// OperationOptions
// ─────────────────────────────────────────────────────────────────────────────

/// Per-operation settings.
#[derive(Debug, Clone)]
pub struct OperationOptions {
    error_message: String,
    label: Option<String>,
}

impl Default for OperationOptions {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl OperationOptions {
    /// Creates options from the given config.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            error_message: config.transaction_error_message.clone(),
            label: None,
        }
    }

    /// Sets the message shown when a remote step fails without a displayable one.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    /// Sets the label used in logs.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the generic error message.
    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.error_message
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internals
// ─────────────────────────────────────────────────────────────────────────────

struct ExecutorInner<B> {
    label: String,
    builder: B,
    session: WalletSession,
    finality: Arc<dyn FinalityWatcher>,
    options: OperationOptions,
    state: watch::Sender<TransactionOp>,
    invocations: AtomicU64,
}

/// One invocation in progress. Only the latest invocation publishes.
struct Run<'a, B> {
    inner: &'a ExecutorInner<B>,
    id: u64,
    op: TransactionOp,
}

impl<B> Run<'_, B> {
    fn publish(&self) {
        let latest = self.inner.invocations.load(Ordering::SeqCst);
        if self.id != latest {
            tracing::debug!(
                operation = %self.inner.label,
                invocation = self.id,
                latest,
                "superseded invocation, not publishing"
            );
            return;
        }
        self.inner.state.send_replace(self.op.clone());
    }

    fn advance(&mut self, next: TxPhase) {
        if self.op.advance(next) {
            tracing::debug!(operation = %self.inner.label, invocation = self.id, phase = %next, "transaction phase");
            self.publish();
        }
    }

    fn fail(&mut self, error: ErrorInfo) {
        tracing::warn!(
            operation = %self.inner.label,
            invocation = self.id,
            phase = %self.op.phase(),
            kind = ?error.kind,
            error = %error,
            "transaction failed"
        );
        if self.op.fail(error) {
            self.publish();
        }
    }

    fn succeed(&mut self, hash: TxHash) {
        tracing::info!(operation = %self.inner.label, invocation = self.id, %hash, "transaction final");
        if self.op.succeed(hash) {
            self.publish();
        }
    }
}

impl<B> Drop for Run<'_, B> {
    // `invoke` was dropped mid-flight; its outcome is no longer observable.
    fn drop(&mut self) {
        let kind = match self.op.phase() {
            TxPhase::Building => ErrorKind::Build,
            TxPhase::Submitting => ErrorKind::SubmitRejected,
            TxPhase::Confirming => ErrorKind::FinalityFailure,
            _ => return,
        };
        tracing::debug!(operation = %self.inner.label, invocation = self.id, "invocation abandoned");
        let message = self.inner.options.error_message.clone();
        self.fail(ErrorInfo::new(kind, message));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TransactionExecutor
// ─────────────────────────────────────────────────────────────────────────────

/// Runs a write as build → submit → confirm behind one awaitable call.
///
/// Cloning yields another handle to the same operation state.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use tether_core::error::RemoteError;
/// use tether_core::wallet::{TransactionPayload, TxHash, WalletSession};
/// use tether_tx::{FinalityWatcher, OperationOptions, TransactionExecutor, TxPhase, builder_fn};
///
/// struct Instant;
///
/// #[async_trait]
/// impl FinalityWatcher for Instant {
///     async fn await_finality(&self, _hash: &TxHash) -> Result<(), RemoteError> {
///         Ok(())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let withdraw = TransactionExecutor::new(
///     builder_fn("withdraw", |id: u64| {
///         Ok(TransactionPayload::entry("stream::withdraw").with_argument(id))
///     }),
///     WalletSession::new(),
///     Arc::new(Instant),
///     OperationOptions::default(),
/// );
///
/// assert_eq!(withdraw.invoke(7).await, None);
/// assert_eq!(withdraw.phase(), TxPhase::Failed);
/// assert_eq!(withdraw.error().unwrap().message, "Wallet not connected");
/// # }
/// ```
pub struct TransactionExecutor<B> {
    inner: Arc<ExecutorInner<B>>,
}

impl<B> Clone for TransactionExecutor<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B> fmt::Debug for TransactionExecutor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionExecutor")
            .field("label", &self.inner.label)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl<B: PayloadBuilder> TransactionExecutor<B> {
    /// Creates an executor. Nothing is submitted until [`invoke`](Self::invoke).
    pub fn new(
        builder: B,
        session: WalletSession,
        finality: Arc<dyn FinalityWatcher>,
        options: OperationOptions,
    ) -> Self {
        let label = options
            .label
            .clone()
            .unwrap_or_else(|| builder.name().to_owned());
        let (state, _) = watch::channel(TransactionOp::default());
        Self {
            inner: Arc::new(ExecutorInner {
                label,
                builder,
                session,
                finality,
                options,
                state,
                invocations: AtomicU64::new(0),
            }),
        }
    }

    /// Runs one invocation to a terminal phase.
    ///
    /// Returns the transaction hash on success and `None` on any failure,
    /// with the detail in [`error`](Self::error). Without a connected wallet
    /// the invocation fails immediately and makes no remote call.
    pub async fn invoke(&self, args: B::Args) -> Option<TxHash> {
        let inner = &*self.inner;
        let id = inner.invocations.fetch_add(1, Ordering::SeqCst) + 1;
        let mut run = Run {
            inner,
            id,
            op: TransactionOp::default(),
        };
        run.publish();

        let identity = inner.session.identity();
        let Some(signer) = identity
            .signer()
            .filter(|_| identity.is_connected())
            .cloned()
        else {
            run.fail(ErrorInfo::not_connected());
            return None;
        };

        run.advance(TxPhase::Building);
        let payload = match inner.builder.build(args) {
            Ok(payload) => payload,
            Err(err) => {
                run.fail(ErrorInfo::new(ErrorKind::Build, err.to_string()));
                return None;
            }
        };

        run.advance(TxPhase::Submitting);
        tracing::debug!(
            operation = %inner.label,
            function = %payload.function,
            sender = ?identity.address(),
            "submitting transaction"
        );
        let pending = match signer.submit(payload).await {
            Ok(pending) => pending,
            Err(err) => {
                run.fail(ErrorInfo::from_remote(
                    ErrorKind::SubmitRejected,
                    &err,
                    &inner.options.error_message,
                ));
                return None;
            }
        };

        run.advance(TxPhase::Confirming);
        if let Err(err) = inner.finality.await_finality(&pending.hash).await {
            run.fail(ErrorInfo::from_remote(
                ErrorKind::FinalityFailure,
                &err,
                &inner.options.error_message,
            ));
            return None;
        }

        run.succeed(pending.hash.clone());
        Some(pending.hash)
    }

    /// Invokes, then on success refetches `affected` concurrently and waits
    /// for them to settle.
    ///
    /// Nothing is refetched after a failure.
    pub async fn invoke_then_refetch(
        &self,
        args: B::Args,
        affected: &[&dyn Refreshable],
    ) -> Option<TxHash> {
        let hash = self.invoke(args).await?;
        tracing::debug!(operation = %self.inner.label, count = affected.len(), "refetching affected resources");
        join_all(affected.iter().map(|resource| resource.refresh())).await;
        Some(hash)
    }

    /// Returns a snapshot of the latest invocation.
    #[must_use]
    pub fn state(&self) -> TransactionOp {
        self.inner.state.borrow().clone()
    }

    /// Returns `true` while the latest invocation is in progress.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.inner.state.borrow().loading()
    }

    /// Returns the error of the latest invocation, if it failed.
    #[must_use]
    pub fn error(&self) -> Option<ErrorInfo> {
        self.inner.state.borrow().error().cloned()
    }

    /// Returns the phase of the latest invocation.
    #[must_use]
    pub fn phase(&self) -> TxPhase {
        self.inner.state.borrow().phase()
    }

    /// Returns the hash of the latest invocation, if it succeeded.
    #[must_use]
    pub fn last_hash(&self) -> Option<TxHash> {
        self.inner.state.borrow().result().cloned()
    }

    /// Returns how many times this operation has been invoked.
    #[must_use]
    pub fn invocations(&self) -> u64 {
        self.inner.invocations.load(Ordering::SeqCst)
    }

    /// Returns the label used in logs.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Subscribes to state changes of the latest invocation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TransactionOp> {
        self.inner.state.subscribe()
    }
}
