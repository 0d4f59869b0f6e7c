//! Error types shared across Tether.
//!
//! Collaborators (views, signers, finality watchers) fail with
//! [`RemoteError`]. Tether never lets those escape to presentation code:
//! they are caught at the resource or operation boundary and converted into
//! an [`ErrorInfo`], a cloneable value that sits next to the data it concerns.

/// Failures reported by remote collaborators.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The remote side refused the request and said why.
    #[error("{0}")]
    Rejected(String),

    /// The remote answered with data that could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Transport-level failure (connection refused, bad status, ...).
    #[error("http error: {0}")]
    Http(String),

    /// The transport gave up waiting.
    #[error("timed out waiting for the ledger")]
    Timeout,

    /// The transaction was included but its execution failed.
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// A failure with no message fit for display.
    #[error("unexpected failure")]
    Opaque(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RemoteError {
    /// Creates a [`Rejected`](Self::Rejected) error.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Creates a [`Malformed`](Self::Malformed) error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Wraps an arbitrary error as [`Opaque`](Self::Opaque).
    pub fn opaque(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Opaque(Box::new(err))
    }

    /// Returns the display message for structured failures.
    ///
    /// Opaque failures return `None`; callers substitute their own generic
    /// message for those.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Opaque(_) => None,
            other => Some(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Category of a surfaced error.
///
/// A missing identity or missing parameters is deliberately absent from this
/// list: "not ready" is a silent state, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A view call failed or returned malformed data.
    RemoteQuery,
    /// A write was attempted without an authenticated signer.
    NotConnected,
    /// The payload could not be constructed from the supplied arguments.
    Build,
    /// The signer or network rejected the transaction before inclusion.
    SubmitRejected,
    /// The transaction never reached finality, or reverted.
    FinalityFailure,
}

/// An error as exposed to presentation code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ErrorInfo {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Message fit for display.
    pub message: String,
}

impl ErrorInfo {
    /// Message surfaced when a write is attempted without a connected wallet.
    pub const NOT_CONNECTED: &'static str = "Wallet not connected";

    /// Creates an error with an explicit message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Converts a remote failure, falling back to `generic` when the failure
    /// carries no displayable message.
    #[must_use]
    pub fn from_remote(kind: ErrorKind, err: &RemoteError, generic: &str) -> Self {
        Self {
            kind,
            message: err.message().unwrap_or_else(|| generic.to_owned()),
        }
    }

    /// The "Wallet not connected" error.
    #[must_use]
    pub fn not_connected() -> Self {
        Self::new(ErrorKind::NotConnected, Self::NOT_CONNECTED)
    }
}
