//! The per-invocation transaction state machine.
//!
//! ```text
//! Idle ──▶ Building ──▶ Submitting ──▶ Confirming ──▶ Succeeded
//!  │          │             │              │
//!  └──────────┴─────────────┴──────────────┴────────▶ Failed
//! ```
//!
//! `Idle` goes straight to `Failed` when no wallet is connected.

use core::fmt;

use tether_core::error::ErrorInfo;
use tether_core::wallet::TxHash;

/// Phase of one transaction invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TxPhase {
    /// Nothing has been attempted.
    #[default]
    Idle,
    /// The payload is being built.
    Building,
    /// The signer is dispatching the payload.
    Submitting,
    /// Waiting for the transaction to reach finality.
    Confirming,
    /// The transaction is final.
    Succeeded,
    /// The invocation ended in an error.
    Failed,
}

impl TxPhase {
    /// Returns `true` for phases with a remote or local step in progress.
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Building | Self::Submitting | Self::Confirming)
    }

    /// Returns `true` for `Succeeded` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns `true` if the machine may move from `self` to `next`.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Building)
            | (Self::Building, Self::Submitting)
            | (Self::Submitting, Self::Confirming)
            | (Self::Confirming, Self::Succeeded) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for TxPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Building => "building",
            Self::Submitting => "submitting",
            Self::Confirming => "confirming",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Snapshot of one invocation: its phase, its hash once final, its error once failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionOp {
    phase: TxPhase,
    result: Option<TxHash>,
    error: Option<ErrorInfo>,
}

impl TransactionOp {
    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TxPhase {
        self.phase
    }

    /// Hash of the transaction, set once it has succeeded.
    #[must_use]
    pub fn result(&self) -> Option<&TxHash> {
        self.result.as_ref()
    }

    /// Error of a failed invocation.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Returns `true` while the invocation is in progress.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.phase.is_pending()
    }

    /// Moves to `next`, returning `false` and leaving the op untouched if the
    /// transition is not allowed.
    pub(crate) fn advance(&mut self, next: TxPhase) -> bool {
        if !self.phase.can_advance_to(next) {
            tracing::error!(from = %self.phase, to = %next, "invalid transaction phase transition");
            return false;
        }
        self.phase = next;
        true
    }

    pub(crate) fn succeed(&mut self, hash: TxHash) -> bool {
        if !self.advance(TxPhase::Succeeded) {
            return false;
        }
        self.result = Some(hash);
        true
    }

    pub(crate) fn fail(&mut self, error: ErrorInfo) -> bool {
        if !self.advance(TxPhase::Failed) {
            return false;
        }
        self.error = Some(error);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::error::ErrorKind;

    #[test]
    fn happy_path_transitions() {
        let mut op = TransactionOp::default();
        for phase in [TxPhase::Building, TxPhase::Submitting, TxPhase::Confirming] {
            assert!(op.advance(phase));
            assert!(op.loading());
        }
        assert!(op.succeed(TxHash::new("0xabc")));
        assert_eq!(op.phase(), TxPhase::Succeeded);
        assert_eq!(op.result().map(TxHash::as_str), Some("0xabc"));
        assert!(op.error().is_none());
    }

    #[test]
    fn any_pending_phase_can_fail() {
        for phase in [TxPhase::Idle, TxPhase::Building, TxPhase::Submitting, TxPhase::Confirming] {
            assert!(phase.can_advance_to(TxPhase::Failed), "{phase} -> failed");
        }
    }

    #[test]
    fn terminal_phases_are_final() {
        let mut op = TransactionOp::default();
        assert!(op.fail(ErrorInfo::not_connected()));
        assert!(!op.advance(TxPhase::Building));
        assert!(!op.fail(ErrorInfo::new(ErrorKind::Build, "again")));
        assert_eq!(op.error(), Some(&ErrorInfo::not_connected()));
        assert!(!TxPhase::Succeeded.can_advance_to(TxPhase::Failed));
    }

    #[test]
    fn phases_cannot_be_skipped() {
        assert!(!TxPhase::Idle.can_advance_to(TxPhase::Submitting));
        assert!(!TxPhase::Building.can_advance_to(TxPhase::Confirming));
        assert!(!TxPhase::Submitting.can_advance_to(TxPhase::Succeeded));
    }
}
