//! Payload builders for the ledger's entry functions.

use core::time::Duration;
use std::sync::Arc;

use tether_core::address::Address;
use tether_core::config::SyncConfig;
use tether_core::wallet::{TransactionPayload, WalletSession};
use tether_tx::{BuildError, FinalityWatcher, OperationOptions, PayloadBuilder, TransactionExecutor};

use crate::client::functions;

/// Longest dispute reason the ledger stores.
pub const MAX_REASON_CHARS: usize = 280;

/// Arguments of [`CreateStream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStreamArgs {
    /// Receiving account.
    pub recipient: Address,
    /// Amount locked into the stream.
    pub amount: u64,
    /// How long the stream runs. Whole seconds only.
    pub duration: Duration,
}

/// Opens a payment stream from the connected account.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateStream;

impl PayloadBuilder for CreateStream {
    type Args = CreateStreamArgs;

    fn name(&self) -> &str {
        "create_stream"
    }

    fn build(&self, args: CreateStreamArgs) -> Result<TransactionPayload, BuildError> {
        if args.recipient.is_empty() {
            return Err(BuildError::MissingArgument("recipient"));
        }
        if args.amount == 0 {
            return Err(BuildError::invalid("amount", "must be greater than zero"));
        }
        let seconds = args.duration.as_secs();
        if seconds == 0 {
            return Err(BuildError::invalid("duration", "must be at least one second"));
        }
        Ok(TransactionPayload::entry(functions::CREATE_STREAM)
            .with_argument(args.recipient.as_str())
            .with_argument(args.amount.to_string())
            .with_argument(seconds.to_string()))
    }
}

/// Withdraws a stream's remaining amount to the connected recipient.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithdrawStream;

impl PayloadBuilder for WithdrawStream {
    /// Stream id.
    type Args = u64;

    fn name(&self) -> &str {
        "withdraw_stream"
    }

    fn build(&self, stream_id: u64) -> Result<TransactionPayload, BuildError> {
        if stream_id == 0 {
            return Err(BuildError::invalid("stream_id", "must be non-zero"));
        }
        Ok(TransactionPayload::entry(functions::WITHDRAW).with_argument(stream_id.to_string()))
    }
}

/// Arguments of [`RaiseDispute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaiseDisputeArgs {
    /// Disputed stream.
    pub stream_id: u64,
    /// Why the stream is disputed.
    pub reason: String,
}

/// Raises a dispute against a stream the connected account is party to.
#[derive(Debug, Clone, Copy, Default)]
pub struct RaiseDispute;

impl PayloadBuilder for RaiseDispute {
    type Args = RaiseDisputeArgs;

    fn name(&self) -> &str {
        "raise_dispute"
    }

    fn build(&self, args: RaiseDisputeArgs) -> Result<TransactionPayload, BuildError> {
        if args.stream_id == 0 {
            return Err(BuildError::invalid("stream_id", "must be non-zero"));
        }
        let reason = args.reason.trim();
        if reason.is_empty() {
            return Err(BuildError::MissingArgument("reason"));
        }
        if reason.chars().count() > MAX_REASON_CHARS {
            return Err(BuildError::invalid(
                "reason",
                format!("must be at most {MAX_REASON_CHARS} characters"),
            ));
        }
        Ok(TransactionPayload::entry(functions::RAISE_DISPUTE)
            .with_argument(args.stream_id.to_string())
            .with_argument(reason))
    }
}

/// Sets the connected account's per-stream compliance threshold. Zero
/// removes the limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetComplianceThreshold;

impl PayloadBuilder for SetComplianceThreshold {
    type Args = u64;

    fn name(&self) -> &str {
        "set_compliance_threshold"
    }

    fn build(&self, threshold: u64) -> Result<TransactionPayload, BuildError> {
        Ok(TransactionPayload::entry(functions::SET_THRESHOLD).with_argument(threshold.to_string()))
    }
}

/// Executors for every ledger write, sharing one session and finality watcher.
#[derive(Debug, Clone)]
pub struct LedgerOperations {
    /// Opens a stream.
    pub create_stream: TransactionExecutor<CreateStream>,
    /// Withdraws a stream.
    pub withdraw: TransactionExecutor<WithdrawStream>,
    /// Raises a dispute.
    pub raise_dispute: TransactionExecutor<RaiseDispute>,
    /// Sets the compliance threshold.
    pub set_threshold: TransactionExecutor<SetComplianceThreshold>,
}

impl LedgerOperations {
    /// Creates all executors.
    pub fn new(session: &WalletSession, finality: Arc<dyn FinalityWatcher>, config: &SyncConfig) -> Self {
        let options = |message: &str| OperationOptions::from_config(config).with_error_message(message);
        Self {
            create_stream: TransactionExecutor::new(
                CreateStream,
                session.clone(),
                Arc::clone(&finality),
                options("Failed to create stream"),
            ),
            withdraw: TransactionExecutor::new(
                WithdrawStream,
                session.clone(),
                Arc::clone(&finality),
                options("Failed to withdraw"),
            ),
            raise_dispute: TransactionExecutor::new(
                RaiseDispute,
                session.clone(),
                Arc::clone(&finality),
                options("Failed to raise dispute"),
            ),
            set_threshold: TransactionExecutor::new(
                SetComplianceThreshold,
                session.clone(),
                finality,
                options("Failed to update compliance threshold"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stream_args(amount: u64, duration: Duration) -> CreateStreamArgs {
        CreateStreamArgs {
            recipient: Address::new("0xb0b"),
            amount,
            duration,
        }
    }

    #[test]
    fn create_stream_encodes_quantities_as_strings() {
        let payload = CreateStream
            .build(stream_args(500, Duration::from_secs(3600)))
            .unwrap();
        assert_eq!(payload.function, functions::CREATE_STREAM);
        assert_eq!(payload.arguments, vec![json!("0xb0b"), json!("500"), json!("3600")]);
    }

    #[test]
    fn create_stream_validation() {
        let err = CreateStream
            .build(stream_args(0, Duration::from_secs(1)))
            .unwrap_err();
        assert_eq!(err, BuildError::invalid("amount", "must be greater than zero"));

        let err = CreateStream
            .build(stream_args(1, Duration::from_millis(999)))
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidArgument { name: "duration", .. }));

        let mut args = stream_args(1, Duration::from_secs(1));
        args.recipient = Address::new(" ");
        assert_eq!(CreateStream.build(args).unwrap_err(), BuildError::MissingArgument("recipient"));
    }

    #[test]
    fn dispute_reason_is_trimmed_and_bounded() {
        let payload = RaiseDispute
            .build(RaiseDisputeArgs {
                stream_id: 3,
                reason: "  never delivered ".to_owned(),
            })
            .unwrap();
        assert_eq!(payload.arguments, vec![json!("3"), json!("never delivered")]);

        let err = RaiseDispute
            .build(RaiseDisputeArgs {
                stream_id: 3,
                reason: "x".repeat(MAX_REASON_CHARS + 1),
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid reason: must be at most 280 characters");

        let err = RaiseDispute
            .build(RaiseDisputeArgs {
                stream_id: 3,
                reason: "   ".to_owned(),
            })
            .unwrap_err();
        assert_eq!(err, BuildError::MissingArgument("reason"));
    }

    #[test]
    fn withdraw_rejects_stream_zero() {
        assert!(WithdrawStream.build(0).is_err());
        assert_eq!(
            WithdrawStream.build(4).unwrap().arguments,
            vec![json!("4")]
        );
    }
}
