//! Bridge message lifecycle as seen by the operations tasks.
//!
//! The message itself (proof generation, challenge window, relaying) is
//! owned by the rollup; [`BridgeOracle`] is the seam a rollup-specific
//! implementation plugs into.

use crate::TaskError;
use alloy_primitives::{TxHash, B256};
use serde::{Deserialize, Serialize};
use std::{fmt, future::Future};
use thiserror::Error;

/// Lifecycle of an L2→L1 message, in the order it progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    /// Included on L2, not yet covered by an L1 state commitment.
    Sent,
    /// A state commitment covering the message exists on L1.
    ReadyToProve,
    /// Proven on L1, challenge window running.
    Proven,
    /// Challenge window elapsed.
    ReadyForRelay,
    /// Executed on L1.
    Relayed,
}

impl MessageStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::ReadyToProve => "READY_TO_PROVE",
            Self::Proven => "PROVEN",
            Self::ReadyForRelay => "READY_FOR_RELAY",
            Self::Relayed => "RELAYED",
        }
    }

    /// Position in the lifecycle, used as a gauge value.
    pub const fn ordinal(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bridge message located from the transaction that sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceipt {
    /// Transaction that sent the message
    pub transaction_hash: TxHash,
    /// Rollup-specific identifier of the message
    pub message_hash: B256,
    pub status: MessageStatus,
}

#[derive(Error, Debug)]
pub enum OracleError {
    /// The transaction exists but emitted no bridge message.
    #[error("transaction {0} did not send a bridge message")]
    NoMessage(TxHash),

    /// Reading rollup state failed after retries.
    #[error("{service}: {cause}")]
    Unavailable { service: String, cause: String },

    /// A prove or finalize transaction could not be built or broadcast.
    #[error("{action} rejected: {cause}")]
    Rejected { action: &'static str, cause: String },

    /// A prove or finalize transaction was mined and reverted, or was dropped.
    #[error("{action} transaction {hash} failed: {cause}")]
    TransactionFailed {
        action: &'static str,
        hash: TxHash,
        cause: String,
    },
}

impl From<OracleError> for TaskError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::NoMessage(hash) => Self::MessageNotFound { hash },
            OracleError::Unavailable { service, cause } => {
                Self::ExternalServiceUnavailable { service, cause }
            }
            OracleError::Rejected { action, cause } => Self::SubmissionRejected {
                method: action.to_string(),
                cause,
            },
            OracleError::TransactionFailed { hash, cause, .. } => {
                Self::TransactionFailed { hash, cause }
            }
        }
    }
}

/// Rollup-specific view of bridge messages, keyed by the sending transaction.
pub trait BridgeOracle: Send + Sync {
    /// Current status of the message sent by `tx_hash`.
    fn status(&self, tx_hash: TxHash)
        -> impl Future<Output = Result<MessageStatus, OracleError>> + Send;

    /// Prove the message on L1. Returns the prove transaction hash once mined.
    fn prove(&self, tx_hash: TxHash) -> impl Future<Output = Result<TxHash, OracleError>> + Send;

    /// Relay the proven message on L1. Returns the finalize transaction hash once mined.
    fn finalize(&self, tx_hash: TxHash)
        -> impl Future<Output = Result<TxHash, OracleError>> + Send;

    /// The message sent by `tx_hash` with its current status.
    fn message(&self, tx_hash: TxHash)
        -> impl Future<Output = Result<MessageReceipt, OracleError>> + Send;
}
