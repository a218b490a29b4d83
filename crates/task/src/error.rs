use crate::{bridge::MessageStatus, checkpoint::CheckpointError};
use alloy_primitives::TxHash;
use deploy_log::DeployLogError;
use std::time::Duration;
use thiserror::Error;

/// Every way a task invocation can end early.
///
/// All variants are terminal: nothing is retried on the operator's behalf.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("missing required parameter `{name}`")]
    MissingRequiredParameter { name: String },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("{artifact} is not deployed on {network}")]
    UnresolvedDeploymentAddress { artifact: String, network: String },

    /// The node refused the transaction, nothing was broadcast.
    #[error("{method} was not submitted: {cause}")]
    SubmissionRejected { method: String, cause: String },

    #[error("transaction {hash} failed: {cause}")]
    TransactionFailed { hash: TxHash, cause: String },

    #[error("message of {hash} still {last} after {waited:?}, waiting for {target}")]
    BridgeStatusTimeout {
        hash: TxHash,
        target: MessageStatus,
        last: MessageStatus,
        waited: Duration,
    },

    #[error("{service} unavailable: {cause}")]
    ExternalServiceUnavailable { service: String, cause: String },

    #[error("transaction {hash} did not send a bridge message")]
    MessageNotFound { hash: TxHash },

    #[error("no checkpoint to resume for {task} on {network}")]
    NothingToResume { task: String, network: String },

    #[error(transparent)]
    DeployLog(#[from] DeployLogError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl TaskError {
    /// Process exit code reported for this error.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::MissingRequiredParameter { .. } | Self::InvalidParameter { .. } => 2,
            Self::UnresolvedDeploymentAddress { .. } => 3,
            Self::SubmissionRejected { .. } | Self::TransactionFailed { .. } => 4,
            Self::BridgeStatusTimeout { .. } => 5,
            Self::ExternalServiceUnavailable { .. } => 6,
            Self::NothingToResume { .. } => 7,
            Self::DeployLog(_) | Self::Checkpoint(_) => 8,
            Self::MessageNotFound { .. } => 9,
        }
    }

    /// Short label used in metrics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingRequiredParameter { .. } => "missing_parameter",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::UnresolvedDeploymentAddress { .. } => "unresolved_address",
            Self::SubmissionRejected { .. } => "submission_rejected",
            Self::TransactionFailed { .. } => "transaction_failed",
            Self::BridgeStatusTimeout { .. } => "status_timeout",
            Self::ExternalServiceUnavailable { .. } => "service_unavailable",
            Self::MessageNotFound { .. } => "message_not_found",
            Self::NothingToResume { .. } => "nothing_to_resume",
            Self::DeployLog(_) => "deploy_log",
            Self::Checkpoint(_) => "checkpoint",
        }
    }

    /// Hash of the transaction the failure relates to, if one was sent.
    pub const fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::TransactionFailed { hash, .. }
            | Self::BridgeStatusTimeout { hash, .. }
            | Self::MessageNotFound { hash } => Some(*hash),
            _ => None,
        }
    }
}
