//! Locating the withdrawal a transaction sent through the message passer.

use crate::hash::withdrawal_hash;
use alloy_primitives::B256;
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolEvent;
use binding::opstack::{
    IL2ToL1MessagePasser::MessagePassed, WithdrawalTransaction, MESSAGE_PASSER_ADDRESS,
};
use tracing::error;

/// A withdrawal initiated on L2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub withdrawal: WithdrawalTransaction,
    pub hash: B256,
    pub l2_block: u64,
}

/// First `MessagePassed` emitted by the message passer among `logs`.
///
/// Events whose `withdrawalHash` does not match the hashed fields are
/// skipped, proving them would fail on L1.
pub fn find_sent_message(logs: &[Log], l2_block: u64) -> Option<SentMessage> {
    logs.iter()
        .filter(|log| log.address() == MESSAGE_PASSER_ADDRESS)
        .filter_map(|log| MessagePassed::decode_log(&log.inner).ok())
        .find_map(|event| {
            let event = event.data;
            let withdrawal = WithdrawalTransaction {
                nonce: event.nonce,
                sender: event.sender,
                target: event.target,
                value: event.value,
                gasLimit: event.gasLimit,
                data: event.data,
            };

            let hash = withdrawal_hash(&withdrawal);
            if hash != event.withdrawalHash {
                error!(
                    computed_hash = %hash,
                    withdrawal_hash = %event.withdrawalHash,
                    "Withdrawal hash mismatch, skipping event"
                );
                return None;
            }

            Some(SentMessage {
                withdrawal,
                hash,
                l2_block,
            })
        })
}
