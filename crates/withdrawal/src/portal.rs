//! Withdrawal state recorded by `OptimismPortal2`.

use alloy_primitives::{Address, B256};
use alloy_provider::Provider;
use binding::opstack::IOptimismPortal2;
use task::MessageStatus;

/// What the portal knows about one withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalRecord {
    /// Never proven by our submitter.
    Unproven,
    /// Proven at `proven_at`, relayable from `proven_at + maturity_delay`.
    Proven { proven_at: u64, maturity_delay: u64 },
    Finalized,
}

impl PortalRecord {
    /// Lifecycle status at L1 time `now`. `covered` tells whether a dispute
    /// game covering the withdrawal block exists, it only matters while
    /// unproven.
    pub const fn status(&self, now: u64, covered: bool) -> MessageStatus {
        match *self {
            Self::Finalized => MessageStatus::Relayed,
            Self::Proven {
                proven_at,
                maturity_delay,
            } => {
                if now >= proven_at.saturating_add(maturity_delay) {
                    MessageStatus::ReadyForRelay
                } else {
                    MessageStatus::Proven
                }
            }
            Self::Unproven if covered => MessageStatus::ReadyToProve,
            Self::Unproven => MessageStatus::Sent,
        }
    }
}

/// Read the portal record of `hash` as proven by `proof_submitter`.
pub async fn read_record<P>(
    l1_provider: &P,
    portal_address: Address,
    hash: B256,
    proof_submitter: Address,
) -> eyre::Result<PortalRecord>
where
    P: Provider,
{
    let portal = IOptimismPortal2::new(portal_address, l1_provider);

    if portal.finalizedWithdrawals(hash).call().await? {
        return Ok(PortalRecord::Finalized);
    }

    let proven = portal
        .provenWithdrawals(hash, proof_submitter)
        .call()
        .await?;
    if proven.timestamp == 0 {
        return Ok(PortalRecord::Unproven);
    }

    let maturity_delay = portal
        .proofMaturityDelaySeconds()
        .call()
        .await?
        .saturating_to::<u64>();

    Ok(PortalRecord::Proven {
        proven_at: proven.timestamp,
        maturity_delay,
    })
}
