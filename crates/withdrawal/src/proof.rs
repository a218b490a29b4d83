//! Proof construction for `proveWithdrawalTransaction`.
//!
//! A withdrawal is proven against a dispute game whose L2 block is at or
//! after the withdrawal block: the output root of that block commits to the
//! message passer storage, and `eth_getProof` at the same block proves the
//! `sentMessages` slot inside it.

use crate::{hash::sent_message_slot, message::SentMessage};
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::opstack::{
    IDisputeGameFactory::{self, GameSearchResult},
    IFaultDisputeGame, IOptimismPortal2, OutputRootProof, WithdrawalTransaction,
    MESSAGE_PASSER_ADDRESS, OUTPUT_VERSION_V0,
};
use eyre::{eyre, Result};
use tracing::debug;

/// How far back to look for games, ~40 days at one game per hour.
const MAX_GAMES_TO_CHECK: u64 = 1000;

/// Arguments of `proveWithdrawalTransaction`.
#[derive(Debug, Clone)]
pub struct ProveWithdrawalParams {
    pub withdrawal: WithdrawalTransaction,
    pub dispute_game_index: U256,
    pub output_root_proof: OutputRootProof,
    pub withdrawal_proof: Vec<Bytes>,
}

/// A dispute game and the L2 block it claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoveringGame {
    pub index: U256,
    pub l2_block: u64,
}

/// Build the proof of `message` against the oldest game covering it.
pub async fn generate_proof<P1, P2>(
    l1_provider: &P1,
    l2_provider: &P2,
    portal_address: Address,
    factory_address: Address,
    message: &SentMessage,
) -> Result<ProveWithdrawalParams>
where
    P1: Provider,
    P2: Provider,
{
    let game = find_covering_game(l1_provider, portal_address, factory_address, message.l2_block)
        .await?
        .ok_or_else(|| {
            eyre!(
                "no dispute game covers L2 block {} yet",
                message.l2_block
            )
        })?;
    debug!(
        game_index = %game.index,
        game_l2_block = game.l2_block,
        withdrawal_block = message.l2_block,
        "Found covering dispute game"
    );

    // The output root is committed at the game's block, not the withdrawal's.
    let block = l2_provider
        .get_block_by_number(BlockNumberOrTag::Number(game.l2_block))
        .await?
        .ok_or_else(|| eyre!("L2 block {} not found", game.l2_block))?;

    let proof = l2_provider
        .get_proof(MESSAGE_PASSER_ADDRESS, vec![sent_message_slot(message.hash)])
        .block_id(BlockNumberOrTag::Number(game.l2_block).into())
        .await?;
    let withdrawal_proof = proof
        .storage_proof
        .first()
        .ok_or_else(|| eyre!("eth_getProof returned no storage proof"))?
        .proof
        .clone();
    debug!(proof_nodes = withdrawal_proof.len(), "Generated storage proof");

    Ok(ProveWithdrawalParams {
        withdrawal: message.withdrawal.clone(),
        dispute_game_index: game.index,
        output_root_proof: OutputRootProof {
            version: OUTPUT_VERSION_V0,
            stateRoot: block.header.state_root,
            messagePasserStorageRoot: proof.storage_hash,
            latestBlockhash: block.header.hash,
        },
        withdrawal_proof,
    })
}

/// Oldest recent game of the respected type whose L2 block is at or after
/// `l2_block`, or `None` when no game covers it yet.
pub async fn find_covering_game<P>(
    l1_provider: &P,
    portal_address: Address,
    factory_address: Address,
    l2_block: u64,
) -> Result<Option<CoveringGame>>
where
    P: Provider,
{
    let portal = IOptimismPortal2::new(portal_address, l1_provider);
    let game_type = portal.respectedGameType().call().await?;

    let factory = IDisputeGameFactory::new(factory_address, l1_provider);
    let game_count = factory.gameCount().call().await?;
    if game_count.is_zero() {
        return Ok(None);
    }

    let games = factory
        .findLatestGames(
            game_type,
            game_count - U256::from(1),
            U256::from(MAX_GAMES_TO_CHECK),
        )
        .call()
        .await?;
    debug!(game_type, found_games = games.len(), "Searching dispute games");

    // Newest first, so covering games form a prefix. Find where it ends.
    let (mut lo, mut hi) = (0, games.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if game_l2_block(l1_provider, &games[mid]).await? >= l2_block {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    if lo == 0 {
        return Ok(None);
    }

    let game = &games[lo - 1];
    Ok(Some(CoveringGame {
        index: game.index,
        l2_block: game_l2_block(l1_provider, game).await?,
    }))
}

/// The game proxy address is the low 20 bytes of the metadata word.
fn game_address(game: &GameSearchResult) -> Address {
    Address::from_slice(&game.metadata[12..])
}

async fn game_l2_block<P: Provider>(l1_provider: &P, game: &GameSearchResult) -> Result<u64> {
    let address = game_address(game);
    let l2_block = IFaultDisputeGame::new(address, l1_provider)
        .l2BlockNumber()
        .call()
        .await
        .map_err(|e| eyre!("l2BlockNumber on game {} at {}: {}", game.index, address, e))?;
    Ok(l2_block.saturating_to())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Bytes, B256};

    #[test]
    fn test_game_address_from_metadata() {
        // GameId packs type (4 bytes) | timestamp (8 bytes) | proxy (20 bytes)
        let proxy = address!("d6E6C0Dba7A2A0E1C4aD6f8ED3B1D3C6d0b6F0aa");
        let mut metadata = [0u8; 32];
        metadata[..4].copy_from_slice(&1u32.to_be_bytes());
        metadata[4..12].copy_from_slice(&1_700_000_000u64.to_be_bytes());
        metadata[12..].copy_from_slice(proxy.as_slice());

        let game = GameSearchResult {
            index: U256::from(7),
            metadata: B256::from(metadata),
            timestamp: 1_700_000_000,
            rootClaim: B256::ZERO,
            extraData: Bytes::new(),
        };

        assert_eq!(game_address(&game), proxy);
    }
}
