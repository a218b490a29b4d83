//! Sync point from an OP Stack L2 to the primary chain.
//!
//! `syncL2Requests` on the L2 zkLink contract sends the number of processed
//! priority requests to L1 as a cross-domain message. The message then has
//! to be proven on L1 once an output root covers it, and relayed once the
//! challenge window has elapsed.

use crate::{
    bridge::{BridgeOracle, MessageStatus},
    chain::{confirm_primary, submit_primary, ChainBackend, ChainTransactionRequest},
    checkpoint::Checkpoint,
    params::{self, ParamType, ResolvedParams, TaskArgs, TaskParameter},
    watcher::MessageWatcher,
    ChainTask, ExecutionContext, TaskError, TaskOutcome, TaskSpec,
};
use alloy_primitives::{TxHash, U256};
use binding::zklink::IZkLink;
use metrics::counter;
use tracing::info;

pub const NAME: &str = "sync-l2-requests";

/// Deploy log holding the zkLink contract on each L2.
pub const ZKLINK_LOG_PREFIX: &str = "deploy_zklink";
pub const ZKLINK_ENTRY: &str = "zkLinkProxy";
/// Deploy log holding the L2 side of the chain gateway.
pub const L2_GATEWAY_LOG_PREFIX: &str = "deploy_l2_gateway";
pub const GATEWAY_ENTRY: &str = "gateway";

pub const PARAMETERS: &[TaskParameter] = &[
    TaskParameter {
        name: "txs",
        description: "New sync point: total priority requests processed on the L2",
        kind: ParamType::Int,
        default: Some("100"),
        optional: true,
    },
    TaskParameter {
        name: "resume",
        description: "Continue the relay recorded in the checkpoint instead of sending",
        kind: ParamType::Bool,
        default: Some("false"),
        optional: true,
    },
    TaskParameter {
        name: "txHash",
        description: "Continue the relay of this L2 transaction instead of sending",
        kind: ParamType::String,
        default: None,
        optional: true,
    },
];

pub const SPEC: TaskSpec = TaskSpec {
    name: NAME,
    description: "Send an L2 sync point and relay it to L1 through the OP Stack portal",
    parameters: PARAMETERS,
};

/// Sends the sync point with `backend` (bound to the L2) and relays the
/// resulting message with `oracle`.
pub struct SyncL2RequestsTask<B, O> {
    backend: B,
    oracle: O,
}

impl<B, O> SyncL2RequestsTask<B, O>
where
    B: ChainBackend,
    O: BridgeOracle,
{
    pub const fn new(backend: B, oracle: O) -> Self {
        Self { backend, oracle }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Where to pick up an earlier run, if the operator asked for it.
    fn resume_point(
        &self,
        params: &ResolvedParams,
        ctx: &ExecutionContext,
    ) -> Result<Option<(TxHash, MessageStatus)>, TaskError> {
        let network = &ctx.settings.l2_network;

        if let Some(tx_hash) = params.tx_hash("txHash")? {
            return Ok(Some((tx_hash, MessageStatus::Sent)));
        }

        if !params.require_bool("resume")? {
            return Ok(None);
        }

        let nothing_to_resume = || TaskError::NothingToResume {
            task: NAME.to_string(),
            network: network.clone(),
        };
        let store = ctx.checkpoints.as_ref().ok_or_else(nothing_to_resume)?;
        let checkpoint = store.load(NAME, network)?.ok_or_else(nothing_to_resume)?;

        Ok(Some((checkpoint.tx_hash, checkpoint.status)))
    }

    /// Build, submit and confirm the `syncL2Requests` call.
    async fn send_sync_point(
        &self,
        params: &ResolvedParams,
        ctx: &ExecutionContext,
    ) -> Result<(TxHash, Option<u64>), TaskError> {
        let network = &ctx.settings.l2_network;

        let txs = params.require_int("txs")?;
        if txs == 0 {
            return Err(TaskError::InvalidParameter {
                name: "txs".to_string(),
                reason: "sync point must be positive".to_string(),
            });
        }

        let gateway = ctx.require_address(L2_GATEWAY_LOG_PREFIX, GATEWAY_ENTRY, network)?;
        let zklink = ctx.require_address(ZKLINK_LOG_PREFIX, ZKLINK_ENTRY, network)?;
        info!(%network, %zklink, %gateway, txs, "Sending sync point");

        let call = IZkLink::syncL2RequestsCall {
            _newTotalSyncedPriorityTxs: U256::from(txs),
        };
        let request =
            ChainTransactionRequest::new(zklink, self.backend.sender(), &call, U256::ZERO);

        let tx_hash = submit_primary(&self.backend, &request).await?;
        if let Some(store) = &ctx.checkpoints {
            store.save(&Checkpoint::new(NAME, network, tx_hash, MessageStatus::Sent))?;
        }

        let confirmation = confirm_primary(&self.backend, tx_hash).await?;
        Ok((tx_hash, confirmation.block_number))
    }
}

impl<B, O> ChainTask for SyncL2RequestsTask<B, O>
where
    B: ChainBackend,
    O: BridgeOracle,
{
    fn spec(&self) -> &'static TaskSpec {
        &SPEC
    }

    async fn run(&self, args: &TaskArgs, ctx: &ExecutionContext) -> Result<TaskOutcome, TaskError> {
        let params = params::validate(PARAMETERS, args)?;
        let network = &ctx.settings.l2_network;

        let resuming = params.string("txHash")?.is_some() || params.require_bool("resume")?;
        if resuming && args.contains_key("txs") {
            return Err(TaskError::InvalidParameter {
                name: "txs".to_string(),
                reason: "a resumed relay sends no sync point".to_string(),
            });
        }

        let (tx_hash, block_number, known) = match self.resume_point(&params, ctx)? {
            Some((tx_hash, status)) => {
                info!(%tx_hash, %status, %network, "Resuming relay");
                (tx_hash, None, status)
            }
            None => {
                let (tx_hash, block_number) = self.send_sync_point(&params, ctx).await?;
                (tx_hash, block_number, MessageStatus::Sent)
            }
        };

        let mut watcher =
            MessageWatcher::new(&self.oracle, tx_hash, known, ctx.settings.poll_interval)
                .with_timeout(ctx.settings.status_timeout)
                .with_checkpoint(ctx.checkpoints.as_ref(), NAME, network);

        let mut prove_tx = None;
        if watcher.wait_for(MessageStatus::ReadyToProve).await? < MessageStatus::Proven {
            let hash = self.oracle.prove(tx_hash).await?;
            counter!("zklink_ops_messages_proven_total").increment(1);
            info!(%tx_hash, prove_tx = %hash, "Message proven");
            prove_tx = Some(hash);
        }

        let mut relay_tx = None;
        if watcher.wait_for(MessageStatus::ReadyForRelay).await? < MessageStatus::Relayed {
            let hash = self.oracle.finalize(tx_hash).await?;
            counter!("zklink_ops_messages_relayed_total").increment(1);
            info!(%tx_hash, relay_tx = %hash, "Message relayed");
            relay_tx = Some(hash);
        }

        watcher.wait_for(MessageStatus::Relayed).await?;
        let message = self.oracle.message(tx_hash).await?;

        if let Some(store) = &ctx.checkpoints {
            store.clear(NAME, network)?;
        }

        Ok(TaskOutcome {
            task: NAME,
            network: network.clone(),
            tx_hash,
            block_number,
            prove_tx,
            relay_tx,
            message: Some(message),
        })
    }
}
