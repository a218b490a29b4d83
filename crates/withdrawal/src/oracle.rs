use crate::{
    message::{find_sent_message, SentMessage},
    portal::read_record,
    proof::{find_covering_game, generate_proof},
};
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use binding::opstack::IOptimismPortal2;
use std::future::Future;
use task::{
    BridgeOracle, ChainBackend, ChainTransactionRequest, MessageReceipt, MessageStatus,
    OracleError, ProviderBackend,
};
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, info, warn};

/// [`BridgeOracle`] for an OP Stack L2 settling on L1 through fault proofs.
///
/// Reads are retried with exponential backoff. Prove and finalize are sent
/// once through `l1_backend`, whose sender is also the proof submitter the
/// portal records.
pub struct OpStackOracle<P1, P2> {
    l1_provider: P1,
    l2_provider: P2,
    l1_backend: ProviderBackend<P1>,
    portal_address: Address,
    factory_address: Address,
}

impl<P1, P2> OpStackOracle<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider,
{
    pub fn new(
        l1_provider: P1,
        l2_provider: P2,
        l1_backend: ProviderBackend<P1>,
        portal_address: Address,
        factory_address: Address,
    ) -> Self {
        Self {
            l1_provider,
            l2_provider,
            l1_backend,
            portal_address,
            factory_address,
        }
    }

    fn proof_submitter(&self) -> Address {
        self.l1_backend.sender()
    }

    /// The message sent by `tx_hash`, `None` while the transaction has no receipt.
    async fn locate(&self, tx_hash: TxHash) -> Result<Option<SentMessage>, OracleError> {
        let receipt = with_retry("l2 rpc", || async {
            Ok::<_, eyre::Report>(self.l2_provider.get_transaction_receipt(tx_hash).await?)
        })
        .await?;

        let Some(receipt) = receipt else {
            debug!(%tx_hash, "No L2 receipt yet");
            return Ok(None);
        };

        let l2_block = receipt.block_number.unwrap_or_default();
        find_sent_message(receipt.inner.logs(), l2_block)
            .map(Some)
            .ok_or(OracleError::NoMessage(tx_hash))
    }

    async fn require_message(&self, tx_hash: TxHash) -> Result<SentMessage, OracleError> {
        self.locate(tx_hash)
            .await?
            .ok_or(OracleError::NoMessage(tx_hash))
    }

    async fn message_status(&self, message: &SentMessage) -> Result<MessageStatus, OracleError> {
        let record = with_retry("optimism portal", || {
            read_record(
                &self.l1_provider,
                self.portal_address,
                message.hash,
                self.proof_submitter(),
            )
        })
        .await?;

        let now = with_retry("l1 rpc", || async {
            let block = self
                .l1_provider
                .get_block_by_number(BlockNumberOrTag::Latest)
                .await?
                .ok_or_else(|| eyre::eyre!("latest L1 block not found"))?;
            Ok::<_, eyre::Report>(block.header.timestamp)
        })
        .await?;

        // Game lookup is only needed before the proof.
        let covered = match record.status(now, false) {
            MessageStatus::Sent => with_retry("dispute game factory", || {
                find_covering_game(
                    &self.l1_provider,
                    self.portal_address,
                    self.factory_address,
                    message.l2_block,
                )
            })
            .await?
            .is_some(),
            _ => false,
        };

        Ok(record.status(now, covered))
    }

    /// Send one portal transaction and wait for it.
    async fn send_to_portal(
        &self,
        action: &'static str,
        request: ChainTransactionRequest,
    ) -> Result<TxHash, OracleError> {
        let tx_hash = self
            .l1_backend
            .submit(&request)
            .await
            .map_err(|e| OracleError::Rejected {
                action,
                cause: e.to_string(),
            })?;
        info!(%tx_hash, action, portal = %self.portal_address, "Portal transaction submitted");

        self.l1_backend
            .confirm(tx_hash)
            .await
            .map_err(|e| OracleError::TransactionFailed {
                action,
                hash: tx_hash,
                cause: e.to_string(),
            })?;
        info!(%tx_hash, action, "Portal transaction confirmed");

        Ok(tx_hash)
    }
}

impl<P1, P2> BridgeOracle for OpStackOracle<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider,
{
    async fn status(&self, tx_hash: TxHash) -> Result<MessageStatus, OracleError> {
        match self.locate(tx_hash).await? {
            Some(message) => self.message_status(&message).await,
            None => Ok(MessageStatus::Sent),
        }
    }

    async fn prove(&self, tx_hash: TxHash) -> Result<TxHash, OracleError> {
        let message = self.require_message(tx_hash).await?;
        let params = with_retry("proof generation", || {
            generate_proof(
                &self.l1_provider,
                &self.l2_provider,
                self.portal_address,
                self.factory_address,
                &message,
            )
        })
        .await?;

        let call = IOptimismPortal2::proveWithdrawalTransactionCall {
            _tx: params.withdrawal,
            _disputeGameIndex: params.dispute_game_index,
            _outputRootProof: params.output_root_proof,
            _withdrawalProof: params.withdrawal_proof,
        };
        let request = ChainTransactionRequest::new(
            self.portal_address,
            self.proof_submitter(),
            &call,
            U256::ZERO,
        );

        self.send_to_portal("prove", request).await
    }

    async fn finalize(&self, tx_hash: TxHash) -> Result<TxHash, OracleError> {
        let message = self.require_message(tx_hash).await?;

        let call = IOptimismPortal2::finalizeWithdrawalTransactionExternalProofCall {
            _tx: message.withdrawal,
            _proofSubmitter: self.proof_submitter(),
        };
        let request = ChainTransactionRequest::new(
            self.portal_address,
            self.proof_submitter(),
            &call,
            U256::ZERO,
        );

        self.send_to_portal("finalize", request).await
    }

    async fn message(&self, tx_hash: TxHash) -> Result<MessageReceipt, OracleError> {
        let message = self.require_message(tx_hash).await?;
        let status = self.message_status(&message).await?;

        Ok(MessageReceipt {
            transaction_hash: tx_hash,
            message_hash: message.hash,
            status,
        })
    }
}

/// Run a read, retrying up to five times with delays doubling from 100ms.
async fn with_retry<T, F, Fut>(service: &'static str, read: F) -> Result<T, OracleError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = eyre::Result<T>>,
{
    let mut read = read;
    let strategy = ExponentialBackoff::from_millis(2).factor(50).take(5);

    Retry::spawn(strategy, || {
        let attempt = read();
        async move {
            attempt.await.inspect_err(|e| {
                warn!(service, error = %e, "Read failed, will retry");
            })
        }
    })
    .await
    .map_err(|e| OracleError::Unavailable {
        service: service.to_string(),
        cause: e.to_string(),
    })
}
