//! Transaction submission through a provider/signer pair.

use crate::TaskError;
use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_provider::{PendingTransactionBuilder, Provider};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use client::SignerFn;
use metrics::counter;
use std::{future::Future, time::Duration};
use thiserror::Error;
use tracing::{info, warn};

/// One contract call, built once and submitted once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTransactionRequest {
    pub contract: Address,
    pub signer: Address,
    /// Solidity signature of the called method, for diagnostics
    pub method: &'static str,
    pub calldata: Bytes,
    pub value: U256,
}

impl ChainTransactionRequest {
    pub fn new<C: SolCall>(contract: Address, signer: Address, call: &C, value: U256) -> Self {
        Self {
            contract,
            signer,
            method: C::SIGNATURE,
            calldata: call.abi_encode().into(),
            value,
        }
    }

    fn to_transaction_request(&self) -> TransactionRequest {
        TransactionRequest::default()
            .from(self.signer)
            .to(self.contract)
            .value(self.value)
            .input(self.calldata.clone().into())
    }
}

/// A mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

#[derive(Error, Debug)]
pub enum BackendError {
    /// Signing or broadcast failed, nothing reached the mempool.
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("reverted in block {block_number:?}")]
    Reverted { block_number: Option<u64> },

    /// No receipt before the confirmation timeout.
    #[error("not confirmed: {0}")]
    Dropped(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}

/// Wallet/provider pair a task submits through.
pub trait ChainBackend: Send + Sync {
    /// Address transactions are sent from.
    fn sender(&self) -> Address;

    /// Read-only call, returns the raw return data.
    fn call(
        &self,
        contract: Address,
        calldata: Bytes,
    ) -> impl Future<Output = Result<Bytes, BackendError>> + Send;

    /// Sign and broadcast. Returns as soon as the node accepted the transaction.
    fn submit(
        &self,
        request: &ChainTransactionRequest,
    ) -> impl Future<Output = Result<TxHash, BackendError>> + Send;

    /// Wait until `tx_hash` is mined and check it succeeded.
    fn confirm(&self, tx_hash: TxHash)
        -> impl Future<Output = Result<Confirmation, BackendError>> + Send;
}

/// [`ChainBackend`] over an alloy provider and a [`SignerFn`].
pub struct ProviderBackend<P> {
    provider: P,
    signer: SignerFn,
    sender: Address,
    confirmation_timeout: Option<Duration>,
}

impl<P> ProviderBackend<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, sender: Address) -> Self {
        Self {
            provider,
            signer,
            sender,
            confirmation_timeout: None,
        }
    }

    /// Give up waiting for a receipt after `timeout`.
    pub fn with_confirmation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.confirmation_timeout = timeout;
        self
    }
}

impl<P> ChainBackend for ProviderBackend<P>
where
    P: Provider + Clone,
{
    fn sender(&self) -> Address {
        self.sender
    }

    async fn call(&self, contract: Address, calldata: Bytes) -> Result<Bytes, BackendError> {
        let tx = TransactionRequest::default()
            .to(contract)
            .input(calldata.into());
        self.provider
            .call(tx)
            .await
            .map_err(|e| BackendError::Rpc(e.to_string()))
    }

    async fn submit(&self, request: &ChainTransactionRequest) -> Result<TxHash, BackendError> {
        let signed = (self.signer)(request.to_transaction_request())
            .await
            .map_err(|e| BackendError::Rejected(e.to_string()))?;

        let pending = self
            .provider
            .send_raw_transaction(&signed)
            .await
            .map_err(|e| BackendError::Rejected(e.to_string()))?;

        Ok(*pending.tx_hash())
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<Confirmation, BackendError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_timeout(self.confirmation_timeout)
            .get_receipt()
            .await
            .map_err(|e| BackendError::Dropped(e.to_string()))?;

        if !receipt.status() {
            return Err(BackendError::Reverted {
                block_number: receipt.block_number,
            });
        }

        Ok(Confirmation {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }
}

/// Submit the primary transaction of a task.
pub(crate) async fn submit_primary<B: ChainBackend>(
    backend: &B,
    request: &ChainTransactionRequest,
) -> Result<TxHash, TaskError> {
    let tx_hash = backend
        .submit(request)
        .await
        .map_err(|e| TaskError::SubmissionRejected {
            method: request.method.to_string(),
            cause: e.to_string(),
        })?;

    counter!("zklink_ops_transactions_submitted_total", "method" => request.method).increment(1);
    info!(
        %tx_hash,
        method = request.method,
        contract = %request.contract,
        from = %request.signer,
        value = %request.value,
        "Transaction submitted"
    );

    Ok(tx_hash)
}

/// Wait for the primary transaction. A failed confirmation is never retried.
pub(crate) async fn confirm_primary<B: ChainBackend>(
    backend: &B,
    tx_hash: TxHash,
) -> Result<Confirmation, TaskError> {
    match backend.confirm(tx_hash).await {
        Ok(confirmation) => {
            info!(
                %tx_hash,
                block_number = confirmation.block_number,
                gas_used = confirmation.gas_used,
                "Transaction confirmed"
            );
            Ok(confirmation)
        }
        Err(e) => {
            warn!(%tx_hash, error = %e, "Transaction failed");
            Err(TaskError::TransactionFailed {
                hash: tx_hash,
                cause: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use binding::zklink::IZkLink;

    #[test]
    fn test_request_from_call() {
        let call = IZkLink::syncL2RequestsCall {
            _newTotalSyncedPriorityTxs: U256::from(100),
        };
        let request = ChainTransactionRequest::new(
            address!("ab3DDC6D62FA7E1e7Ab7bBc70e8D8bB4101c6F2d"),
            address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1"),
            &call,
            U256::ZERO,
        );

        assert_eq!(request.method, "syncL2Requests(uint256)");
        assert_eq!(&request.calldata[..4], IZkLink::syncL2RequestsCall::SELECTOR);

        let tx = request.to_transaction_request();
        assert_eq!(tx.from, Some(request.signer));
        assert_eq!(tx.value, Some(U256::ZERO));
        assert_eq!(tx.input.input(), Some(&request.calldata));
    }
}
