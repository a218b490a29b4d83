//! Operations tasks for the zkLink bridge.
//!
//! A task is a named, parameterized operation bound to a [`ChainBackend`].
//! Running one validates its parameters, resolves the deployment addresses it
//! needs, submits exactly one primary transaction and, for tasks that send an
//! L2→L1 message, follows the message through a [`BridgeOracle`] until it is
//! relayed on L1.
//!
//! Nothing is retried: every failure ends the invocation with a [`TaskError`]
//! carrying enough context to rerun it by hand.

pub mod bridge;
pub mod chain;
pub mod checkpoint;
pub mod context;
pub mod error;
pub mod params;
pub mod sync;
pub mod validator;
pub mod watcher;

pub use bridge::{BridgeOracle, MessageReceipt, MessageStatus, OracleError};
pub use chain::{BackendError, ChainBackend, ChainTransactionRequest, Confirmation, ProviderBackend};
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
pub use context::{ExecutionContext, TaskSettings};
pub use error::TaskError;
pub use params::{ParamType, ParamValue, ResolvedParams, TaskArgs, TaskParameter};
pub use sync::SyncL2RequestsTask;
pub use validator::SetValidatorTask;

use alloy_primitives::TxHash;
use serde::Serialize;
use std::future::Future;

/// Static description of a task, available without building one.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [TaskParameter],
}

/// Every task this crate provides.
pub const TASKS: &[TaskSpec] = &[sync::SPEC, validator::SPEC];

/// A runnable task.
pub trait ChainTask: Send + Sync {
    fn spec(&self) -> &'static TaskSpec;

    /// Run the task once.
    fn run(
        &self,
        args: &TaskArgs,
        ctx: &ExecutionContext,
    ) -> impl Future<Output = Result<TaskOutcome, TaskError>> + Send;
}

/// Result of a completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    pub task: &'static str,
    pub network: String,
    /// Primary transaction
    pub tx_hash: TxHash,
    /// Block of the primary transaction, unknown when resumed
    pub block_number: Option<u64>,
    /// Prove transaction sent by this invocation
    pub prove_tx: Option<TxHash>,
    /// Finalize transaction sent by this invocation
    pub relay_tx: Option<TxHash>,
    /// Final state of the bridge message, for tasks that follow one
    pub message: Option<MessageReceipt>,
}

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::{
        bridge::{BridgeOracle, MessageReceipt, MessageStatus, OracleError},
        chain::{BackendError, ChainBackend, ChainTransactionRequest, Confirmation},
    };
    use alloy_primitives::{Address, Bytes, TxHash, B256};
    use std::{
        collections::VecDeque,
        path::Path,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    pub const PROVE_TX: TxHash = TxHash::repeat_byte(0xee);
    pub const RELAY_TX: TxHash = TxHash::repeat_byte(0xff);

    /// Backend recording every call instead of talking to a node.
    pub struct SpyBackend {
        sender: Address,
        tx_hash: TxHash,
        call_result: Bytes,
        revert: bool,
        drop_tx: bool,
        submissions: Mutex<Vec<ChainTransactionRequest>>,
        calls: Mutex<Vec<(Address, Bytes)>>,
    }

    impl SpyBackend {
        pub fn new(tx_hash: TxHash) -> Self {
            Self {
                sender: Address::repeat_byte(0x5c),
                tx_hash,
                call_result: Bytes::new(),
                revert: false,
                drop_tx: false,
                submissions: Mutex::default(),
                calls: Mutex::default(),
            }
        }

        pub fn reverting(mut self) -> Self {
            self.revert = true;
            self
        }

        /// Never mined: confirmation gives up as after a receipt timeout.
        pub fn dropping(mut self) -> Self {
            self.drop_tx = true;
            self
        }

        pub fn with_call_result(mut self, result: impl Into<Bytes>) -> Self {
            self.call_result = result.into();
            self
        }

        pub fn submissions(&self) -> Vec<ChainTransactionRequest> {
            self.submissions.lock().unwrap().clone()
        }

        pub fn calls(&self) -> Vec<(Address, Bytes)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ChainBackend for SpyBackend {
        fn sender(&self) -> Address {
            self.sender
        }

        async fn call(&self, contract: Address, calldata: Bytes) -> Result<Bytes, BackendError> {
            self.calls.lock().unwrap().push((contract, calldata));
            Ok(self.call_result.clone())
        }

        async fn submit(&self, request: &ChainTransactionRequest) -> Result<TxHash, BackendError> {
            self.submissions.lock().unwrap().push(request.clone());
            Ok(self.tx_hash)
        }

        async fn confirm(&self, tx_hash: TxHash) -> Result<Confirmation, BackendError> {
            if self.drop_tx {
                return Err(BackendError::Dropped(format!(
                    "no receipt for {tx_hash} before timeout"
                )));
            }
            if self.revert {
                return Err(BackendError::Reverted {
                    block_number: Some(1),
                });
            }
            Ok(Confirmation {
                tx_hash,
                block_number: Some(1),
                gas_used: 21_000,
            })
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum OracleEvent {
        Prove { at: MessageStatus },
        Finalize { at: MessageStatus },
    }

    /// Oracle replaying a fixed sequence of statuses, one per poll.
    ///
    /// Once the script runs out the last status repeats.
    pub struct ScriptedOracle {
        script: Mutex<VecDeque<MessageStatus>>,
        current: Mutex<MessageStatus>,
        polls: AtomicUsize,
        events: Mutex<Vec<OracleEvent>>,
    }

    impl ScriptedOracle {
        pub fn new(script: impl IntoIterator<Item = MessageStatus>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                current: Mutex::new(MessageStatus::Sent),
                polls: AtomicUsize::new(0),
                events: Mutex::default(),
            }
        }

        pub fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }

        pub fn events(&self) -> Vec<OracleEvent> {
            self.events.lock().unwrap().clone()
        }

        fn current(&self) -> MessageStatus {
            *self.current.lock().unwrap()
        }
    }

    impl BridgeOracle for ScriptedOracle {
        async fn status(&self, _tx_hash: TxHash) -> Result<MessageStatus, OracleError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let mut current = self.current.lock().unwrap();
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                *current = next;
            }
            Ok(*current)
        }

        async fn prove(&self, _tx_hash: TxHash) -> Result<TxHash, OracleError> {
            let at = self.current();
            self.events.lock().unwrap().push(OracleEvent::Prove { at });
            Ok(PROVE_TX)
        }

        async fn finalize(&self, _tx_hash: TxHash) -> Result<TxHash, OracleError> {
            let at = self.current();
            self.events.lock().unwrap().push(OracleEvent::Finalize { at });
            Ok(RELAY_TX)
        }

        async fn message(&self, tx_hash: TxHash) -> Result<MessageReceipt, OracleError> {
            Ok(MessageReceipt {
                transaction_hash: tx_hash,
                message_hash: B256::repeat_byte(0x11),
                status: self.current(),
            })
        }
    }

    pub fn write_log(dir: &Path, prefix: &str, network: &str, entries: &[(&str, Address)]) {
        let body = entries
            .iter()
            .map(|(name, address)| format!("\"{name}\":\"{address}\""))
            .collect::<Vec<_>>()
            .join(",");
        std::fs::write(dir.join(format!("{prefix}_{network}.log")), format!("{{{body}}}")).unwrap();
    }
}
