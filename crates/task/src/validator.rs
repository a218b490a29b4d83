//! Validator registration on a Scroll-connected zkLink deployment.
//!
//! The Arbitrator on L1 owns validator sets. `setValidator` is forwarded to
//! the L2 through the chain's L1 gateway, which pays Scroll's L1→L2 message
//! fee out of the attached value. Delivery on L2 is up to the Scroll relayer,
//! the task ends once the L1 transaction is mined.

use crate::{
    chain::{confirm_primary, submit_primary, ChainBackend, ChainTransactionRequest},
    params::{self, ParamType, TaskArgs, TaskParameter},
    ChainTask, ExecutionContext, TaskError, TaskOutcome, TaskSpec,
};
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use binding::{scroll::IL1MessageQueue, zklink::IArbitrator};
use tracing::info;

pub const NAME: &str = "set-validator";

pub const ARBITRATOR_LOG_PREFIX: &str = "deploy_arbitrator";
pub const ARBITRATOR_ENTRY: &str = "arbitrator";
/// Per-L2 log of the L1 gateways, suffixed with the L2 network name.
pub const L1_GATEWAY_LOG_PREFIX: &str = "deploy_l1_gateway";
pub const GATEWAY_ENTRY: &str = "gateway";

pub const PARAMETERS: &[TaskParameter] = &[
    TaskParameter {
        name: "validator",
        description: "Validator address",
        kind: ParamType::String,
        default: None,
        optional: false,
    },
    TaskParameter {
        name: "active",
        description: "Whether the validator is active",
        kind: ParamType::Bool,
        default: Some("true"),
        optional: true,
    },
    TaskParameter {
        name: "l2GasLimit",
        description: "Gas limit for executing the forwarded message on L2",
        kind: ParamType::Int,
        default: Some("1000000"),
        optional: true,
    },
];

pub const SPEC: TaskSpec = TaskSpec {
    name: NAME,
    description: "Set a validator through the Arbitrator, forwarded to Scroll",
    parameters: PARAMETERS,
};

/// Sends `setValidator` with `backend` (bound to L1).
pub struct SetValidatorTask<B> {
    backend: B,
    message_queue: Address,
}

impl<B: ChainBackend> SetValidatorTask<B> {
    /// `message_queue` is Scroll's L1MessageQueue, used to price the message.
    pub const fn new(backend: B, message_queue: Address) -> Self {
        Self {
            backend,
            message_queue,
        }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    async fn estimate_fee(&self, l2_gas_limit: u64) -> Result<U256, TaskError> {
        let unavailable = |cause: String| TaskError::ExternalServiceUnavailable {
            service: "scroll message queue".to_string(),
            cause,
        };

        let call = IL1MessageQueue::estimateCrossDomainMessageFeeCall {
            _gasLimit: U256::from(l2_gas_limit),
        };
        let output = self
            .backend
            .call(self.message_queue, call.abi_encode().into())
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        IL1MessageQueue::estimateCrossDomainMessageFeeCall::abi_decode_returns(&output)
            .map_err(|e| unavailable(e.to_string()))
    }
}

impl<B: ChainBackend> ChainTask for SetValidatorTask<B> {
    fn spec(&self) -> &'static TaskSpec {
        &SPEC
    }

    async fn run(&self, args: &TaskArgs, ctx: &ExecutionContext) -> Result<TaskOutcome, TaskError> {
        let params = params::validate(PARAMETERS, args)?;
        let validator = params
            .address("validator")?
            .ok_or_else(|| TaskError::MissingRequiredParameter {
                name: "validator".to_string(),
            })?;
        let active = params.require_bool("active")?;
        let l2_gas_limit = params.require_int("l2GasLimit")?;

        let l1_network = &ctx.settings.l1_network;
        let l2_network = &ctx.settings.l2_network;
        let arbitrator =
            ctx.require_address(ARBITRATOR_LOG_PREFIX, ARBITRATOR_ENTRY, l1_network)?;
        let gateway = ctx.require_address(
            &format!("{L1_GATEWAY_LOG_PREFIX}_{l2_network}"),
            GATEWAY_ENTRY,
            l1_network,
        )?;

        let fee = self.estimate_fee(l2_gas_limit).await?;
        info!(
            %arbitrator,
            %gateway,
            %validator,
            active,
            l2_gas_limit,
            %fee,
            "Setting validator"
        );

        let call = IArbitrator::setValidatorCall {
            _chainL1Gateway: gateway,
            _validator: validator,
            _active: active,
            _adapterParams: U256::from(l2_gas_limit).abi_encode().into(),
        };
        let request = ChainTransactionRequest::new(arbitrator, self.backend.sender(), &call, fee);

        let tx_hash = submit_primary(&self.backend, &request).await?;
        let confirmation = confirm_primary(&self.backend, tx_hash).await?;

        info!(%tx_hash, %l2_network, "Validator update sent, L2 delivery is left to the relayer");

        Ok(TaskOutcome {
            task: NAME,
            network: l1_network.clone(),
            tx_hash,
            block_number: confirmation.block_number,
            prove_tx: None,
            relay_tx: None,
            message: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{write_log, SpyBackend},
        TaskSettings,
    };
    use alloy_primitives::{address, TxHash};
    use deploy_log::DeployLogResolver;
    use std::{path::Path, time::Duration};

    const ARBITRATOR: Address = address!("1fA5d4A1A0A4fC34ED8fDd4f3C8D8aB2E1dA2b11");
    const GATEWAY: Address = address!("0C2e1d5AB1C5a3d2B2a4e0b0b7e5Ae4c4a2A5e22");
    const MESSAGE_QUEUE: Address = address!("0d7E906BD9cAFa154b048cFa766Cc1E54E39AF9B");
    const VALIDATOR: &str = "0x5CFFA347b0aE99cc01E5c01714cA5658e54a23D1";
    const TX_HASH: TxHash = TxHash::repeat_byte(0xab);

    fn context(log_dir: &Path) -> ExecutionContext {
        ExecutionContext::new(
            DeployLogResolver::new(log_dir),
            TaskSettings {
                l1_network: "ETHEREUM".to_string(),
                l2_network: "SCROLL".to_string(),
                poll_interval: Duration::from_millis(1),
                status_timeout: None,
            },
        )
    }

    fn deployed(dir: &Path) {
        write_log(dir, ARBITRATOR_LOG_PREFIX, "ETHEREUM", &[(ARBITRATOR_ENTRY, ARBITRATOR)]);
        write_log(dir, "deploy_l1_gateway_SCROLL", "ETHEREUM", &[(GATEWAY_ENTRY, GATEWAY)]);
    }

    fn args(pairs: &[(&str, &str)]) -> TaskArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn backend_with_fee(fee: u64) -> SpyBackend {
        SpyBackend::new(TX_HASH).with_call_result(U256::from(fee).abi_encode())
    }

    #[tokio::test]
    async fn test_set_validator_through_arbitrator() {
        let logs = tempfile::tempdir().unwrap();
        deployed(logs.path());
        let task = SetValidatorTask::new(backend_with_fee(12_345), MESSAGE_QUEUE);

        let outcome = task
            .run(&args(&[("validator", VALIDATOR)]), &context(logs.path()))
            .await
            .unwrap();

        let calls = task.backend().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, MESSAGE_QUEUE);
        let fee_call =
            IL1MessageQueue::estimateCrossDomainMessageFeeCall::abi_decode(&calls[0].1).unwrap();
        assert_eq!(fee_call._gasLimit, U256::from(1_000_000));

        let submissions = task.backend().submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].contract, ARBITRATOR);
        assert_eq!(submissions[0].value, U256::from(12_345));
        assert_eq!(
            submissions[0].method,
            "setValidator(address,address,bool,bytes)"
        );

        let call = IArbitrator::setValidatorCall::abi_decode(&submissions[0].calldata).unwrap();
        assert_eq!(call._chainL1Gateway, GATEWAY);
        assert_eq!(call._validator, VALIDATOR.parse::<Address>().unwrap());
        assert!(call._active);
        assert_eq!(
            U256::abi_decode(&call._adapterParams).unwrap(),
            U256::from(1_000_000)
        );

        assert_eq!(outcome.tx_hash, TX_HASH);
        assert_eq!(outcome.network, "ETHEREUM");
        assert_eq!(outcome.message, None);
    }

    #[tokio::test]
    async fn test_deactivate_with_custom_gas_limit() {
        let logs = tempfile::tempdir().unwrap();
        deployed(logs.path());
        let task = SetValidatorTask::new(backend_with_fee(1), MESSAGE_QUEUE);

        task.run(
            &args(&[
                ("validator", VALIDATOR),
                ("active", "false"),
                ("l2GasLimit", "250000"),
            ]),
            &context(logs.path()),
        )
        .await
        .unwrap();

        let call =
            IArbitrator::setValidatorCall::abi_decode(&task.backend().submissions()[0].calldata)
                .unwrap();
        assert!(!call._active);
        assert_eq!(
            U256::abi_decode(&call._adapterParams).unwrap(),
            U256::from(250_000)
        );
    }

    #[tokio::test]
    async fn test_missing_validator_touches_nothing() {
        let logs = tempfile::tempdir().unwrap();
        deployed(logs.path());
        let task = SetValidatorTask::new(backend_with_fee(1), MESSAGE_QUEUE);

        let err = task
            .run(&args(&[("active", "true")]), &context(logs.path()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TaskError::MissingRequiredParameter { ref name } if name == "validator"
        ));
        assert!(task.backend().submissions().is_empty());
        assert!(task.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_validator_address() {
        let logs = tempfile::tempdir().unwrap();
        deployed(logs.path());
        let task = SetValidatorTask::new(backend_with_fee(1), MESSAGE_QUEUE);

        let err = task
            .run(&args(&[("validator", "alice")]), &context(logs.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::InvalidParameter { .. }));
        assert!(task.backend().submissions().is_empty());
    }

    #[tokio::test]
    async fn test_missing_gateway_deployment_sends_nothing() {
        let logs = tempfile::tempdir().unwrap();
        write_log(logs.path(), ARBITRATOR_LOG_PREFIX, "ETHEREUM", &[(ARBITRATOR_ENTRY, ARBITRATOR)]);
        let task = SetValidatorTask::new(backend_with_fee(1), MESSAGE_QUEUE);

        let err = task
            .run(&args(&[("validator", VALIDATOR)]), &context(logs.path()))
            .await
            .unwrap_err();

        match err {
            TaskError::UnresolvedDeploymentAddress { artifact, network } => {
                assert_eq!(artifact, "deploy_l1_gateway_SCROLL.gateway");
                assert_eq!(network, "ETHEREUM");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(task.backend().submissions().is_empty());
        assert!(task.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_arbitrator_deployment_sends_nothing() {
        let logs = tempfile::tempdir().unwrap();
        let task = SetValidatorTask::new(backend_with_fee(1), MESSAGE_QUEUE);

        let err = task
            .run(&args(&[("validator", VALIDATOR)]), &context(logs.path()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TaskError::UnresolvedDeploymentAddress { ref artifact, .. }
                if artifact == "deploy_arbitrator.arbitrator"
        ));
        assert!(task.backend().submissions().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_fee_is_service_error() {
        let logs = tempfile::tempdir().unwrap();
        deployed(logs.path());
        let task = SetValidatorTask::new(SpyBackend::new(TX_HASH), MESSAGE_QUEUE);

        let err = task
            .run(&args(&[("validator", VALIDATOR)]), &context(logs.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::ExternalServiceUnavailable { .. }));
        assert!(task.backend().submissions().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_update_reports_hash() {
        let logs = tempfile::tempdir().unwrap();
        deployed(logs.path());
        let task = SetValidatorTask::new(backend_with_fee(1).dropping(), MESSAGE_QUEUE);

        let err = task
            .run(&args(&[("validator", VALIDATOR)]), &context(logs.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::TransactionFailed { hash, .. } if hash == TX_HASH));
        assert_eq!(task.backend().submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_reverted_update_reports_hash() {
        let logs = tempfile::tempdir().unwrap();
        deployed(logs.path());
        let task = SetValidatorTask::new(backend_with_fee(1).reverting(), MESSAGE_QUEUE);

        let err = task
            .run(&args(&[("validator", VALIDATOR)]), &context(logs.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::TransactionFailed { hash, .. } if hash == TX_HASH));
        assert_eq!(err.exit_code(), 4);
        assert_eq!(task.backend().submissions().len(), 1);
    }
}
