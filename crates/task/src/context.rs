use crate::{checkpoint::CheckpointStore, TaskError};
use alloy_primitives::Address;
use deploy_log::DeployLogResolver;
use std::time::Duration;

/// Settings fixed at process start.
#[derive(Debug, Clone)]
pub struct TaskSettings {
    /// Deploy log network name of the L1, e.g. `ETHEREUM`
    pub l1_network: String,
    /// Deploy log network name of the L2 the task targets, e.g. `OPTIMISM`
    pub l2_network: String,
    /// Delay between two bridge status polls
    pub poll_interval: Duration,
    /// Upper bound for a single status wait, unbounded when `None`
    pub status_timeout: Option<Duration>,
}

/// Everything a task invocation reads besides its parameters.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub resolver: DeployLogResolver,
    pub checkpoints: Option<CheckpointStore>,
    pub settings: TaskSettings,
}

impl ExecutionContext {
    pub const fn new(resolver: DeployLogResolver, settings: TaskSettings) -> Self {
        Self {
            resolver,
            checkpoints: None,
            settings,
        }
    }

    pub fn with_checkpoints(mut self, store: CheckpointStore) -> Self {
        self.checkpoints = Some(store);
        self
    }

    /// Resolve a deployed address, absence aborts the task.
    pub fn require_address(
        &self,
        log_prefix: &str,
        entry_name: &str,
        network: &str,
    ) -> Result<Address, TaskError> {
        self.resolver
            .resolve(log_prefix, entry_name, network)?
            .ok_or_else(|| TaskError::UnresolvedDeploymentAddress {
                artifact: format!("{log_prefix}.{entry_name}"),
                network: network.to_string(),
            })
    }
}
