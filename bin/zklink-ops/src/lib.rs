//! Wiring between the CLI, the configuration and the `task` crate.

pub mod config;
pub mod metrics;

use crate::{config::Config, metrics::Metrics};
use alloy_provider::Provider;
use client::ClientError;
use std::time::Instant;
use task::{
    params, sync, validator, ChainTask, ExecutionContext, ProviderBackend, SetValidatorTask,
    SyncL2RequestsTask, TaskArgs, TaskError, TaskOutcome, TASKS,
};
use thiserror::Error;
use tracing::{error, info, warn};
use withdrawal::OpStackOracle;

/// Exit code of an invocation stopped by Ctrl-C.
pub const EXIT_INTERRUPTED: u8 = 130;

/// The invocation was cancelled before the task finished.
#[derive(Error, Debug)]
#[error("interrupted")]
pub struct Interrupted;

/// Process exit code for an error returned by [`run_sync_l2_requests`] or
/// [`run_set_validator`].
pub fn exit_code(report: &eyre::Report) -> u8 {
    for cause in report.chain() {
        if cause.is::<Interrupted>() {
            return EXIT_INTERRUPTED;
        }
        if let Some(err) = cause.downcast_ref::<TaskError>() {
            return err.exit_code();
        }
        if cause.is::<ClientError>() {
            return 2;
        }
    }
    1
}

/// Parse a `name=value` task parameter.
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in `{raw}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Collect parsed parameters, rejecting a name given twice.
pub fn task_args(params: Vec<(String, String)>) -> Result<TaskArgs, TaskError> {
    let mut args = TaskArgs::new();
    for (name, value) in params {
        if args.contains_key(&name) {
            return Err(TaskError::InvalidParameter {
                name,
                reason: "given more than once".to_string(),
            });
        }
        args.insert(name, value);
    }
    Ok(args)
}

/// Human readable list of the available tasks and their parameters.
pub fn describe_tasks() -> String {
    let mut out = String::new();
    for spec in TASKS {
        out.push_str(&format!("{}\n    {}\n", spec.name, spec.description));
        for param in spec.parameters {
            out.push_str(&format!("    --param {param}\n"));
        }
    }
    out
}

/// Send a sync point from Optimism and relay it to L1.
pub async fn run_sync_l2_requests(
    config: &Config,
    private_key: &str,
    args: &TaskArgs,
) -> eyre::Result<TaskOutcome> {
    // Input errors surface before any RPC is contacted.
    params::validate(sync::PARAMETERS, args)?;
    let network = config.network_config();
    let signer = client::parse_private_key(private_key)?;
    let sender = signer.address();

    let l2_rpc_url = config
        .optimism_rpc_url
        .as_deref()
        .ok_or_else(|| eyre::eyre!("optimism_rpc_url is required by sync-l2-requests"))?;
    let l1_provider = client::create_provider(&config.l1_rpc_url)?;
    let l2_provider = client::create_provider(l2_rpc_url)?;
    check_chain_id(&l2_provider, &config.names.optimism, network.optimism.chain_id).await;

    let l2_backend = ProviderBackend::new(
        l2_provider.clone(),
        client::local_signer_fn(signer.clone(), l2_provider.clone()),
        sender,
    )
    .with_confirmation_timeout(Some(config.confirmation_timeout()));
    let l1_backend = ProviderBackend::new(
        l1_provider.clone(),
        client::local_signer_fn(signer, l1_provider.clone()),
        sender,
    )
    .with_confirmation_timeout(Some(config.confirmation_timeout()));

    let oracle = OpStackOracle::new(
        l1_provider,
        l2_provider,
        l1_backend,
        network.optimism.l1_portal,
        network.optimism.l1_dispute_game_factory,
    );
    let task = SyncL2RequestsTask::new(l2_backend, oracle);

    run_task(&task, args, &config.execution_context(&config.names.optimism)).await
}

/// Update a validator through the Arbitrator, forwarded to Scroll.
pub async fn run_set_validator(
    config: &Config,
    private_key: &str,
    args: &TaskArgs,
) -> eyre::Result<TaskOutcome> {
    params::validate(validator::PARAMETERS, args)?;
    let network = config.network_config();
    let signer = client::parse_private_key(private_key)?;
    let sender = signer.address();

    let l1_provider = client::create_provider(&config.l1_rpc_url)?;
    let l1_backend = ProviderBackend::new(
        l1_provider.clone(),
        client::local_signer_fn(signer, l1_provider),
        sender,
    )
    .with_confirmation_timeout(Some(config.confirmation_timeout()));
    let task = SetValidatorTask::new(l1_backend, network.scroll.l1_message_queue);

    run_task(&task, args, &config.execution_context(&config.names.scroll)).await
}

async fn run_task<T: ChainTask>(
    task: &T,
    args: &TaskArgs,
    ctx: &ExecutionContext,
) -> eyre::Result<TaskOutcome> {
    let name = task.spec().name;
    let metrics = Metrics::new();
    metrics.record_task_started(name);
    info!(
        task = name,
        l1_network = %ctx.settings.l1_network,
        l2_network = %ctx.settings.l2_network,
        ?args,
        "Running task"
    );

    let started = Instant::now();
    match task.run(args, ctx).await {
        Ok(outcome) => {
            metrics.record_task_succeeded(name, started.elapsed());
            info!(task = name, tx_hash = %outcome.tx_hash, "Task completed");
            Ok(outcome)
        }
        Err(err) => {
            metrics.record_task_failed(name, err.kind(), started.elapsed());
            error!(
                task = name,
                kind = err.kind(),
                tx_hash = ?err.tx_hash(),
                error = %err,
                "Task failed"
            );
            Err(err.into())
        }
    }
}

/// Warn when an RPC endpoint serves another chain than the preset expects.
async fn check_chain_id<P: Provider>(provider: &P, network: &str, expected: u64) {
    match provider.get_chain_id().await {
        Ok(chain_id) if chain_id != expected => {
            warn!(network, chain_id, expected, "RPC chain id differs from the preset");
        }
        Ok(_) => {}
        Err(e) => warn!(network, error = %e, "Could not read chain id"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("txs=250").unwrap(),
            ("txs".to_string(), "250".to_string())
        );
        assert_eq!(
            parse_param(" active = false ").unwrap(),
            ("active".to_string(), "false".to_string())
        );
        assert!(parse_param("txs").is_err());
        assert!(parse_param("=1").is_err());
    }

    #[test]
    fn test_task_args_rejects_duplicates() {
        let err = task_args(vec![
            ("txs".to_string(), "1".to_string()),
            ("txs".to_string(), "2".to_string()),
        ])
        .unwrap_err();

        assert!(matches!(err, TaskError::InvalidParameter { ref name, .. } if name == "txs"));
    }

    #[test]
    fn test_describe_tasks_lists_parameters() {
        let listing = describe_tasks();
        assert!(listing.contains("sync-l2-requests"));
        assert!(listing.contains("set-validator"));
        assert!(listing.contains("--param validator <string> [required]"));
        assert!(listing.contains("--param txs <int> [default: 100]"));
    }
}
