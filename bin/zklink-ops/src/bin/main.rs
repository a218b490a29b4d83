use clap::{Parser, Subcommand};
use std::{future::Future, process::ExitCode};
use tracing::{error, info};
use zklink_ops::{
    config::Config, describe_tasks, exit_code, metrics::install_prometheus_exporter, parse_param,
    run_set_validator, run_sync_l2_requests, task_args, Interrupted,
};

#[derive(Parser)]
#[command(name = "zklink-ops")]
#[command(about = "Operations tasks for the zkLink bridge")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tasks and their parameters
    List,

    /// Send a sync point from Optimism and relay it to L1
    SyncL2Requests(TaskCommand),

    /// Set a validator through the Arbitrator, forwarded to Scroll
    SetValidator(TaskCommand),
}

#[derive(clap::Args)]
struct TaskCommand {
    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    /// Task parameter as name=value, repeatable
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            error!("{report:#}");
            ExitCode::from(exit_code(&report))
        }
    }
}

async fn run(cli: Cli) -> eyre::Result<()> {
    let outcome = match cli.command {
        Command::List => {
            print!("{}", describe_tasks());
            return Ok(());
        }
        Command::SyncL2Requests(command) => {
            let config = load_config(&cli.config)?;
            let args = task_args(command.params)?;
            interruptible(run_sync_l2_requests(&config, &command.private_key, &args)).await?
        }
        Command::SetValidator(command) => {
            let config = load_config(&cli.config)?;
            let args = task_args(command.params)?;
            interruptible(run_set_validator(&config, &command.private_key, &args)).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn load_config(path: &str) -> eyre::Result<Config> {
    let config = Config::from_file(path)?;
    info!(
        config = path,
        network = ?config.network,
        deploy_log_dir = %config.deploy_log_dir.display(),
        checkpoint_dir = %config.checkpoint_dir.display(),
        "Loaded config"
    );

    if let Some(port) = config.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Prometheus exporter listening");
    }

    Ok(config)
}

/// Race `invocation` against Ctrl-C. Whatever was checkpointed stays on disk.
async fn interruptible<T>(invocation: impl Future<Output = eyre::Result<T>>) -> eyre::Result<T> {
    tokio::select! {
        result = invocation => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Err(Interrupted.into())
        }
    }
}
