use alloy_primitives::Address;
use config::{NetworkConfig, NetworkConfigBuilder, NetworkType};
use deploy_log::DeployLogResolver;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use task::{CheckpointStore, ExecutionContext, TaskSettings};

/// Top-level zklink-ops configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Rollup contract preset
    pub network: NetworkType,

    /// L1 RPC endpoint url
    pub l1_rpc_url: String,

    /// Optimism RPC endpoint url, needed by sync-l2-requests only
    #[serde(default)]
    pub optimism_rpc_url: Option<String>,

    /// Network names as they appear in deploy log file names
    #[serde(default)]
    pub names: NetworkNames,

    /// Directory holding the `<prefix>_<network>.log` deploy logs
    #[serde(default = "default_deploy_log_dir")]
    pub deploy_log_dir: PathBuf,

    /// Directory for relay checkpoints
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,

    /// Seconds between bridge status polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Give up waiting on a bridge status after this many seconds
    #[serde(default)]
    pub status_timeout_secs: Option<u64>,

    /// Give up waiting on a transaction receipt after this many seconds,
    /// the transaction then counts as dropped
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    /// Serve Prometheus metrics on this port
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Rollup contracts replacing the preset ones, for devnets and forks
    #[serde(default)]
    pub overrides: ContractOverrides,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkNames {
    pub ethereum: String,
    pub optimism: String,
    pub scroll: String,
}

impl Default for NetworkNames {
    fn default() -> Self {
        Self {
            ethereum: "ETHEREUM".to_string(),
            optimism: "OPTIMISM".to_string(),
            scroll: "SCROLL".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractOverrides {
    pub optimism_portal: Option<Address>,
    pub optimism_dispute_game_factory: Option<Address>,
    pub scroll_message_queue: Option<Address>,
}

fn default_deploy_log_dir() -> PathBuf {
    PathBuf::from("log")
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from(".checkpoints")
}

const fn default_poll_interval_secs() -> u64 {
    60
}

const fn default_confirmation_timeout_secs() -> u64 {
    600
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("reading config {}: {}", path.display(), e))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> eyre::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        if config.poll_interval_secs == 0 {
            eyre::bail!("poll_interval_secs must be positive");
        }
        if config.confirmation_timeout_secs == 0 {
            eyre::bail!("confirmation_timeout_secs must be positive");
        }

        Ok(config)
    }

    /// Preset rollup contracts with the configured overrides applied.
    pub fn network_config(&self) -> NetworkConfig {
        let mut builder = NetworkConfigBuilder::new(self.network);
        if let Some(portal) = self.overrides.optimism_portal {
            builder = builder.optimism_portal(portal);
        }
        if let Some(factory) = self.overrides.optimism_dispute_game_factory {
            builder = builder.optimism_dispute_game_factory(factory);
        }
        if let Some(queue) = self.overrides.scroll_message_queue {
            builder = builder.scroll_message_queue(queue);
        }
        builder.build()
    }

    pub const fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    /// Context for a task whose L2 is `l2_network`.
    pub fn execution_context(&self, l2_network: &str) -> ExecutionContext {
        let settings = TaskSettings {
            l1_network: self.names.ethereum.clone(),
            l2_network: l2_network.to_string(),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            status_timeout: self.status_timeout_secs.map(Duration::from_secs),
        };

        ExecutionContext::new(DeployLogResolver::new(&self.deploy_log_dir), settings)
            .with_checkpoints(CheckpointStore::new(&self.checkpoint_dir))
    }
}
