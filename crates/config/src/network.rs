//! Network presets for the chains the operations tasks talk to.
//!
//! zkLink contract addresses are never hardcoded here: they come from the
//! deployment logs. This module only carries the third-party rollup contracts
//! (OP Stack portal and dispute games, Scroll message queue).

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Network type (mainnet or testnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
}

/// OP Stack rollup settled on Ethereum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimismConfig {
    /// L2 chain ID
    pub chain_id: u64,
    /// OptimismPortal2 proxy on L1
    pub l1_portal: Address,
    /// DisputeGameFactory proxy on L1
    pub l1_dispute_game_factory: Address,
}

impl OptimismConfig {
    /// OP Mainnet.
    pub const fn mainnet() -> Self {
        Self {
            chain_id: 10,
            // https://etherscan.io/address/0xbEb5Fc579115071764c7423A4f12eDde41f106Ed
            l1_portal: address!("0xbEb5Fc579115071764c7423A4f12eDde41f106Ed"),
            l1_dispute_game_factory: address!("0xe5965Ab5962eDc7477C8520243A95517CD252fA9"),
        }
    }

    /// OP Sepolia.
    pub const fn sepolia() -> Self {
        Self {
            chain_id: 11155420,
            // https://sepolia.etherscan.io/address/0x16Fc5058F25648194471939df75CF27A2fdC48BC
            l1_portal: address!("0x16Fc5058F25648194471939df75CF27A2fdC48BC"),
            l1_dispute_game_factory: address!("0x05F9613aDB30026FFd634f38e5C4dFd30a197Fa1"),
        }
    }
}

/// Scroll rollup settled on Ethereum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// L2 chain ID
    pub chain_id: u64,
    /// L1MessageQueue proxy on L1, prices L1→L2 messages
    pub l1_message_queue: Address,
}

impl ScrollConfig {
    /// Scroll mainnet.
    pub const fn mainnet() -> Self {
        Self {
            chain_id: 534352,
            l1_message_queue: address!("0x0d7E906BD9cAFa154b048cFa766Cc1E54E39AF9B"),
        }
    }

    /// Scroll Sepolia.
    pub const fn sepolia() -> Self {
        Self {
            chain_id: 534351,
            l1_message_queue: address!("0xF0B2293F5D834eAe920c6974D50957A1732de763"),
        }
    }
}

/// Rollup contracts for one environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network type (mainnet or testnet)
    pub network_type: NetworkType,
    pub optimism: OptimismConfig,
    pub scroll: ScrollConfig,
}

impl NetworkConfig {
    pub const fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            optimism: OptimismConfig::mainnet(),
            scroll: ScrollConfig::mainnet(),
        }
    }

    pub const fn sepolia() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            optimism: OptimismConfig::sepolia(),
            scroll: ScrollConfig::sepolia(),
        }
    }

    /// Create configuration from network type.
    pub const fn from_network_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::sepolia(),
        }
    }
}

/// Builder for local devnets or forks with redeployed rollup contracts.
#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    config: NetworkConfig,
}

impl NetworkConfigBuilder {
    pub const fn new(network_type: NetworkType) -> Self {
        Self {
            config: NetworkConfig::from_network_type(network_type),
        }
    }

    pub const fn optimism_portal(mut self, address: Address) -> Self {
        self.config.optimism.l1_portal = address;
        self
    }

    pub const fn optimism_dispute_game_factory(mut self, address: Address) -> Self {
        self.config.optimism.l1_dispute_game_factory = address;
        self
    }

    pub const fn scroll_message_queue(mut self, address: Address) -> Self {
        self.config.scroll.l1_message_queue = address;
        self
    }

    pub const fn build(self) -> NetworkConfig {
        self.config
    }
}
