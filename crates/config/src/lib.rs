//! Configuration types for the zkLink operations tasks.
//!
//! This crate provides:
//! - Rollup contract presets (mainnet, testnet)
//! - A builder for devnet overrides

pub mod network;

pub use network::{
    NetworkConfig, NetworkConfigBuilder, NetworkType, OptimismConfig, ScrollConfig,
};
