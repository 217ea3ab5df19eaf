//! # Cobalt Node Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! - `config` - TOML and environment configuration
//! - `miner` - Regtest block templates and nonce search
//! - `runtime` - Engine wiring and startup sequence

pub mod config;
pub mod miner;
pub mod runtime;

pub use config::{load_config, ConfigError, MiningConfig, NodeConfig};
pub use miner::{mine_header, BlockTemplate, BlockTemplateBuilder, TemplateError};
pub use runtime::{NodeRuntime, NodeService};
