//! # Node Configuration
//!
//! Defaults, then an optional TOML file, then environment variables.
//!
//! ```toml
//! network = "regtest"
//! checkpoints = true
//!
//! [consensus]
//! check_pow = true
//! max_invalid_cache = 1024
//!
//! [telemetry]
//! log_level = "info,cobalt_consensus=debug"
//!
//! [mining]
//! blocks_on_start = 10
//! payout_script = "51"
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `COBALT_CONFIG` | Path of the TOML file |
//! | `COBALT_NETWORK` | `network` |
//! | `COBALT_CHECKPOINTS` | `checkpoints` |
//! | `COBALT_CHECK_POW` | `consensus.check_pow` |
//! | `COBALT_MINE_BLOCKS` | `mining.blocks_on_start` |
//!
//! Telemetry variables are documented in `cobalt-telemetry`.

use cobalt_consensus::{Network, ServiceConfig};
use cobalt_telemetry::TelemetryConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Network whose parameters and genesis block are used.
    pub network: Network,
    /// Whether hard-coded checkpoints are enforced.
    pub checkpoints: bool,
    /// Consensus engine tunables.
    pub consensus: ServiceConfig,
    /// Log output.
    pub telemetry: TelemetryConfig,
    /// Block production.
    pub mining: MiningConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: Network::Regtest,
            checkpoints: true,
            consensus: ServiceConfig::default(),
            telemetry: TelemetryConfig::default(),
            mining: MiningConfig::default(),
        }
    }
}

/// Mining configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Blocks to mine on top of genesis when the node starts. Regtest only.
    pub blocks_on_start: u64,
    /// Hex-encoded script the coinbase output pays to.
    pub payout_script: String,
    /// Bytes appended to the coinbase height push.
    pub coinbase_tag: String,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            blocks_on_start: 0,
            payout_script: "51".to_string(), // OP_TRUE
            coinbase_tag: "/cobalt/".to_string(),
        }
    }
}

impl MiningConfig {
    /// Decoded payout script.
    pub fn payout_script_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        hex::decode(&self.payout_script).map_err(|e| ConfigError::Invalid {
            field: "mining.payout_script",
            reason: e.to_string(),
        })
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl NodeConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    /// Apply overrides looked up through `var`.
    ///
    /// Takes the lookup as a function so tests need not touch the process
    /// environment.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var("COBALT_NETWORK") {
            self.network = value.parse().map_err(|_| ConfigError::Env {
                var: "COBALT_NETWORK",
                value,
            })?;
        }
        if let Some(value) = var("COBALT_CHECKPOINTS") {
            self.checkpoints = parse_bool("COBALT_CHECKPOINTS", value)?;
        }
        if let Some(value) = var("COBALT_CHECK_POW") {
            self.consensus.check_pow = parse_bool("COBALT_CHECK_POW", value)?;
        }
        if let Some(value) = var("COBALT_MINE_BLOCKS") {
            self.mining.blocks_on_start = value.parse().map_err(|_| ConfigError::Env {
                var: "COBALT_MINE_BLOCKS",
                value,
            })?;
        }
        Ok(())
    }

    /// Reject combinations the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mining.blocks_on_start > 0 && self.network != Network::Regtest {
            return Err(ConfigError::Invalid {
                field: "mining.blocks_on_start",
                reason: format!("mining is only supported on regtest, not {}", self.network),
            });
        }
        self.mining.payout_script_bytes()?;
        Ok(())
    }
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env { var, value }),
    }
}

/// Load configuration from the file named by `COBALT_CONFIG` (if any) and
/// the process environment.
pub fn load_config() -> Result<NodeConfig, ConfigError> {
    let mut config = match std::env::var_os("COBALT_CONFIG") {
        Some(path) => NodeConfig::from_file(Path::new(&path))?,
        None => NodeConfig::default(),
    };
    config.apply_overrides(|name| std::env::var(name).ok())?;
    config.telemetry = config.telemetry.with_env_overrides();
    config.validate()?;
    Ok(config)
}
