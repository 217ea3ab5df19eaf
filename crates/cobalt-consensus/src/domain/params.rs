//! Consensus parameters and live settings
//!
//! [`ConsensusParams`] is fixed per network and compiled in. The only value
//! that may change while the node runs is whether checkpoints are consulted,
//! which lives in [`ConsensusSettings`] and is read on every use.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{
    compact_from_target, Amount, Block, BlockHeader, OutPoint, Transaction, TxIn, TxOut, COIN,
    SEQUENCE_FINAL, ZERO_HASH,
};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Seconds a block timestamp may run ahead of the validating node's clock.
pub const MAX_FUTURE_BLOCK_TIME: u64 = 2 * 60 * 60;

/// Legacy bytes count this many times towards block weight.
pub const WITNESS_SCALE_FACTOR: usize = 4;

/// Halvings after which the subsidy is zero.
const MAX_HALVINGS: u64 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Main,
    Test,
    Regtest,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Main => "main",
            Network::Test => "test",
            Network::Regtest => "regtest",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Ok(Network::Main),
            "test" | "testnet" => Ok(Network::Test),
            "regtest" => Ok(Network::Regtest),
            other => Err(format!("unknown network: {other}")),
        }
    }
}

/// Per-network consensus constants.
#[derive(Debug, Clone)]
pub struct ConsensusParams {
    pub network: Network,
    /// Easiest allowed target.
    pub pow_limit: U256,
    pub pow_target_timespan: u64,
    pub pow_target_spacing: u64,
    /// Off-boundary blocks may drop to the pow limit after a long gap.
    pub allow_min_difficulty_blocks: bool,
    pub no_retargeting: bool,
    /// Buried deployment heights. Version 2, 3 and 4 become mandatory at
    /// these heights; BIP34 also requires the height in the coinbase.
    pub bip34_height: u64,
    pub bip66_height: u64,
    pub bip65_height: u64,
    pub max_block_base_size: usize,
    pub max_block_weight: usize,
    pub max_block_sigops_cost: usize,
    pub coinbase_maturity: u64,
    pub subsidy_halving_interval: u64,
    pub max_money: Amount,
    pub genesis: Block,
}

impl ConsensusParams {
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::main(),
            Network::Test => Self::test(),
            Network::Regtest => Self::regtest(),
        }
    }

    pub fn main() -> Self {
        Self {
            network: Network::Main,
            pow_limit: U256::MAX >> 32,
            pow_target_timespan: 14 * 24 * 60 * 60,
            pow_target_spacing: 10 * 60,
            allow_min_difficulty_blocks: false,
            no_retargeting: false,
            bip34_height: 0,
            bip66_height: 0,
            bip65_height: 0,
            max_block_base_size: 1_000_000,
            max_block_weight: 4_000_000,
            max_block_sigops_cost: 80_000,
            coinbase_maturity: 100,
            subsidy_halving_interval: 210_000,
            max_money: 21_000_000 * COIN,
            genesis: genesis_block(1_231_006_505, 2_083_236_893, 0x1d00ffff),
        }
    }

    pub fn test() -> Self {
        Self {
            network: Network::Test,
            allow_min_difficulty_blocks: true,
            genesis: genesis_block(1_296_688_602, 414_098_458, 0x1d00ffff),
            ..Self::main()
        }
    }

    pub fn regtest() -> Self {
        Self {
            network: Network::Regtest,
            pow_limit: U256::MAX >> 1,
            allow_min_difficulty_blocks: true,
            no_retargeting: true,
            bip34_height: 500,
            bip66_height: 1251,
            bip65_height: 1351,
            subsidy_halving_interval: 150,
            genesis: genesis_block(1_296_688_602, 2, 0x207fffff),
            ..Self::main()
        }
    }

    /// Blocks between difficulty retargets.
    pub fn difficulty_adjustment_interval(&self) -> u64 {
        self.pow_target_timespan / self.pow_target_spacing
    }

    pub fn pow_limit_bits(&self) -> u32 {
        compact_from_target(&self.pow_limit)
    }

    /// Minimum header version at `height`.
    pub fn min_version(&self, height: u64) -> i32 {
        if height >= self.bip65_height {
            4
        } else if height >= self.bip66_height {
            3
        } else if height >= self.bip34_height {
            2
        } else {
            1
        }
    }

    /// New coins a block at `height` may create.
    pub fn block_subsidy(&self, height: u64) -> Amount {
        let halvings = height / self.subsidy_halving_interval;
        if halvings >= MAX_HALVINGS {
            return 0;
        }
        (50 * COIN) >> halvings
    }

    pub fn money_range(&self, value: Amount) -> bool {
        (0..=self.max_money).contains(&value)
    }
}

const GENESIS_MESSAGE: &[u8] =
    b"The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";

const GENESIS_OUTPUT_KEY: [u8; 65] = [
    0x04, 0x67, 0x8a, 0xfd, 0xb0, 0xfe, 0x55, 0x48, 0x27, 0x19, 0x67, 0xf1, 0xa6, 0x71, 0x30,
    0xb7, 0x10, 0x5c, 0xd6, 0xa8, 0x28, 0xe0, 0x39, 0x09, 0xa6, 0x79, 0x62, 0xe0, 0xea, 0x1f,
    0x61, 0xde, 0xb6, 0x49, 0xf6, 0xbc, 0x3f, 0x4c, 0xef, 0x38, 0xc4, 0xf3, 0x55, 0x04, 0xe5,
    0x1e, 0xc1, 0x12, 0xde, 0x5c, 0x38, 0x4d, 0xf7, 0xba, 0x0b, 0x8d, 0x57, 0x8a, 0x4c, 0x70,
    0x2b, 0x6b, 0xf1, 0x1d, 0x5f,
];

fn genesis_block(time: u32, nonce: u32, bits: u32) -> Block {
    let mut script_sig = vec![0x04, 0xff, 0xff, 0x00, 0x1d, 0x01, 0x04];
    script_sig.push(GENESIS_MESSAGE.len() as u8);
    script_sig.extend_from_slice(GENESIS_MESSAGE);

    let mut script_pubkey = Vec::with_capacity(GENESIS_OUTPUT_KEY.len() + 2);
    script_pubkey.push(GENESIS_OUTPUT_KEY.len() as u8);
    script_pubkey.extend_from_slice(&GENESIS_OUTPUT_KEY);
    script_pubkey.push(shared_types::script::OP_CHECKSIG);

    let coinbase = Transaction {
        version: 1,
        inputs: vec![TxIn {
            prev_out: OutPoint::null(),
            script_sig,
            sequence: SEQUENCE_FINAL,
        }],
        outputs: vec![TxOut::new(50 * COIN, script_pubkey)],
        lock_time: 0,
    };

    let header = BlockHeader {
        version: 1,
        prev_block_hash: ZERO_HASH,
        merkle_root: coinbase.txid(),
        time,
        bits,
        nonce,
    };
    Block::new(header, vec![coinbase])
}

/// Network parameters plus the runtime checkpoint switch.
#[derive(Debug)]
pub struct ConsensusSettings {
    params: Arc<ConsensusParams>,
    checkpoints_enabled: AtomicBool,
}

impl ConsensusSettings {
    pub fn new(params: ConsensusParams, checkpoints_enabled: bool) -> Self {
        Self {
            params: Arc::new(params),
            checkpoints_enabled: AtomicBool::new(checkpoints_enabled),
        }
    }

    pub fn for_network(network: Network, checkpoints_enabled: bool) -> Self {
        Self::new(ConsensusParams::for_network(network), checkpoints_enabled)
    }

    pub fn network(&self) -> Network {
        self.params.network
    }

    pub fn params(&self) -> &Arc<ConsensusParams> {
        &self.params
    }

    pub fn checkpoints_enabled(&self) -> bool {
        self.checkpoints_enabled.load(Ordering::SeqCst)
    }

    pub fn set_checkpoints_enabled(&self, enabled: bool) {
        self.checkpoints_enabled.store(enabled, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::hash_to_hex;

    #[test]
    fn test_genesis_hashes() {
        assert_eq!(
            hash_to_hex(&ConsensusParams::main().genesis.hash()),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
        assert_eq!(
            hash_to_hex(&ConsensusParams::test().genesis.hash()),
            "000000000933ea01ad0ee984209779baaec3ced90fa3f408719526f8d77f4943"
        );
        assert_eq!(
            hash_to_hex(&ConsensusParams::regtest().genesis.hash()),
            "0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206"
        );
    }

    #[test]
    fn test_pow_limits() {
        assert_eq!(ConsensusParams::main().pow_limit_bits(), 0x1d00ffff);
        assert_eq!(ConsensusParams::regtest().pow_limit_bits(), 0x207fffff);
        assert_eq!(ConsensusParams::main().difficulty_adjustment_interval(), 2016);
    }

    #[test]
    fn test_min_version_follows_buried_heights() {
        let params = ConsensusParams::regtest();
        assert_eq!(params.min_version(499), 1);
        assert_eq!(params.min_version(500), 2);
        assert_eq!(params.min_version(1251), 3);
        assert_eq!(params.min_version(1351), 4);
        assert_eq!(ConsensusParams::main().min_version(1), 4);
    }

    #[test]
    fn test_subsidy_halves() {
        let params = ConsensusParams::main();
        assert_eq!(params.block_subsidy(0), 50 * COIN);
        assert_eq!(params.block_subsidy(210_000), 25 * COIN);
        assert_eq!(params.block_subsidy(210_000 * 64), 0);
    }

    #[test]
    fn test_network_parsing() {
        assert_eq!("regtest".parse::<Network>().unwrap(), Network::Regtest);
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Main);
        assert!("moon".parse::<Network>().is_err());
    }

    #[test]
    fn test_checkpoint_switch_is_live() {
        let settings = ConsensusSettings::for_network(Network::Main, false);
        assert!(!settings.checkpoints_enabled());
        settings.set_checkpoints_enabled(true);
        assert!(settings.checkpoints_enabled());
    }
}
