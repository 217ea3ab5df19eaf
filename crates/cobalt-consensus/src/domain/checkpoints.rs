//! # Checkpoints
//!
//! Hard-coded `(height, hash)` pairs for blocks known to be on the canonical
//! chain.
//!
//! ## Uses
//!
//! 1. **Gate**: a block at a checkpoint height whose hash differs from the
//!    compiled one is rejected before any rule runs.
//! 2. **Skip**: skippable rules are bypassed at or below the last checkpoint,
//!    since the checkpoint hash already commits to those blocks.
//!
//! Whether checkpoints are consulted at all is read from
//! [`ConsensusSettings`] on every call, so toggling the setting takes effect
//! immediately without rebuilding the table.

use super::{ConsensusSettings, Network};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use shared_types::{hash_to_hex, Hash};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A compiled checkpoint.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointInfo {
    pub height: u64,
    #[serde_as(as = "Hex")]
    pub hash: Hash,
    /// Auxiliary commitment for hybrid-consensus networks (stake modifier).
    #[serde_as(as = "Option<Hex>")]
    pub modifier: Option<Hash>,
}

impl CheckpointInfo {
    pub const fn new(height: u64, hash: Hash) -> Self {
        Self {
            height,
            hash,
            modifier: None,
        }
    }
}

/// Parse a display-order hex hash at compile time.
const fn display_hash(s: &str) -> Hash {
    const fn nibble(c: u8) -> u8 {
        match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            b'A'..=b'F' => c - b'A' + 10,
            _ => panic!("invalid hex digit in checkpoint hash"),
        }
    }

    let bytes = s.as_bytes();
    assert!(bytes.len() == 64, "checkpoint hash must be 64 hex digits");
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < 32 {
        // Display order is byte-reversed.
        out[31 - i] = (nibble(bytes[2 * i]) << 4) | nibble(bytes[2 * i + 1]);
        i += 1;
    }
    out
}

const MAIN_CHECKPOINTS: &[CheckpointInfo] = &[
    CheckpointInfo::new(2016, display_hash("00000000df433ec804d450cdbc6539a35d8b641f19db14101177d085a58da638")),
    CheckpointInfo::new(6048, display_hash("000000003cec6481ecadadae767879f8c1c24804b2b3d1b88ee8c21e356a475e")),
    CheckpointInfo::new(10080, display_hash("000000005d55e95fa83f77e897c4bd28f5dd868fc1d272bf56fe5f9c7730bf42")),
    CheckpointInfo::new(14112, display_hash("00000000f42b136289bae77a2f164142a7d2abe8e73b08d3ddce82b993b8720c")),
    CheckpointInfo::new(18144, display_hash("0000000005bd0c4f34a800add12f5f9faa54b76611e5125a8accc8b9fec04abf")),
    CheckpointInfo::new(22176, display_hash("00000000d41bc0f4ff31e3e0a0fb02e867ddb40c98cd72c48c1a3d0e31243249")),
    CheckpointInfo::new(26208, display_hash("00000000e8349810175ac5e6b6507345a52ce388f605c9d4e8fa6285138d059e")),
    CheckpointInfo::new(30240, display_hash("00000000eddea6f7d08bb6c193ba152b9a19609355cad279fe4d215effc4ae6e")),
    CheckpointInfo::new(34272, display_hash("0000000062a75fd883cbd0c2aea953150d2932392ee3656606616f9f758e86e4")),
    CheckpointInfo::new(38304, display_hash("00000000313693a0ced67d0a7b5ccd6b695ddbce306f2cf40e4853c59ec57c51")),
    CheckpointInfo::new(40320, display_hash("0000000010e1a67156a2e96a21f391011d5efeac3dcbc308601e43c368ba5790")),
    CheckpointInfo::new(43034, display_hash("000000005b975487467b21a662900fe657a02c59eef02ca927f8545e274dea26")),
];

fn compiled_table(network: Network) -> &'static [CheckpointInfo] {
    match network {
        Network::Main => MAIN_CHECKPOINTS,
        Network::Test | Network::Regtest => &[],
    }
}

/// Checkpoint table for one network.
#[derive(Debug, Clone)]
pub struct Checkpoints {
    entries: BTreeMap<u64, CheckpointInfo>,
    settings: Arc<ConsensusSettings>,
}

impl Checkpoints {
    /// The compiled table for the settings' network.
    pub fn new(settings: Arc<ConsensusSettings>) -> Self {
        let entries = compiled_table(settings.network()).to_vec();
        Self::with_entries(settings, entries)
    }

    /// A table with explicit entries. Heights must be unique.
    pub fn with_entries(settings: Arc<ConsensusSettings>, entries: Vec<CheckpointInfo>) -> Self {
        let mut map = BTreeMap::new();
        for entry in entries {
            let previous = map.insert(entry.height, entry);
            debug_assert!(previous.is_none(), "duplicate checkpoint height");
        }
        Self {
            entries: map,
            settings,
        }
    }

    pub fn enabled(&self) -> bool {
        self.settings.checkpoints_enabled()
    }

    /// Height of the last checkpoint, 0 when disabled or empty.
    pub fn last_checkpoint_height(&self) -> u64 {
        if !self.enabled() {
            return 0;
        }
        self.entries.keys().next_back().copied().unwrap_or(0)
    }

    /// Height of the highest checkpoint at or below `height`, 0 when disabled
    /// or none.
    pub fn last_checkpoint_at_or_below(&self, height: u64) -> u64 {
        if !self.enabled() {
            return 0;
        }
        self.entries.range(..=height).next_back().map(|(h, _)| *h).unwrap_or(0)
    }

    pub fn get(&self, height: u64) -> Option<&CheckpointInfo> {
        if !self.enabled() {
            return None;
        }
        self.entries.get(&height)
    }

    /// False only when a checkpoint exists at `height` and `hash` differs.
    pub fn is_hardened(&self, height: u64, hash: &Hash) -> bool {
        let Some(checkpoint) = self.get(height) else {
            return true;
        };
        if checkpoint.hash == *hash {
            return true;
        }
        tracing::warn!(
            height,
            expected = %hash_to_hex(&checkpoint.hash),
            actual = %hash_to_hex(hash),
            "[consensus] Checkpoint mismatch"
        );
        false
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
