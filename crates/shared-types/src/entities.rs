//! # Core Domain Entities
//!
//! Block and transaction layouts for the Cobalt chain.
//!
//! ## Clusters
//!
//! - **Chain**: `BlockHeader`, `Block`
//! - **Transactions**: `Transaction`, `TxIn`, `TxOut`, `OutPoint`
//! - **Coins**: `Coin`, `UnspentOutputs` (what the coin view hands back)

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::encoding::{compact_size_len, double_sha256, Encoder};

// Re-export the 256-bit integers used for targets and chain work.
pub use primitive_types::{U256, U512};

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte double-SHA256 digest in internal (little-endian) byte order.
pub type Hash = [u8; 32];

/// The all-zero hash (genesis parent, null outpoint txid).
pub const ZERO_HASH: Hash = [0u8; 32];

/// Monetary amount in base units.
pub type Amount = i64;

/// Base units per coin.
pub const COIN: Amount = 100_000_000;

/// Render a hash the way block explorers do (byte-reversed hex).
pub fn hash_to_hex(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

/// Parse a byte-reversed hex hash as printed by [`hash_to_hex`].
pub fn hash_from_hex(s: &str) -> Result<Hash, hex::FromHexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let mut out = [0u8; 32];
    hex::decode_to_slice(s, &mut out)?;
    out.reverse();
    Ok(out)
}

/// The 80-byte block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Protocol version; gated upwards by buried soft forks.
    pub version: i32,
    /// Hash of the parent header (creates the chain linkage).
    pub prev_block_hash: Hash,
    /// Merkle root of the block's transaction ids.
    pub merkle_root: Hash,
    /// Unix timestamp claimed by the miner.
    pub time: u32,
    /// Compact encoding of the proof-of-work target.
    pub bits: u32,
    /// Proof-of-work nonce.
    pub nonce: u32,
}

impl BlockHeader {
    /// Serialized header size in bytes.
    pub const SIZE: usize = 80;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut enc = Encoder::with_capacity(Self::SIZE);
        enc.put_i32(self.version);
        enc.put_hash(&self.prev_block_hash);
        enc.put_hash(&self.merkle_root);
        enc.put_u32(self.time);
        enc.put_u32(self.bits);
        enc.put_u32(self.nonce);

        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(&enc.into_bytes());
        out
    }

    /// Block id: double SHA-256 of the serialized header.
    pub fn hash(&self) -> Hash {
        double_sha256(&self.encode())
    }
}

/// A full block: header plus ordered transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Serialized size without witness data.
    pub fn serialized_size(&self) -> usize {
        BlockHeader::SIZE
            + compact_size_len(self.transactions.len() as u64)
            + self
                .transactions
                .iter()
                .map(Transaction::serialized_size)
                .sum::<usize>()
    }

    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first().filter(|tx| tx.is_coinbase())
    }
}

// =============================================================================
// CLUSTER B: TRANSACTIONS
// =============================================================================

/// Reference to a previous transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: Hash,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Hash, vout: u32) -> Self {
        Self { txid, vout }
    }

    /// The outpoint a coinbase input refers to.
    pub fn null() -> Self {
        Self {
            txid: ZERO_HASH,
            vout: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.txid == ZERO_HASH && self.vout == u32::MAX
    }
}

/// Sequence number that opts an input out of lock-time enforcement.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub prev_out: OutPoint,
    #[serde_as(as = "Hex")]
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TxIn {
    pub fn new(prev_out: OutPoint, script_sig: Vec<u8>) -> Self {
        Self {
            prev_out,
            script_sig,
            sequence: SEQUENCE_FINAL,
        }
    }

    fn serialized_size(&self) -> usize {
        36 + compact_size_len(self.script_sig.len() as u64) + self.script_sig.len() + 4
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    #[serde_as(as = "Hex")]
    pub script_pubkey: Vec<u8>,
}

impl TxOut {
    pub fn new(value: Amount, script_pubkey: Vec<u8>) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }

    fn serialized_size(&self) -> usize {
        8 + compact_size_len(self.script_pubkey.len() as u64) + self.script_pubkey.len()
    }
}

/// Lock times below this are block heights, at or above are timestamps.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(self.serialized_size());
        enc.put_i32(self.version);
        enc.put_compact_size(self.inputs.len() as u64);
        for input in &self.inputs {
            enc.put_hash(&input.prev_out.txid);
            enc.put_u32(input.prev_out.vout);
            enc.put_var_bytes(&input.script_sig);
            enc.put_u32(input.sequence);
        }
        enc.put_compact_size(self.outputs.len() as u64);
        for output in &self.outputs {
            enc.put_i64(output.value);
            enc.put_var_bytes(&output.script_pubkey);
        }
        enc.put_u32(self.lock_time);
        enc.into_bytes()
    }

    pub fn txid(&self) -> Hash {
        double_sha256(&self.encode())
    }

    pub fn serialized_size(&self) -> usize {
        4 + compact_size_len(self.inputs.len() as u64)
            + self.inputs.iter().map(TxIn::serialized_size).sum::<usize>()
            + compact_size_len(self.outputs.len() as u64)
            + self.outputs.iter().map(TxOut::serialized_size).sum::<usize>()
            + 4
    }

    /// A coinbase has exactly one input spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prev_out.is_null()
    }

    /// Sum of output values, `None` on overflow.
    pub fn total_output_value(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .try_fold(0 as Amount, |acc, out| acc.checked_add(out.value))
    }

    /// Lock-time finality at a given height and median time past.
    pub fn is_final(&self, height: u64, block_time: u64) -> bool {
        if self.lock_time == 0 {
            return true;
        }
        let limit = if self.lock_time < LOCKTIME_THRESHOLD {
            height
        } else {
            block_time
        };
        if u64::from(self.lock_time) < limit {
            return true;
        }
        self.inputs.iter().all(|input| input.sequence == SEQUENCE_FINAL)
    }
}

// =============================================================================
// CLUSTER C: COINS
// =============================================================================

/// An unspent output together with the metadata spend rules need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub output: TxOut,
    /// Height of the block that created the output.
    pub height: u64,
    pub is_coinbase: bool,
}

/// Coins for a transaction's inputs, index-aligned with `Transaction::inputs`.
/// `None` marks an input whose output is missing or already spent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnspentOutputs {
    pub coins: Vec<Option<Coin>>,
}

impl UnspentOutputs {
    pub fn new(coins: Vec<Option<Coin>>) -> Self {
        Self { coins }
    }

    pub fn all_present(&self) -> bool {
        self.coins.iter().all(Option::is_some)
    }

    /// Total value of the present coins, `None` on overflow.
    pub fn total_value(&self) -> Option<Amount> {
        self.coins
            .iter()
            .flatten()
            .try_fold(0 as Amount, |acc, coin| acc.checked_add(coin.output.value))
    }
}
