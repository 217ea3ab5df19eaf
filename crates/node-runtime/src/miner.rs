//! # Regtest Miner
//!
//! Builds coinbase-only block templates on the current tip and grinds the
//! header nonce until the hash meets the required target. Regtest targets are
//! easy enough that this finishes in a handful of hashes.
//!
//! Template bits come from the engine's own [`CalculateWorkRule`], fetched
//! from its rule registry.

use cobalt_consensus::rules::CalculateWorkRule;
use cobalt_consensus::{ChainHeaderNode, ConsensusParams, RuleContext, RuleRegistry, TipSnapshot};
use primitive_types::U256;
use shared_types::script::height_script;
use shared_types::{
    block_merkle_root, hash_to_target, Block, BlockHeader, CompactTarget, OutPoint, Transaction,
    TxIn, TxOut,
};
use std::sync::Arc;
use thiserror::Error;

/// Header version for mined blocks. Satisfies every buried deployment.
pub const BLOCK_VERSION: i32 = 4;

/// A block ready for nonce search.
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    pub height: u64,
    pub block: Block,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("rule registry has no {0}")]
    MissingRule(&'static str),
}

/// Builds templates paying the block subsidy to a fixed script.
#[derive(Debug, Clone)]
pub struct BlockTemplateBuilder {
    params: Arc<ConsensusParams>,
    payout_script: Vec<u8>,
    coinbase_tag: Vec<u8>,
}

impl BlockTemplateBuilder {
    pub fn new(params: Arc<ConsensusParams>, payout_script: Vec<u8>, coinbase_tag: &str) -> Self {
        Self {
            params,
            payout_script,
            coinbase_tag: coinbase_tag.as_bytes().to_vec(),
        }
    }

    /// Template for the child of `parent`, timestamped no earlier than `now`
    /// and strictly after the parent's median time past.
    pub fn build(
        &self,
        registry: &RuleRegistry,
        parent: &Arc<ChainHeaderNode>,
        now: u64,
    ) -> Result<BlockTemplate, TemplateError> {
        let work = registry
            .get::<CalculateWorkRule>()
            .ok_or(TemplateError::MissingRule("CalculateWorkRule"))?;
        let height = parent.height() + 1;
        let time = now.max(parent.median_time_past() + 1);

        let mut script_sig = height_script(height);
        script_sig.extend_from_slice(&self.coinbase_tag);
        // Coinbase scripts must be at least two bytes long.
        if script_sig.len() < 2 {
            script_sig.push(0x00);
        }

        let coinbase = Transaction {
            version: 1,
            inputs: vec![TxIn::new(OutPoint::null(), script_sig)],
            outputs: vec![TxOut::new(
                self.params.block_subsidy(height),
                self.payout_script.clone(),
            )],
            lock_time: 0,
        };

        let mut block = Block::new(
            BlockHeader {
                version: BLOCK_VERSION,
                prev_block_hash: parent.hash(),
                merkle_root: [0u8; 32],
                time: u32::try_from(time).unwrap_or(u32::MAX),
                bits: 0,
                nonce: 0,
            },
            vec![coinbase],
        );
        block.header.merkle_root = block_merkle_root(&block).0;

        let mut ctx = RuleContext::new(
            Arc::new(block.clone()),
            Arc::clone(parent),
            TipSnapshot::from(parent.as_ref()),
            Arc::clone(&self.params),
            now,
        );
        block.header.bits = work.required_bits(&mut ctx);

        Ok(BlockTemplate { height, block })
    }
}

/// Search the nonce space for a header meeting its own bits.
///
/// Returns `None` when every nonce misses; callers retry with a new timestamp.
pub fn mine_header(mut header: BlockHeader) -> Option<BlockHeader> {
    let target: U256 = CompactTarget::from_bits(header.bits).valid_target()?;
    for nonce in 0..=u32::MAX {
        header.nonce = nonce;
        if hash_to_target(&header.hash()) <= target {
            return Some(header);
        }
    }
    None
}
