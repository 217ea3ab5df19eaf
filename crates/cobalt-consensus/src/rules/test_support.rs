//! Block builders shared by rule and service tests.

use super::RuleContext;
use crate::domain::{ChainHeaderNode, ConsensusParams, TipSnapshot};
use primitive_types::U256;
use shared_types::script::{height_script, OP_TRUE};
use shared_types::{
    block_merkle_root, hash_to_target, Amount, Block, BlockHeader, CompactTarget, OutPoint,
    Transaction, TxIn, TxOut, COIN,
};
use std::sync::Arc;

pub(crate) const TAG: &[u8] = b"/cobalt-test/";

pub(crate) fn coinbase(height: u64, value: Amount) -> Transaction {
    let mut script_sig = height_script(height);
    script_sig.extend_from_slice(TAG);
    Transaction {
        version: 1,
        inputs: vec![TxIn::new(OutPoint::null(), script_sig)],
        outputs: vec![TxOut::new(value, vec![OP_TRUE])],
        lock_time: 0,
    }
}

pub(crate) fn spend(prev: OutPoint, value: Amount) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![TxIn::new(prev, vec![OP_TRUE])],
        outputs: vec![TxOut::new(value, vec![OP_TRUE])],
        lock_time: 0,
    }
}

/// Unmined block on `parent` with a correct merkle root.
pub(crate) fn block_on(parent: &ChainHeaderNode, transactions: Vec<Transaction>, time: u32, bits: u32) -> Block {
    let mut block = Block::new(
        BlockHeader {
            version: 4,
            prev_block_hash: parent.hash(),
            merkle_root: [0u8; 32],
            time,
            bits,
            nonce: 0,
        },
        transactions,
    );
    block.header.merkle_root = block_merkle_root(&block).0;
    block
}

/// Grind the nonce until the header hash meets `target`.
pub(crate) fn mine_to(block: &mut Block, target: U256) {
    while hash_to_target(&block.header.hash()) > target {
        block.header.nonce += 1;
    }
}

/// Grind against the block's own bits.
pub(crate) fn mine(block: &mut Block) {
    let target = CompactTarget::from_bits(block.header.bits).target;
    mine_to(block, target);
}

/// Grind until the hash misses `target`.
pub(crate) fn unmine(block: &mut Block, target: U256) {
    while hash_to_target(&block.header.hash()) <= target {
        block.header.nonce += 1;
    }
}

/// A mined regtest child of `parent` paying the full subsidy.
pub(crate) fn next_block(parent: &ChainHeaderNode, params: &ConsensusParams) -> Block {
    let height = parent.height() + 1;
    let mut block = block_on(
        parent,
        vec![coinbase(height, params.block_subsidy(height))],
        parent.header().time + 600,
        params.pow_limit_bits(),
    );
    mine(&mut block);
    block
}

pub(crate) fn regtest() -> (Arc<ConsensusParams>, Arc<ChainHeaderNode>) {
    let params = Arc::new(ConsensusParams::regtest());
    let genesis = ChainHeaderNode::genesis(params.genesis.header);
    (params, genesis)
}

pub(crate) fn context(block: Block, parent: &Arc<ChainHeaderNode>, params: &Arc<ConsensusParams>) -> RuleContext {
    let now = u64::from(block.header.time) + 60;
    RuleContext::new(
        Arc::new(block),
        Arc::clone(parent),
        TipSnapshot::from(parent.as_ref()),
        Arc::clone(params),
        now,
    )
}

pub(crate) const FIFTY: Amount = 50 * COIN;
