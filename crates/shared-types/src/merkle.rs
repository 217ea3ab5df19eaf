//! Transaction merkle root.
//!
//! Odd levels duplicate their last node. That duplication makes distinct
//! transaction lists collide on the same root (CVE-2012-2459), so the
//! computation also reports whether any level contained two identical
//! adjacent nodes ("mutated").

use crate::encoding::hash_pair;
use crate::entities::{Block, Hash, ZERO_HASH};

/// Compute the merkle root of `leaves` and whether the tree was mutated.
///
/// An empty list yields the zero hash.
pub fn compute_merkle_root(leaves: &[Hash]) -> (Hash, bool) {
    if leaves.is_empty() {
        return (ZERO_HASH, false);
    }

    let mut level = leaves.to_vec();
    let mut mutated = false;

    while level.len() > 1 {
        mutated |= level
            .chunks_exact(2)
            .any(|pair| pair[0] == pair[1]);

        if level.len() % 2 == 1 {
            let last = level[level.len() - 1];
            level.push(last);
        }

        level = level
            .chunks_exact(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }

    (level[0], mutated)
}

/// Merkle root over a block's transaction ids.
pub fn block_merkle_root(block: &Block) -> (Hash, bool) {
    let txids: Vec<Hash> = block.transactions.iter().map(|tx| tx.txid()).collect();
    compute_merkle_root(&txids)
}
