//! Fork choice by cumulative work
//!
//! The heaviest chain wins. A candidate replaces the current tip only when its
//! chain work is strictly greater; on a tie the tip the node already has is
//! kept.

use super::{ChainHeaderNode, ConsensusError};
use shared_types::{hash_to_hex, BlockHeader};
use std::sync::Arc;

/// Result of comparing a candidate against the current tip.
#[derive(Debug, Clone)]
pub struct TipSelection {
    pub new_tip: Arc<ChainHeaderNode>,
    /// Blocks to undo, highest first.
    pub disconnected: Vec<Arc<ChainHeaderNode>>,
    /// Blocks to apply, lowest first.
    pub connected: Vec<Arc<ChainHeaderNode>>,
}

impl TipSelection {
    fn unchanged(tip: &Arc<ChainHeaderNode>) -> Self {
        Self {
            new_tip: Arc::clone(tip),
            disconnected: Vec::new(),
            connected: Vec::new(),
        }
    }

    /// Whether the tip moves at all.
    pub fn is_tip_change(&self) -> bool {
        !self.connected.is_empty()
    }

    /// Whether blocks of the old best chain are undone.
    pub fn is_reorg(&self) -> bool {
        !self.disconnected.is_empty()
    }
}

/// Stateless fork-choice operations over chain header nodes.
pub struct ChainSelector;

impl ChainSelector {
    /// Build the node for `header` on top of `parent`.
    pub fn try_extend(
        header: BlockHeader,
        parent: &Arc<ChainHeaderNode>,
    ) -> Result<Arc<ChainHeaderNode>, ConsensusError> {
        if header.prev_block_hash != parent.hash() {
            return Err(ConsensusError::BadPrevBlock);
        }
        Ok(ChainHeaderNode::extend(parent, header))
    }

    /// Decide whether `candidate` replaces `current` and which blocks move.
    pub fn select_best_tip(
        current: &Arc<ChainHeaderNode>,
        candidate: &Arc<ChainHeaderNode>,
    ) -> TipSelection {
        if candidate.chain_work() <= current.chain_work() {
            return TipSelection::unchanged(current);
        }

        let Some(fork) = ChainHeaderNode::find_fork(current, candidate) else {
            tracing::warn!(
                current = %hash_to_hex(&current.hash()),
                candidate = %hash_to_hex(&candidate.hash()),
                "[consensus] Candidate shares no ancestor with the tip"
            );
            return TipSelection::unchanged(current);
        };

        let disconnected: Vec<_> = current
            .iter()
            .take_while(|node| node.height() > fork.height())
            .collect();

        let mut connected: Vec<_> = candidate
            .iter()
            .take_while(|node| node.height() > fork.height())
            .collect();
        connected.reverse();

        TipSelection {
            new_tip: Arc::clone(candidate),
            disconnected,
            connected,
        }
    }
}
