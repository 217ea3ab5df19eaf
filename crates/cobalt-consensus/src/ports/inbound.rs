//! Driving ports (Inbound API)

use crate::domain::{ChainResult, TipSnapshot};
use async_trait::async_trait;
use shared_types::{Block, Hash, NodeState};

/// Where an accepted block ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    /// The block is the new best tip (possibly after a reorganization).
    AcceptedNewTip,
    /// Valid, but its branch is not heavier than the best chain.
    AcceptedSideBranch,
}

/// Successful submission: status plus the best tip after the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub status: SubmitStatus,
    pub block_hash: Hash,
    pub height: u64,
    pub tip: TipSnapshot,
}

/// Primary consensus API
#[async_trait]
pub trait ConsensusApi: Send + Sync {
    /// Validate a block and, if it is valid and heavier, make it the tip.
    ///
    /// Submissions are serialized; concurrent callers queue.
    async fn submit_block(&self, block: Block) -> ChainResult<SubmitOutcome>;

    /// Current best tip.
    async fn best_tip(&self) -> TipSnapshot;

    /// Whether a block with this hash is in the index.
    async fn is_known(&self, hash: Hash) -> bool;

    async fn node_state(&self) -> NodeState;
}
