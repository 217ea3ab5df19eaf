//! Published events (Outgoing)

use crate::domain::ChainHeaderNode;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use shared_types::Hash;
use std::sync::Arc;

/// Published to the event bus after the best tip moved.
///
/// Subscribers (mempool, wallet, indexers) use the disconnect/connect lists to
/// replay the change in the same order the coin view saw it.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipChangedEvent {
    #[serde_as(as = "Hex")]
    pub new_tip: Hash,
    pub height: u64,
    /// Undone blocks, highest first.
    #[serde_as(as = "Vec<Hex>")]
    pub disconnected: Vec<Hash>,
    /// Applied blocks, lowest first.
    #[serde_as(as = "Vec<Hex>")]
    pub connected: Vec<Hash>,
    /// Unix seconds at commit.
    pub changed_at: u64,
}

impl TipChangedEvent {
    pub fn new(
        tip: &ChainHeaderNode,
        disconnected: &[Arc<ChainHeaderNode>],
        connected: &[Arc<ChainHeaderNode>],
        changed_at: u64,
    ) -> Self {
        Self {
            new_tip: tip.hash(),
            height: tip.height(),
            disconnected: disconnected.iter().map(|n| n.hash()).collect(),
            connected: connected.iter().map(|n| n.hash()).collect(),
            changed_at,
        }
    }

    pub fn is_reorg(&self) -> bool {
        !self.disconnected.is_empty()
    }
}
