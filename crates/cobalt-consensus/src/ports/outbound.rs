//! Driven ports (Outbound dependencies)
//!
//! The engine never owns chain state storage. It reaches the coin view and
//! the block store only through these traits and treats every error they
//! return as "could not evaluate", never as "invalid".

use crate::events::TipChangedEvent;
use async_trait::async_trait;
use shared_types::{Block, CollaboratorError, Hash, Transaction, UnspentOutputs};
use std::sync::Arc;

/// A block together with the height it occupies on the chain being changed.
#[derive(Debug, Clone)]
pub struct ChainBlock {
    pub height: u64,
    pub block: Arc<Block>,
}

impl ChainBlock {
    pub fn new(height: u64, block: Arc<Block>) -> Self {
        Self { height, block }
    }
}

/// The unspent-output set.
#[async_trait]
pub trait CoinView: Send + Sync {
    /// Coins for each input of `tx`, index-aligned with its inputs.
    async fn fetch_inputs(&self, tx: &Transaction) -> Result<UnspentOutputs, CollaboratorError>;

    /// Apply blocks in the given order (lowest first).
    async fn apply(&self, blocks: &[ChainBlock]) -> Result<(), CollaboratorError>;

    /// Undo blocks in the given order (highest first).
    async fn undo(&self, blocks: &[ChainBlock]) -> Result<(), CollaboratorError>;
}

/// Content-addressed block bodies.
#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn get(&self, hash: &Hash) -> Result<Option<Arc<Block>>, CollaboratorError>;

    async fn put(&self, block: Arc<Block>) -> Result<(), CollaboratorError>;
}

/// Event bus for tip notifications
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish after a tip change has committed.
    async fn publish_tip_changed(&self, event: TipChangedEvent) -> Result<(), String>;
}

/// Time source for timestamp validation
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in seconds
    fn now(&self) -> u64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
