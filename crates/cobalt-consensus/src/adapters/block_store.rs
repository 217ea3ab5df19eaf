//! Block store adapter

use crate::ports::BlockStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Block, CollaboratorError, Hash};
use std::collections::HashMap;
use std::sync::Arc;

/// Block bodies keyed by header hash, held in memory.
#[derive(Default)]
pub struct InMemoryBlockStore {
    blocks: RwLock<HashMap<Hash, Arc<Block>>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.blocks.read().contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

#[async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn get(&self, hash: &Hash) -> Result<Option<Arc<Block>>, CollaboratorError> {
        Ok(self.blocks.read().get(hash).cloned())
    }

    async fn put(&self, block: Arc<Block>) -> Result<(), CollaboratorError> {
        self.blocks.write().insert(block.hash(), block);
        Ok(())
    }
}
