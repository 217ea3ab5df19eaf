//! Bounded memory of blocks rejected by consensus.

use super::ConsensusFailure;
use shared_types::Hash;
use std::collections::{HashMap, VecDeque};

/// FIFO-evicting map from block hash to the failure it was rejected with.
#[derive(Debug, Clone)]
pub struct InvalidBlockCache {
    capacity: usize,
    order: VecDeque<Hash>,
    entries: HashMap<Hash, ConsensusFailure>,
}

impl InvalidBlockCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity.min(1_024)),
            entries: HashMap::new(),
        }
    }

    /// Remember `hash`. A hash already present keeps its original failure.
    pub fn insert(&mut self, hash: Hash, failure: ConsensusFailure) {
        if self.capacity == 0 || self.entries.contains_key(&hash) {
            return;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(hash);
        self.entries.insert(hash, failure);
    }

    pub fn get(&self, hash: &Hash) -> Option<&ConsensusFailure> {
        self.entries.get(hash)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
