//! Chain header nodes
//!
//! Each node owns its header and a shared link to its predecessor. Height and
//! cumulative work are computed once from that link when the node is built
//! and never change afterwards; a reorganization only moves the tip pointer.

use primitive_types::U256;
use shared_types::{block_work, BlockHeader, Hash};
use std::sync::Arc;

/// Number of blocks the median time past is taken over.
pub const MEDIAN_TIME_SPAN: usize = 11;

#[derive(Debug)]
pub struct ChainHeaderNode {
    header: BlockHeader,
    hash: Hash,
    height: u64,
    chain_work: U256,
    prev: Option<Arc<ChainHeaderNode>>,
}

impl ChainHeaderNode {
    /// The first node of a chain.
    pub fn genesis(header: BlockHeader) -> Arc<Self> {
        Arc::new(Self {
            hash: header.hash(),
            height: 0,
            chain_work: block_work(header.bits),
            header,
            prev: None,
        })
    }

    /// Link `header` on top of `prev`.
    pub fn extend(prev: &Arc<ChainHeaderNode>, header: BlockHeader) -> Arc<Self> {
        Arc::new(Self {
            hash: header.hash(),
            height: prev.height + 1,
            chain_work: prev.chain_work.saturating_add(block_work(header.bits)),
            header,
            prev: Some(Arc::clone(prev)),
        })
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn chain_work(&self) -> U256 {
        self.chain_work
    }

    pub fn time(&self) -> u64 {
        u64::from(self.header.time)
    }

    pub fn bits(&self) -> u32 {
        self.header.bits
    }

    pub fn prev(&self) -> Option<&Arc<ChainHeaderNode>> {
        self.prev.as_ref()
    }

    /// The ancestor at `height`, or `None` above this node.
    pub fn ancestor(self: &Arc<Self>, height: u64) -> Option<Arc<ChainHeaderNode>> {
        if height > self.height {
            return None;
        }
        let mut node = Arc::clone(self);
        while node.height > height {
            node = Arc::clone(node.prev.as_ref()?);
        }
        Some(node)
    }

    /// Median timestamp of this node and up to ten predecessors.
    pub fn median_time_past(&self) -> u64 {
        let mut times = Vec::with_capacity(MEDIAN_TIME_SPAN);
        let mut node = Some(self);
        while let Some(current) = node {
            if times.len() == MEDIAN_TIME_SPAN {
                break;
            }
            times.push(current.time());
            node = current.prev.as_deref();
        }
        times.sort_unstable();
        times[times.len() / 2]
    }

    /// Lowest common ancestor of two nodes, `None` if they share no genesis.
    pub fn find_fork(
        a: &Arc<ChainHeaderNode>,
        b: &Arc<ChainHeaderNode>,
    ) -> Option<Arc<ChainHeaderNode>> {
        let height = a.height.min(b.height);
        let mut left = a.ancestor(height)?;
        let mut right = b.ancestor(height)?;
        while left.hash != right.hash {
            left = Arc::clone(left.prev.as_ref()?);
            right = Arc::clone(right.prev.as_ref()?);
        }
        Some(left)
    }

    /// Walk from this node back to genesis.
    pub fn iter(self: &Arc<Self>) -> Ancestors {
        Ancestors {
            next: Some(Arc::clone(self)),
        }
    }
}

/// Read-only view of a tip, safe to hand out while the index moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipSnapshot {
    pub hash: Hash,
    pub height: u64,
    pub median_time_past: u64,
    pub chain_work: U256,
}

impl From<&ChainHeaderNode> for TipSnapshot {
    fn from(node: &ChainHeaderNode) -> Self {
        Self {
            hash: node.hash,
            height: node.height,
            median_time_past: node.median_time_past(),
            chain_work: node.chain_work,
        }
    }
}

/// Iterator from a node back to genesis, inclusive.
pub struct Ancestors {
    next: Option<Arc<ChainHeaderNode>>,
}

impl Iterator for Ancestors {
    type Item = Arc<ChainHeaderNode>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.prev.clone();
        Some(current)
    }
}
