//! # Error Types
//!
//! Errors shared between the consensus engine and the collaborators it calls
//! (coin view, block store). Consensus rejections live in the consensus
//! crate; this file only covers failures that say nothing about validity.

use thiserror::Error;

/// A collaborator could not answer.
///
/// These never mean "the block is invalid" and must never be cached as such.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// A record the caller expected to exist is missing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend I/O failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The collaborator is shutting down or otherwise unreachable.
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// Stored data failed an integrity check.
    #[error("Data corruption: {0}")]
    Corrupted(String),
}

/// Node operational states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    /// Normal operation.
    #[default]
    Running,
    /// Synchronizing with the network.
    Syncing,
    /// Halted after a failed rollback left the chain state unknown.
    HaltedAwaitingIntervention,
}

impl NodeState {
    pub fn is_halted(&self) -> bool {
        matches!(self, NodeState::HaltedAwaitingIntervention)
    }
}
