//! # Consensus Rules
//!
//! Every check a block must pass is a [`ConsensusRule`]. Rules are registered
//! once, in order, into a [`RuleRegistry`] and run fail-fast against a
//! [`RuleContext`].
//!
//! ## Stages
//!
//! - `Partial`: runs when the block is submitted, against its intended parent.
//! - `Full`: runs when the block is connected to the best chain, against the
//!   coin view as of its parent.
//!
//! ## Skipping
//!
//! Rules are skippable unless they say otherwise. Skippable rules are bypassed
//! for blocks at or below the last checkpoint while checkpoints are enabled.
//! Proof of work, the declared bits and block integrity (merkle root, coinbase
//! structure, size) are never skipped: a height below a checkpoint does not
//! mean the block is on the checkpointed chain.

mod coin_view;
mod coinbase;
mod context;
mod header;
mod merkle;
mod registry;
mod sigops;
mod size;
mod transactions;
mod work;

pub use coin_view::CoinViewRule;
pub use coinbase::{CoinbaseHeightRule, EnsureCoinbaseRule};
pub use context::RuleContext;
pub use header::{DifficultyBitsRule, HeaderContextualRule};
pub use merkle::BlockMerkleRootRule;
pub use registry::RuleRegistry;
pub use sigops::LegacySigOpsRule;
pub use size::BlockSizeRule;
pub use transactions::{CheckTransactionsRule, TransactionLocktimeRule};
pub use work::CalculateWorkRule;

use crate::domain::RuleError;
use async_trait::async_trait;
use std::any::Any;

/// When in a block's life a rule runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleStage {
    Partial,
    Full,
}

/// A single validation step.
///
/// Rules hold no mutable state between calls. Anything a rule learns about
/// the block it writes into the context.
#[async_trait]
pub trait ConsensusRule: Any + Send + Sync {
    fn name(&self) -> &'static str;

    fn stage(&self) -> RuleStage {
        RuleStage::Partial
    }

    fn can_skip(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError>;

    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
pub(crate) mod test_support;
