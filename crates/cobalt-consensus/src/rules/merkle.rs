//! Merkle root integrity.

use super::{ConsensusRule, RuleContext};
use crate::domain::{ConsensusError, RuleError};
use async_trait::async_trait;
use shared_types::{block_merkle_root, hash_to_hex};
use std::any::Any;

/// The header must commit to exactly the transactions the block carries.
///
/// A tree with duplicated adjacent nodes hashes the same as a shorter list,
/// so it is rejected separately to stop a valid block id being paired with
/// a malleated body.
#[derive(Debug, Default)]
pub struct BlockMerkleRootRule;

#[async_trait]
impl ConsensusRule for BlockMerkleRootRule {
    fn name(&self) -> &'static str {
        "BlockMerkleRootRule"
    }

    fn can_skip(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError> {
        let (root, mutated) = block_merkle_root(&ctx.block);

        if root != ctx.header().merkle_root {
            return Err(ConsensusError::BadMerkleRoot
                .with_detail(format!(
                    "header {} computed {}",
                    hash_to_hex(&ctx.header().merkle_root),
                    hash_to_hex(&root)
                ))
                .into());
        }

        if mutated {
            return Err(ConsensusError::BadTransactionsDuplicate.into());
        }

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
