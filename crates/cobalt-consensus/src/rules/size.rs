//! Block size and weight ceilings.

use super::{ConsensusRule, RuleContext};
use crate::domain::{ConsensusError, RuleError, WITNESS_SCALE_FACTOR};
use async_trait::async_trait;
use std::any::Any;

#[derive(Debug, Default)]
pub struct BlockSizeRule;

#[async_trait]
impl ConsensusRule for BlockSizeRule {
    fn name(&self) -> &'static str {
        "BlockSizeRule"
    }

    fn can_skip(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError> {
        let params = &ctx.params;
        let tx_count = ctx.block.transactions.len();

        if tx_count == 0 || tx_count > params.max_block_base_size {
            return Err(ConsensusError::BadBlockLength
                .with_detail(format!("{} transactions", tx_count))
                .into());
        }

        let base_size = ctx.block.serialized_size();
        if base_size > params.max_block_base_size {
            return Err(ConsensusError::BadBlockLength
                .with_detail(format!("{} bytes > {}", base_size, params.max_block_base_size))
                .into());
        }

        // No witness data, so weight is base size scaled.
        let weight = base_size * WITNESS_SCALE_FACTOR;
        if weight > params.max_block_weight {
            return Err(ConsensusError::BadBlockWeight
                .with_detail(format!("weight {} > {}", weight, params.max_block_weight))
                .into());
        }

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
