//! Signature-operation budget.

use super::{ConsensusRule, RuleContext};
use crate::domain::{ConsensusError, RuleError, WITNESS_SCALE_FACTOR};
use async_trait::async_trait;
use shared_types::script::legacy_sigop_count;
use shared_types::Transaction;
use std::any::Any;

fn transaction_sigops(tx: &Transaction) -> usize {
    let inputs: usize = tx.inputs.iter().map(|i| legacy_sigop_count(&i.script_sig)).sum();
    let outputs: usize = tx
        .outputs
        .iter()
        .map(|o| legacy_sigop_count(&o.script_pubkey))
        .sum();
    inputs + outputs
}

/// Legacy sigops, scaled to cost units, must fit the block budget.
#[derive(Debug, Default)]
pub struct LegacySigOpsRule;

#[async_trait]
impl ConsensusRule for LegacySigOpsRule {
    fn name(&self) -> &'static str {
        "LegacySigOpsRule"
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError> {
        let sigops: usize = ctx.block.transactions.iter().map(transaction_sigops).sum();
        let cost = sigops * WITNESS_SCALE_FACTOR;

        if cost > ctx.params.max_block_sigops_cost {
            return Err(ConsensusError::BadBlockSigOps
                .with_detail(format!("cost {} > {}", cost, ctx.params.max_block_sigops_cost))
                .into());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
