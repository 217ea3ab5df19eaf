//! Required work and proof of work.

use super::{ConsensusRule, RuleContext};
use crate::domain::{next_work_required, ConsensusError, RuleError};
use async_trait::async_trait;
use shared_types::{hash_to_hex, hash_to_target, CompactTarget};
use std::any::Any;

/// Computes the bits the block must declare and, when proof of work is
/// checked, verifies the header hash meets that target.
///
/// The hash is measured against the computed target rather than the declared
/// bits, so a block declaring the wrong bits fails on its bits, not its hash.
#[derive(Debug, Default)]
pub struct CalculateWorkRule;

impl CalculateWorkRule {
    /// Bits a child of `ctx.parent` must declare at the header's timestamp.
    /// The result is recorded in the context.
    pub fn required_bits(&self, ctx: &mut RuleContext) -> u32 {
        let bits = next_work_required(&ctx.parent, u64::from(ctx.header().time), &ctx.params);
        ctx.next_work_required = Some(bits);
        bits
    }
}

#[async_trait]
impl ConsensusRule for CalculateWorkRule {
    fn name(&self) -> &'static str {
        "CalculateWorkRule"
    }

    fn can_skip(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError> {
        let bits = self.required_bits(ctx);

        if !ctx.check_pow {
            return Ok(());
        }

        let target = CompactTarget::from_bits(bits).target;
        let hash = ctx.header().hash();
        if hash_to_target(&hash) > target {
            return Err(ConsensusError::HighHash
                .with_detail(format!("{} above target {:08x}", hash_to_hex(&hash), bits))
                .into());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::*;

    #[tokio::test]
    async fn test_stores_required_bits() {
        let (params, genesis) = regtest();
        let block = next_block(&genesis, &params);
        let mut ctx = context(block, &genesis, &params);

        CalculateWorkRule.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.next_work_required, Some(0x207fffff));
    }

    #[tokio::test]
    async fn test_high_hash_rejected() {
        let (params, genesis) = regtest();
        let mut block = next_block(&genesis, &params);
        unmine(&mut block, params.pow_limit);
        let mut ctx = context(block, &genesis, &params);

        let err = CalculateWorkRule.run(&mut ctx).await.unwrap_err();
        assert_eq!(err.consensus_error(), Some(ConsensusError::HighHash));
        // The requirement is still recorded for later rules.
        assert_eq!(ctx.next_work_required, Some(0x207fffff));
    }

    #[tokio::test]
    async fn test_pow_check_can_be_disabled() {
        let (params, genesis) = regtest();
        let mut block = next_block(&genesis, &params);
        unmine(&mut block, params.pow_limit);
        let mut ctx = context(block, &genesis, &params).with_check_pow(false);

        assert!(CalculateWorkRule.run(&mut ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_repeated_runs_agree() {
        let (params, genesis) = regtest();
        let block = next_block(&genesis, &params);
        let mut first = context(block.clone(), &genesis, &params);
        let mut second = context(block, &genesis, &params);

        CalculateWorkRule.run(&mut first).await.unwrap();
        CalculateWorkRule.run(&mut second).await.unwrap();
        assert_eq!(first.next_work_required, second.next_work_required);
    }
}
