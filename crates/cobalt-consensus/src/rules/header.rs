//! Contextual header checks: declared bits, timestamp window, version floor.

use super::{ConsensusRule, RuleContext};
use crate::domain::{ConsensusError, RuleError, MAX_FUTURE_BLOCK_TIME};
use async_trait::async_trait;
use std::any::Any;

/// The declared bits must equal the required bits.
///
/// Chain work is derived from the declared bits, so this holds below
/// checkpoints too.
#[derive(Debug, Default)]
pub struct DifficultyBitsRule;

#[async_trait]
impl ConsensusRule for DifficultyBitsRule {
    fn name(&self) -> &'static str {
        "DifficultyBitsRule"
    }

    fn can_skip(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError> {
        let required = ctx.required_bits();
        let declared = ctx.header().bits;

        // Exact match; there is no tolerance band in either direction.
        if declared != required {
            return Err(ConsensusError::BadDiffBits
                .with_detail(format!("expected {:08x}, got {:08x}", required, declared))
                .into());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Timestamp window and version floor.
#[derive(Debug, Default)]
pub struct HeaderContextualRule;

#[async_trait]
impl ConsensusRule for HeaderContextualRule {
    fn name(&self) -> &'static str {
        "HeaderContextualRule"
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError> {
        let header = *ctx.header();

        let time = u64::from(header.time);
        let median_time_past = ctx.parent.median_time_past();
        if time <= median_time_past {
            return Err(ConsensusError::TimeTooOld
                .with_detail(format!("{} <= median time past {}", time, median_time_past))
                .into());
        }

        if time > ctx.now + MAX_FUTURE_BLOCK_TIME {
            return Err(ConsensusError::TimeTooNew
                .with_detail(format!("{} > now {} + {}", time, ctx.now, MAX_FUTURE_BLOCK_TIME))
                .into());
        }

        let min_version = ctx.params.min_version(ctx.height());
        if header.version < min_version {
            return Err(ConsensusError::BadVersion
                .with_detail(format!(
                    "version {} below {} at height {}",
                    header.version,
                    min_version,
                    ctx.height()
                ))
                .into());
        }

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
