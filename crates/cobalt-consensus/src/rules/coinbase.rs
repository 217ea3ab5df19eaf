//! Coinbase placement and height commitment.

use super::{ConsensusRule, RuleContext};
use crate::domain::{ConsensusError, RuleError};
use async_trait::async_trait;
use shared_types::script::height_script;
use std::any::Any;

/// Exactly one coinbase, and it comes first.
#[derive(Debug, Default)]
pub struct EnsureCoinbaseRule;

#[async_trait]
impl ConsensusRule for EnsureCoinbaseRule {
    fn name(&self) -> &'static str {
        "EnsureCoinbaseRule"
    }

    fn can_skip(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError> {
        let transactions = &ctx.block.transactions;

        match transactions.first() {
            Some(first) if first.is_coinbase() => {}
            Some(_) => {
                return Err(ConsensusError::BadCoinbaseMissing
                    .with_detail("first transaction is not a coinbase")
                    .into())
            }
            None => {
                return Err(ConsensusError::BadCoinbaseMissing
                    .with_detail("block has no transactions")
                    .into())
            }
        }

        if let Some(index) = transactions.iter().skip(1).position(|tx| tx.is_coinbase()) {
            return Err(ConsensusError::BadMultipleCoinbase
                .with_detail(format!("coinbase at position {}", index + 1))
                .into());
        }

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Once BIP34 is buried, the coinbase script must start with the height.
#[derive(Debug, Default)]
pub struct CoinbaseHeightRule;

#[async_trait]
impl ConsensusRule for CoinbaseHeightRule {
    fn name(&self) -> &'static str {
        "CoinbaseHeightRule"
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError> {
        let height = ctx.height();
        if height < ctx.params.bip34_height {
            return Ok(());
        }

        let Some(coinbase) = ctx.block.coinbase() else {
            return Err(ConsensusError::BadCoinbaseMissing.into());
        };

        let expected = height_script(height);
        if !coinbase.inputs[0].script_sig.starts_with(&expected) {
            return Err(ConsensusError::BadCoinbaseHeight
                .with_detail(format!("height {} not committed", height))
                .into());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
