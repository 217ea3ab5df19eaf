//! Spend validation against the unspent-output set.

use super::{ConsensusRule, RuleContext, RuleStage};
use crate::domain::{ConsensusError, RuleError};
use async_trait::async_trait;
use shared_types::{hash_to_hex, Amount, Coin, OutPoint, Transaction};
use std::any::Any;
use std::collections::{HashMap, HashSet};

/// Outputs created and spent earlier in the block being checked.
///
/// The coin view only knows committed state, so in-block chains of spends
/// are resolved here first.
#[derive(Default)]
struct BlockOverlay {
    created: HashMap<OutPoint, Coin>,
    spent: HashSet<OutPoint>,
}

impl BlockOverlay {
    fn add_outputs(&mut self, tx: &Transaction, height: u64) {
        let txid = tx.txid();
        for (vout, output) in tx.outputs.iter().enumerate() {
            self.created.insert(
                OutPoint::new(txid, vout as u32),
                Coin {
                    output: output.clone(),
                    height,
                    is_coinbase: tx.is_coinbase(),
                },
            );
        }
    }
}

/// Inputs exist, are mature, and cover outputs; the coinbase claims no more
/// than subsidy plus fees.
#[derive(Debug, Default)]
pub struct CoinViewRule;

#[async_trait]
impl ConsensusRule for CoinViewRule {
    fn name(&self) -> &'static str {
        "CoinViewRule"
    }

    fn stage(&self) -> RuleStage {
        RuleStage::Full
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError> {
        let coin_view = ctx.coin_view()?;
        let height = ctx.height();
        let maturity = ctx.params.coinbase_maturity;
        let mut overlay = BlockOverlay::default();
        let mut fees: Amount = 0;

        for tx in &ctx.block.transactions {
            if tx.is_coinbase() {
                overlay.add_outputs(tx, height);
                continue;
            }
            let txid = hash_to_hex(&tx.txid());
            let fetched = coin_view.fetch_inputs(tx).await?;

            let mut value_in: Amount = 0;
            for (index, input) in tx.inputs.iter().enumerate() {
                let coin = if overlay.spent.contains(&input.prev_out) {
                    None
                } else if let Some(coin) = overlay.created.get(&input.prev_out) {
                    Some(coin.clone())
                } else {
                    fetched.coins.get(index).cloned().flatten()
                };

                let Some(coin) = coin else {
                    return Err(ConsensusError::BadTxnsInputsMissingOrSpent
                        .with_detail(format!("tx {} input {}", txid, index))
                        .into());
                };

                if coin.is_coinbase && height.saturating_sub(coin.height) < maturity {
                    return Err(ConsensusError::BadTxnsPrematureSpendOfCoinbase
                        .with_detail(format!(
                            "tx {} spends coinbase from height {} at {}",
                            txid, coin.height, height
                        ))
                        .into());
                }

                value_in = match value_in.checked_add(coin.output.value) {
                    Some(sum) if ctx.params.money_range(coin.output.value) && ctx.params.money_range(sum) => sum,
                    _ => {
                        return Err(ConsensusError::BadTxnsInputValuesOutOfRange
                            .with_detail(format!("tx {}", txid))
                            .into())
                    }
                };
                overlay.spent.insert(input.prev_out);
            }

            let value_out = tx
                .total_output_value()
                .ok_or_else(|| ConsensusError::BadTxnsTxoutTotalTooLarge.with_detail(format!("tx {}", txid)))?;
            if value_in < value_out {
                return Err(ConsensusError::BadTxnsInBelowOut
                    .with_detail(format!("tx {} in {} < out {}", txid, value_in, value_out))
                    .into());
            }

            fees = fees.saturating_add(value_in - value_out);
            overlay.add_outputs(tx, height);
        }

        let claimed = ctx
            .block
            .coinbase()
            .and_then(Transaction::total_output_value)
            .unwrap_or(Amount::MAX);
        let allowed = ctx.params.block_subsidy(height).saturating_add(fees);
        if claimed > allowed {
            return Err(ConsensusError::BadCoinbaseAmount
                .with_detail(format!("coinbase pays {} > {}", claimed, allowed))
                .into());
        }

        tracing::debug!(height, fees, "[consensus] Spends validated");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
