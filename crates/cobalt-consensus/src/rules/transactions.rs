//! Context-free transaction checks and lock-time finality.

use super::{ConsensusRule, RuleContext};
use crate::domain::{ConsensusError, ConsensusFailure, ConsensusParams, RuleError};
use async_trait::async_trait;
use shared_types::{hash_to_hex, Amount, Transaction};
use std::any::Any;
use std::collections::HashSet;

/// Coinbase script-sig length bounds, inclusive.
const COINBASE_SCRIPT_MIN: usize = 2;
const COINBASE_SCRIPT_MAX: usize = 100;

fn reject(error: ConsensusError, tx: &Transaction) -> ConsensusFailure {
    error.with_detail(format!("tx {}", hash_to_hex(&tx.txid())))
}

/// Checks that need nothing but the transaction itself.
pub fn check_transaction(tx: &Transaction, params: &ConsensusParams) -> Result<(), ConsensusFailure> {
    if tx.inputs.is_empty() {
        return Err(reject(ConsensusError::BadTxnsVinEmpty, tx));
    }
    if tx.outputs.is_empty() {
        return Err(reject(ConsensusError::BadTxnsVoutEmpty, tx));
    }

    let mut total: Amount = 0;
    for output in &tx.outputs {
        if output.value < 0 {
            return Err(reject(ConsensusError::BadTxnsVoutNegative, tx));
        }
        if output.value > params.max_money {
            return Err(reject(ConsensusError::BadTxnsVoutTooLarge, tx));
        }
        total = match total.checked_add(output.value) {
            Some(sum) if params.money_range(sum) => sum,
            _ => return Err(reject(ConsensusError::BadTxnsTxoutTotalTooLarge, tx)),
        };
    }

    let mut seen = HashSet::with_capacity(tx.inputs.len());
    if !tx.inputs.iter().all(|input| seen.insert(input.prev_out)) {
        return Err(reject(ConsensusError::BadTxnsInputsDuplicate, tx));
    }

    if tx.is_coinbase() {
        let len = tx.inputs[0].script_sig.len();
        if !(COINBASE_SCRIPT_MIN..=COINBASE_SCRIPT_MAX).contains(&len) {
            return Err(reject(ConsensusError::BadCoinbaseLength, tx));
        }
    } else if tx.inputs.iter().any(|input| input.prev_out.is_null()) {
        return Err(reject(ConsensusError::BadTxnsPrevoutNull, tx));
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct CheckTransactionsRule;

#[async_trait]
impl ConsensusRule for CheckTransactionsRule {
    fn name(&self) -> &'static str {
        "CheckTransactionsRule"
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError> {
        for tx in &ctx.block.transactions {
            check_transaction(tx, &ctx.params)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Every transaction must be final at the block's height and the parent's
/// median time past.
#[derive(Debug, Default)]
pub struct TransactionLocktimeRule;

#[async_trait]
impl ConsensusRule for TransactionLocktimeRule {
    fn name(&self) -> &'static str {
        "TransactionLocktimeRule"
    }

    async fn run(&self, ctx: &mut RuleContext) -> Result<(), RuleError> {
        let height = ctx.height();
        let cutoff = ctx.parent.median_time_past();

        if let Some(tx) = ctx
            .block
            .transactions
            .iter()
            .find(|tx| !tx.is_final(height, cutoff))
        {
            return Err(reject(ConsensusError::BadTxnsNonFinal, tx).into());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
