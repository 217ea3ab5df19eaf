//! Coin view adapter
//!
//! Keeps the unspent-output set in memory, with per-block undo data so
//! reorganizations can be reversed exactly.

use crate::ports::{ChainBlock, CoinView};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{hash_to_hex, Block, Coin, CollaboratorError, Hash, OutPoint, Transaction, UnspentOutputs};
use std::collections::HashMap;

#[derive(Default)]
struct CoinState {
    coins: HashMap<OutPoint, Coin>,
    /// Coins each applied block spent, in spend order.
    undo: HashMap<Hash, Vec<(OutPoint, Coin)>>,
}

impl CoinState {
    fn apply_block(&mut self, height: u64, block: &Block) -> Result<(), CollaboratorError> {
        let hash = block.hash();
        let mut created: HashMap<OutPoint, Coin> = HashMap::new();
        let mut spent = Vec::new();

        // Resolve every spend before touching the set so a bad block leaves
        // it unchanged.
        for tx in &block.transactions {
            if !tx.is_coinbase() {
                for input in &tx.inputs {
                    let coin = created
                        .remove(&input.prev_out)
                        .or_else(|| {
                            if spent.iter().any(|(op, _)| *op == input.prev_out) {
                                None
                            } else {
                                self.coins.get(&input.prev_out).cloned()
                            }
                        })
                        .ok_or_else(|| {
                            CollaboratorError::Corrupted(format!(
                                "block {} spends unknown output {}:{}",
                                hash_to_hex(&hash),
                                hash_to_hex(&input.prev_out.txid),
                                input.prev_out.vout
                            ))
                        })?;
                    spent.push((input.prev_out, coin));
                }
            }
            for (outpoint, coin) in outputs(tx, height) {
                created.insert(outpoint, coin);
            }
        }

        // Coins created and spent inside the block never reach the set, and
        // their undo entries must not be restored.
        let block_txids: Vec<Hash> = block.transactions.iter().map(Transaction::txid).collect();
        spent.retain(|(op, _)| !block_txids.contains(&op.txid));

        for (outpoint, _) in &spent {
            self.coins.remove(outpoint);
        }
        self.coins.extend(created);
        self.undo.insert(hash, spent);
        Ok(())
    }

    fn undo_block(&mut self, block: &Block) -> Result<(), CollaboratorError> {
        let hash = block.hash();
        let spent = self.undo.remove(&hash).ok_or_else(|| {
            CollaboratorError::NotFound(format!("undo data for block {}", hash_to_hex(&hash)))
        })?;

        for tx in &block.transactions {
            let txid = tx.txid();
            for vout in 0..tx.outputs.len() {
                self.coins.remove(&OutPoint::new(txid, vout as u32));
            }
        }
        self.coins.extend(spent);
        Ok(())
    }
}

fn outputs(tx: &Transaction, height: u64) -> impl Iterator<Item = (OutPoint, Coin)> + '_ {
    let txid = tx.txid();
    let is_coinbase = tx.is_coinbase();
    tx.outputs.iter().enumerate().map(move |(vout, output)| {
        (
            OutPoint::new(txid, vout as u32),
            Coin {
                output: output.clone(),
                height,
                is_coinbase,
            },
        )
    })
}

/// In-memory unspent-output set.
///
/// The genesis block is never applied; its outputs are unspendable.
#[derive(Default)]
pub struct InMemoryCoinView {
    state: RwLock<CoinState>,
}

impl InMemoryCoinView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a coin directly.
    pub fn insert(&self, outpoint: OutPoint, coin: Coin) {
        self.state.write().coins.insert(outpoint, coin);
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<Coin> {
        self.state.read().coins.get(outpoint).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().coins.is_empty()
    }
}

#[async_trait]
impl CoinView for InMemoryCoinView {
    async fn fetch_inputs(&self, tx: &Transaction) -> Result<UnspentOutputs, CollaboratorError> {
        let state = self.state.read();
        Ok(UnspentOutputs::new(
            tx.inputs
                .iter()
                .map(|input| state.coins.get(&input.prev_out).cloned())
                .collect(),
        ))
    }

    async fn apply(&self, blocks: &[ChainBlock]) -> Result<(), CollaboratorError> {
        let mut state = self.state.write();
        for entry in blocks {
            state.apply_block(entry.height, &entry.block)?;
        }
        Ok(())
    }

    async fn undo(&self, blocks: &[ChainBlock]) -> Result<(), CollaboratorError> {
        let mut state = self.state.write();
        for entry in blocks {
            state.undo_block(&entry.block)?;
        }
        Ok(())
    }
}
