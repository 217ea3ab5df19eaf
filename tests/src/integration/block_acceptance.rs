//! # Block Acceptance
//!
//! Submitting blocks to a regtest chain: the difficulty-bits boundary, time
//! bounds, coinbase maturity and fee accounting, and the rejection cache.

use super::fixtures::*;
use cobalt_consensus::domain::MAX_FUTURE_BLOCK_TIME;
use cobalt_consensus::{ConsensusApi, ConsensusError, SubmitStatus};
use shared_types::{OutPoint, COIN};

#[tokio::test]
async fn test_wrong_bits_rejected_then_corrected_block_extends_chain() {
    let chain = Chain::regtest();
    chain.extend(2).await;
    let parent = chain.tip();
    assert_eq!(parent.height(), 2);

    let required = chain.params.pow_limit_bits();
    for bits in [required + 1, required - 1] {
        let (block, _) = BlockBuilder::on(&parent, &chain.params).bits(bits).build();
        assert_eq!(
            rejected_with(chain.service.submit_block(block).await),
            Some(ConsensusError::BadDiffBits),
            "bits {bits:08x} accepted"
        );
    }
    assert_eq!(chain.service.best_tip().await.hash, parent.hash());

    let (block, _) = BlockBuilder::on(&parent, &chain.params).bits(required).build();
    let outcome = chain.service.submit_block(block).await.unwrap();
    assert_eq!(outcome.status, SubmitStatus::AcceptedNewTip);
    assert_eq!(outcome.tip.height, parent.height() + 1);
}

#[tokio::test]
async fn test_time_bounds() {
    let chain = Chain::regtest();
    chain.extend(2).await;
    let parent = chain.tip();
    let mtp = parent.median_time_past() as u32;

    let (at_mtp, _) = BlockBuilder::on(&parent, &chain.params).time(mtp).build();
    assert_eq!(
        rejected_with(chain.service.submit_block(at_mtp).await),
        Some(ConsensusError::TimeTooOld)
    );

    let limit = (NOW + MAX_FUTURE_BLOCK_TIME) as u32;
    let (too_new, _) = BlockBuilder::on(&parent, &chain.params)
        .time(limit + 1)
        .build();
    assert_eq!(
        rejected_with(chain.service.submit_block(too_new).await),
        Some(ConsensusError::TimeTooNew)
    );

    let (at_limit, _) = BlockBuilder::on(&parent, &chain.params).time(limit).build();
    chain.service.submit_block(at_limit).await.unwrap();

    let (after_mtp, _) = BlockBuilder::on(&parent, &chain.params)
        .time(mtp + 1)
        .salt(1)
        .build();
    let outcome = chain.service.submit_block(after_mtp).await.unwrap();
    assert_eq!(outcome.status, SubmitStatus::AcceptedSideBranch);
}

#[tokio::test]
async fn test_coinbase_maturity_and_fees() {
    let chain = Chain::regtest();
    let blocks = chain.extend(100).await;
    let tip = chain.tip();
    let subsidy = chain.params.block_subsidy(tip.height() + 1);

    // Height 2's coinbase is 99 blocks deep from height 101.
    let immature = spend(coinbase_outpoint(&blocks[1]), 49 * COIN);
    let (block, _) = BlockBuilder::on(&tip, &chain.params).tx(immature).build();
    assert_eq!(
        rejected_with(chain.service.submit_block(block).await),
        Some(ConsensusError::BadTxnsPrematureSpendOfCoinbase)
    );

    let matured = coinbase_outpoint(&blocks[0]);
    let payment = spend(matured, 49 * COIN);
    let fee = COIN;

    let (greedy, _) = BlockBuilder::on(&tip, &chain.params)
        .coinbase_value(subsidy + fee + 1)
        .tx(payment.clone())
        .build();
    assert_eq!(
        rejected_with(chain.service.submit_block(greedy).await),
        Some(ConsensusError::BadCoinbaseAmount)
    );

    let (block, _) = BlockBuilder::on(&tip, &chain.params)
        .coinbase_value(subsidy + fee)
        .tx(payment.clone())
        .build();
    let coinbase_txid = block.transactions[0].txid();
    chain.service.submit_block(block).await.unwrap();

    assert!(chain.coin_view.get(&matured).is_none());
    let paid = chain.coin_view.get(&OutPoint::new(payment.txid(), 0)).unwrap();
    assert_eq!(paid.output.value, 49 * COIN);
    let reward = chain.coin_view.get(&OutPoint::new(coinbase_txid, 0)).unwrap();
    assert_eq!(reward.output.value, subsidy + fee);
    assert!(reward.is_coinbase);
}

#[tokio::test]
async fn test_in_block_double_spend_is_rejected_and_remembered() {
    let chain = Chain::regtest();
    let blocks = chain.extend(101).await;
    let tip = chain.tip();

    let outpoint = coinbase_outpoint(&blocks[0]);
    let (block, _) = BlockBuilder::on(&tip, &chain.params)
        .tx(spend(outpoint, 20 * COIN))
        .tx(spend(outpoint, 21 * COIN))
        .build();
    let hash = block.hash();

    assert_eq!(
        rejected_with(chain.service.submit_block(block.clone()).await),
        Some(ConsensusError::BadTxnsInputsMissingOrSpent)
    );
    assert_eq!(
        chain.service.invalid_reason(&hash).map(|f| f.error),
        Some(ConsensusError::BadTxnsInputsMissingOrSpent)
    );
    // Served from the cache the second time.
    assert_eq!(
        rejected_with(chain.service.submit_block(block).await),
        Some(ConsensusError::BadTxnsInputsMissingOrSpent)
    );
    assert_eq!(chain.service.best_tip().await.hash, tip.hash());
    assert!(chain.coin_view.get(&outpoint).is_some());
}

#[tokio::test]
async fn test_mutated_body_does_not_poison_header() {
    let chain = Chain::regtest();
    let tip = chain.tip();
    let (block, _) = BlockBuilder::on(&tip, &chain.params).build();

    let mut mutated = block.clone();
    mutated.transactions[0].outputs[0].value -= 1;
    assert_eq!(mutated.hash(), block.hash());
    assert_eq!(
        rejected_with(chain.service.submit_block(mutated).await),
        Some(ConsensusError::BadMerkleRoot)
    );
    assert!(chain.service.invalid_reason(&block.hash()).is_none());

    let outcome = chain.service.submit_block(block).await.unwrap();
    assert_eq!(outcome.status, SubmitStatus::AcceptedNewTip);
}

#[tokio::test]
async fn test_unknown_parent_is_not_remembered() {
    let chain = Chain::regtest();
    let detached = chain.branch(&chain.genesis(), 2, 7);
    let (orphan, _) = &detached[1];

    assert_eq!(
        rejected_with(chain.service.submit_block(orphan.clone()).await),
        Some(ConsensusError::BadPrevBlock)
    );
    assert!(chain.service.invalid_reason(&orphan.hash()).is_none());

    chain.service.submit_block(detached[0].0.clone()).await.unwrap();
    let outcome = chain.service.submit_block(orphan.clone()).await.unwrap();
    assert_eq!(outcome.height, 2);
}
