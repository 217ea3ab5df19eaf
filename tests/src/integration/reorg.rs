//! # Reorganization
//!
//! Switching between competing branches and replaying the change on the
//! coin view.

use super::fixtures::*;
use cobalt_consensus::{ConsensusApi, ConsensusError, SubmitStatus, TipChangedEvent};
use shared_types::{OutPoint, COIN};

#[tokio::test]
async fn test_heavier_branch_replays_coin_view() {
    let chain = Chain::regtest();
    let mature = chain.extend(101).await;
    let fork = chain.tip();
    assert_eq!(chain.coin_view.len(), 101);

    // Branch A: two blocks, the first spends a matured coinbase.
    let spent = coinbase_outpoint(&mature[0]);
    let payment = spend(spent, 50 * COIN);
    let (a1, a1_node) = BlockBuilder::on(&fork, &chain.params).tx(payment.clone()).build();
    let (a2, _) = BlockBuilder::on(&a1_node, &chain.params).build();
    chain.service.submit_block(a1.clone()).await.unwrap();
    chain.service.submit_block(a2.clone()).await.unwrap();
    assert!(chain.coin_view.get(&spent).is_none());
    assert!(chain.coin_view.get(&OutPoint::new(payment.txid(), 0)).is_some());

    // Branch B: three empty blocks from the same fork point.
    let branch_b = chain.branch(&fork, 3, 1);
    let mut statuses = Vec::new();
    for (block, _) in &branch_b {
        let outcome = chain.service.submit_block(block.clone()).await.unwrap();
        statuses.push(outcome.status);
    }
    assert_eq!(
        statuses,
        vec![
            SubmitStatus::AcceptedSideBranch,
            SubmitStatus::AcceptedSideBranch,
            SubmitStatus::AcceptedNewTip,
        ]
    );

    let tip = chain.service.best_tip().await;
    assert_eq!(tip.hash, branch_b[2].1.hash());
    assert_eq!(tip.height, fork.height() + 3);

    let event: TipChangedEvent = chain.events.last_event().unwrap();
    assert_eq!(event.disconnected, vec![a2.hash(), a1.hash()]);
    assert_eq!(
        event.connected,
        branch_b.iter().map(|(b, _)| b.hash()).collect::<Vec<_>>()
    );

    // A's spend is undone and its outputs are gone; B's coinbases exist.
    assert!(chain.coin_view.get(&spent).is_some());
    assert!(chain.coin_view.get(&OutPoint::new(payment.txid(), 0)).is_none());
    assert!(chain.coin_view.get(&coinbase_outpoint(&a1)).is_none());
    assert!(chain.coin_view.get(&coinbase_outpoint(&a2)).is_none());
    for (block, _) in &branch_b {
        assert!(chain.coin_view.get(&coinbase_outpoint(block)).is_some());
    }
    assert_eq!(chain.coin_view.len(), 104);
}

#[tokio::test]
async fn test_equal_work_keeps_first_seen_tip() {
    let chain = Chain::regtest();
    let genesis = chain.genesis();
    let first = chain.branch(&genesis, 2, 1);
    let second = chain.branch(&genesis, 2, 2);

    for (block, _) in first.iter().chain(second.iter()) {
        chain.service.submit_block(block.clone()).await.unwrap();
    }

    assert_eq!(chain.service.best_tip().await.hash, first[1].1.hash());
    assert_eq!(chain.events.event_count(), 2);
    assert!(chain.service.is_known(second[1].1.hash()).await);
}

#[tokio::test]
async fn test_invalid_block_in_heavier_branch_keeps_current_chain() {
    let chain = Chain::regtest();
    let mature = chain.extend(101).await;
    let fork = chain.tip();

    let payment = spend(coinbase_outpoint(&mature[0]), 50 * COIN);
    let (a1, _) = BlockBuilder::on(&fork, &chain.params).tx(payment.clone()).build();
    chain.service.submit_block(a1.clone()).await.unwrap();
    let events_before = chain.events.event_count();

    // B1 is fine; B2 spends an output that never existed.
    let (b1, b1_node) = BlockBuilder::on(&fork, &chain.params).salt(1).build();
    let (b2, b2_node) = BlockBuilder::on(&b1_node, &chain.params)
        .salt(1)
        .tx(spend(OutPoint::new([0xee; 32], 0), COIN))
        .build();
    let (b3, _) = BlockBuilder::on(&b2_node, &chain.params).salt(1).build();

    chain.service.submit_block(b1.clone()).await.unwrap();
    assert_eq!(
        rejected_with(chain.service.submit_block(b2.clone()).await),
        Some(ConsensusError::BadTxnsInputsMissingOrSpent)
    );

    // Nothing moved: same tip, same coins, no event.
    assert_eq!(chain.service.best_tip().await.hash, a1.hash());
    assert!(chain.coin_view.get(&OutPoint::new(payment.txid(), 0)).is_some());
    assert!(chain.coin_view.get(&coinbase_outpoint(&b1)).is_none());
    assert_eq!(chain.events.event_count(), events_before);

    // B1 stays a valid side branch; B2 is gone and remembered.
    assert!(chain.service.is_known(b1.hash()).await);
    assert!(!chain.service.is_known(b2.hash()).await);
    assert_eq!(
        chain.service.invalid_reason(&b2.hash()).map(|f| f.error),
        Some(ConsensusError::BadTxnsInputsMissingOrSpent)
    );
    assert_eq!(
        rejected_with(chain.service.submit_block(b3).await),
        Some(ConsensusError::BadPrevBlock)
    );
}
