//! # Node Runtime
//!
//! The regtest node mining on its own chain and following a heavier branch
//! submitted from outside.

use super::fixtures::*;
use cobalt_consensus::{BlockStore, ConsensusApi, FixedTimeSource, SubmitStatus};
use cobalt_node::{NodeConfig, NodeRuntime};
use std::sync::Arc;

fn runtime(blocks_on_start: u64) -> NodeRuntime {
    let mut config = NodeConfig::default();
    config.mining.blocks_on_start = blocks_on_start;
    NodeRuntime::with_time_source(config, Arc::new(FixedTimeSource::new(NOW))).unwrap()
}

#[tokio::test]
async fn test_node_follows_heavier_external_branch() {
    let node = runtime(5);
    node.start().await.unwrap();
    let service = node.service();
    let params = Arc::clone(service.settings().params());

    let tip = service.tip_node();
    assert_eq!(tip.height(), 5);
    let fork = tip.ancestor(3).unwrap();

    // Three blocks from height 3 outweigh the node's two.
    let mut parent = Arc::clone(&fork);
    let mut last = None;
    for salt in 0..3 {
        let (block, node_ref) = BlockBuilder::on(&parent, &params).salt(40 + salt).build();
        last = Some(service.submit_block(block).await.unwrap());
        parent = node_ref;
    }
    let outcome = last.unwrap();
    assert_eq!(outcome.status, SubmitStatus::AcceptedNewTip);
    assert_eq!(outcome.tip.height, 6);

    let reorg = node.event_bus().last_event().unwrap();
    assert_eq!(reorg.disconnected.len(), 2);
    assert_eq!(reorg.connected.len(), 3);

    // Mining continues on the adopted branch.
    let mined = node.mine_block().await.unwrap();
    assert_eq!(mined.height, 7);
    assert_eq!(node.tip().await.hash, mined.block_hash);
    assert_eq!(node.coin_view().len(), 7);
}

#[tokio::test]
async fn test_mined_coinbase_pays_configured_script() {
    let mut config = NodeConfig::default();
    config.mining.payout_script = "6a".to_string();
    config.mining.coinbase_tag = "/pool/".to_string();
    let node =
        NodeRuntime::with_time_source(config, Arc::new(FixedTimeSource::new(NOW))).unwrap();

    let mined = node.mine_block().await.unwrap();
    let block = node
        .block_store()
        .get(&mined.block_hash)
        .await
        .unwrap()
        .expect("mined block stored");

    let coinbase = &block.transactions[0];
    assert!(coinbase.inputs[0].script_sig.ends_with(b"/pool/"));
    let coin = node.coin_view().get(&coinbase_outpoint(&block)).unwrap();
    assert_eq!(coin.output.script_pubkey, vec![0x6a]);
    assert_eq!(coin.height, 1);
}
