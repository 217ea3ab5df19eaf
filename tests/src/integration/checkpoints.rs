//! # Checkpoints
//!
//! A chain pinned by a checkpoint, and the live enable switch.

use super::fixtures::*;
use cobalt_consensus::{
    CheckpointInfo, Checkpoints, ConsensusApi, ConsensusError, ConsensusSettings, Network,
    SubmitStatus,
};
use proptest::prelude::*;
use std::sync::Arc;

#[tokio::test]
async fn test_checkpoint_pins_chain_until_disabled() {
    // Mine the canonical chain first so its hash can be pinned.
    let unpinned = Chain::regtest();
    let genesis = unpinned.genesis();
    let canonical = unpinned.branch(&genesis, 3, 0);
    let pinned = CheckpointInfo::new(2, canonical[1].0.hash());

    let chain = Chain::regtest_with_checkpoints(vec![pinned]);
    chain.service.submit_block(canonical[0].0.clone()).await.unwrap();

    let impostor = chain.branch(&canonical[0].1, 1, 9);
    let impostor_hash = impostor[0].0.hash();
    assert_eq!(
        rejected_with(chain.service.submit_block(impostor[0].0.clone()).await),
        Some(ConsensusError::CheckpointMismatch)
    );
    assert!(chain.service.invalid_reason(&impostor_hash).is_some());

    for (block, _) in &canonical[1..] {
        chain.service.submit_block(block.clone()).await.unwrap();
    }

    // Branching off below height 2 is refused while the tip is past it.
    let rewrite = chain.branch(&genesis, 5, 7);
    assert_eq!(
        rejected_with(chain.service.submit_block(rewrite[0].0.clone()).await),
        Some(ConsensusError::ForkBeforeCheckpoint)
    );
    assert!(chain.service.invalid_reason(&rewrite[0].0.hash()).is_none());

    // The switch is read on every submission.
    chain.settings.set_checkpoints_enabled(false);
    let mut last = None;
    for (block, _) in &rewrite {
        last = Some(chain.service.submit_block(block.clone()).await.unwrap());
    }
    let outcome = last.unwrap();
    assert_eq!(outcome.status, SubmitStatus::AcceptedNewTip);
    assert_eq!(outcome.tip.hash, rewrite[4].1.hash());

    // The fourth block overtook the pinned chain; the fifth just extended.
    let events = chain.events.get_events();
    let reorg = &events[events.len() - 2];
    assert_eq!(reorg.disconnected.len(), 3);
    assert_eq!(reorg.connected.len(), 4);
    assert_eq!(events[events.len() - 1].connected, vec![rewrite[4].0.hash()]);
}

#[test]
fn test_main_table_follows_switch() {
    let settings = Arc::new(ConsensusSettings::for_network(Network::Main, true));
    let checkpoints = Checkpoints::new(Arc::clone(&settings));
    assert_eq!(checkpoints.last_checkpoint_height(), 43034);
    assert!(checkpoints.get(2016).is_some());

    settings.set_checkpoints_enabled(false);
    assert_eq!(checkpoints.last_checkpoint_height(), 0);
    assert!(checkpoints.get(2016).is_none());
    assert!(checkpoints.is_hardened(2016, &[0u8; 32]));

    let test = Checkpoints::new(Arc::new(ConsensusSettings::for_network(Network::Test, true)));
    assert_eq!(test.last_checkpoint_height(), 0);
}

proptest! {
    #[test]
    fn prop_heights_without_checkpoint_are_hardened(height in 0u64..100_000, byte in any::<u8>()) {
        let settings = Arc::new(ConsensusSettings::for_network(Network::Main, true));
        let checkpoints = Checkpoints::new(settings);
        prop_assume!(checkpoints.get(height).is_none());
        prop_assert!(checkpoints.is_hardened(height, &[byte; 32]));
    }
}
