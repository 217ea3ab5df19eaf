//! # Node Runtime
//!
//! Owns the consensus engine and its in-memory collaborators.

use crate::config::NodeConfig;
use crate::miner::{mine_header, BlockTemplateBuilder};
use anyhow::{anyhow, Context, Result};
use cobalt_consensus::ports::SystemTimeSource;
use cobalt_consensus::{
    ConsensusApi, ConsensusDependencies, ConsensusService, ConsensusSettings, InMemoryBlockStore,
    InMemoryCoinView, InMemoryEventBus, SubmitOutcome, TimeSource, TipSnapshot,
};
use cobalt_telemetry::log_block_event;
use shared_types::hash_to_hex;
use std::sync::Arc;
use tracing::{info, warn};

/// Consensus service wired to in-memory chain state.
pub type NodeService = ConsensusService<InMemoryCoinView, InMemoryBlockStore, InMemoryEventBus>;

/// Attempts with fresh timestamps before mining gives up on a height.
const MAX_MINING_ROUNDS: u32 = 16;

/// The main node runtime.
pub struct NodeRuntime {
    config: NodeConfig,
    service: Arc<NodeService>,
    coin_view: Arc<InMemoryCoinView>,
    block_store: Arc<InMemoryBlockStore>,
    event_bus: Arc<InMemoryEventBus>,
    templates: BlockTemplateBuilder,
    clock: Arc<dyn TimeSource>,
}

impl NodeRuntime {
    /// Create a runtime reading the system clock.
    pub fn new(config: NodeConfig) -> Result<Self> {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    /// Create a runtime with a custom clock (for testing).
    pub fn with_time_source(config: NodeConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        config.validate().context("invalid node configuration")?;

        let settings = Arc::new(ConsensusSettings::for_network(
            config.network,
            config.checkpoints,
        ));
        let coin_view = Arc::new(InMemoryCoinView::new());
        let block_store = Arc::new(InMemoryBlockStore::new());
        let event_bus = Arc::new(InMemoryEventBus::new());

        let service = ConsensusService::new(ConsensusDependencies {
            coin_view: Arc::clone(&coin_view),
            block_store: Arc::clone(&block_store),
            event_bus: Arc::clone(&event_bus),
            settings: Arc::clone(&settings),
            config: config.consensus.clone(),
        })
        .with_time_source(Box::new(Arc::clone(&clock)));

        let templates = BlockTemplateBuilder::new(
            Arc::clone(settings.params()),
            config.mining.payout_script_bytes()?,
            &config.mining.coinbase_tag,
        );

        Ok(Self {
            config,
            service: Arc::new(service),
            coin_view,
            block_store,
            event_bus,
            templates,
            clock,
        })
    }

    /// Start the node: report the chain and mine any startup blocks.
    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Cobalt Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let tip = self.service.best_tip().await;
        info!(
            network = %self.config.network,
            checkpoints = self.config.checkpoints,
            check_pow = self.config.consensus.check_pow,
            "Node configured"
        );
        log_block_event!(info, "node", "Chain at genesis", tip.height, hash_to_hex(&tip.hash));

        let blocks = self.config.mining.blocks_on_start;
        if blocks > 0 {
            info!(blocks, "Mining startup blocks");
            for _ in 0..blocks {
                self.mine_block().await?;
            }
        }

        let tip = self.service.best_tip().await;
        log_block_event!(
            info,
            "node",
            "Node ready",
            tip.height,
            hash_to_hex(&tip.hash),
            coins = self.coin_view.len()
        );
        Ok(())
    }

    /// Mine one block on the current tip and submit it.
    pub async fn mine_block(&self) -> Result<SubmitOutcome> {
        let parent = self.service.tip_node();

        for round in 0..MAX_MINING_ROUNDS {
            let now = self.clock.now() + u64::from(round);
            let mut template = self.templates.build(self.service.registry(), &parent, now)?;
            let Some(header) = mine_header(template.block.header) else {
                warn!(height = template.height, round, "Nonce space exhausted, retrying");
                continue;
            };
            template.block.header = header;

            let outcome = self
                .service
                .submit_block(template.block)
                .await
                .with_context(|| {
                    format!("mined block at height {} was not accepted", template.height)
                })?;
            log_block_event!(
                info,
                "miner",
                "Mined block",
                outcome.height,
                hash_to_hex(&outcome.block_hash),
                nonce = header.nonce
            );
            return Ok(outcome);
        }

        Err(anyhow!(
            "no valid nonce found at height {} after {} rounds",
            parent.height() + 1,
            MAX_MINING_ROUNDS
        ))
    }

    /// Current best tip.
    pub async fn tip(&self) -> TipSnapshot {
        self.service.best_tip().await
    }

    pub fn service(&self) -> Arc<NodeService> {
        Arc::clone(&self.service)
    }

    pub fn event_bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn coin_view(&self) -> Arc<InMemoryCoinView> {
        Arc::clone(&self.coin_view)
    }

    pub fn block_store(&self) -> Arc<InMemoryBlockStore> {
        Arc::clone(&self.block_store)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Shutdown the node gracefully.
    pub async fn shutdown(&self) {
        let tip = self.service.best_tip().await;
        let state = self.service.node_state().await;
        log_block_event!(
            info,
            "node",
            "Shutdown complete",
            tip.height,
            hash_to_hex(&tip.hash),
            state = ?state
        );
    }
}
