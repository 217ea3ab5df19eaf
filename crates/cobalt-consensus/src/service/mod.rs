//! Consensus Service - block acceptance and tip management
//!
//! # Flow
//! 1. Refuse if halted, known, remembered as invalid, or orphaned
//! 2. Checkpoint gate
//! 3. `Partial` rules against the intended parent
//! 4. Index the block and pick the heavier tip
//! 5. On a tip change: undo the old branch, then run the `Full` rules and
//!    apply each block of the new branch; roll everything back on failure
//! 6. Commit the tip and publish `TipChangedEvent`
//!
//! Submissions are serialized by one async mutex. Readers only ever see the
//! index as of the last committed tip.

use crate::domain::{
    ChainError, ChainHeaderNode, ChainResult, ChainSelector, Checkpoints, ConsensusError,
    ConsensusFailure, ConsensusSettings, InvalidBlockCache, RuleError, ServiceConfig,
    TipSelection, TipSnapshot,
};
use crate::events::TipChangedEvent;
use crate::ports::{
    BlockStore, ChainBlock, CoinView, ConsensusApi, EventBus, SubmitOutcome, SubmitStatus,
    SystemTimeSource, TimeSource,
};
use crate::rules::{RuleContext, RuleRegistry, RuleStage};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{hash_to_hex, Block, CollaboratorError, Hash, NodeState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Committed chain state.
struct ChainIndex {
    nodes: HashMap<Hash, Arc<ChainHeaderNode>>,
    /// Parent hash to the hashes of its indexed children.
    children: HashMap<Hash, Vec<Hash>>,
    tip: Arc<ChainHeaderNode>,
    invalid: InvalidBlockCache,
    state: NodeState,
}

impl ChainIndex {
    fn insert(&mut self, node: Arc<ChainHeaderNode>) {
        let hash = node.hash();
        if let Some(parent) = node.prev() {
            self.children.entry(parent.hash()).or_default().push(hash);
        }
        self.nodes.insert(hash, node);
    }

    fn remove(&mut self, hash: &Hash) -> Option<Arc<ChainHeaderNode>> {
        let node = self.nodes.remove(hash)?;
        if let Some(parent) = node.prev() {
            let parent_hash = parent.hash();
            if let Some(siblings) = self.children.get_mut(&parent_hash) {
                siblings.retain(|child| child != hash);
                if siblings.is_empty() {
                    self.children.remove(&parent_hash);
                }
            }
        }
        Some(node)
    }

    /// Every indexed block built on `root`, parents before children.
    fn descendants(&self, root: &Hash) -> Vec<Hash> {
        let mut found = Vec::new();
        let mut pending = vec![*root];
        while let Some(hash) = pending.pop() {
            if let Some(children) = self.children.get(&hash) {
                found.extend_from_slice(children);
                pending.extend_from_slice(children);
            }
        }
        found
    }
}

/// Why a reorganization stopped.
enum ConnectFailure {
    /// A connected block broke a rule.
    Invalid { node: Arc<ChainHeaderNode>, failure: ConsensusFailure },
    Collaborator(CollaboratorError),
}

/// Consensus Service
pub struct ConsensusService<C, B, E>
where
    C: CoinView + 'static,
    B: BlockStore,
    E: EventBus,
{
    coin_view: Arc<C>,
    block_store: Arc<B>,
    event_bus: Arc<E>,
    settings: Arc<ConsensusSettings>,
    config: ServiceConfig,
    registry: RuleRegistry,
    checkpoints: Checkpoints,
    index: RwLock<ChainIndex>,
    submit_lock: tokio::sync::Mutex<()>,
    time_source: Box<dyn TimeSource>,
}

/// Dependencies for ConsensusService
pub struct ConsensusDependencies<C, B, E> {
    pub coin_view: Arc<C>,
    pub block_store: Arc<B>,
    pub event_bus: Arc<E>,
    pub settings: Arc<ConsensusSettings>,
    pub config: ServiceConfig,
}

impl<C, B, E> ConsensusService<C, B, E>
where
    C: CoinView + 'static,
    B: BlockStore,
    E: EventBus,
{
    /// Create a service whose chain starts at the network's genesis block.
    pub fn new(deps: ConsensusDependencies<C, B, E>) -> Self {
        let genesis = ChainHeaderNode::genesis(deps.settings.params().genesis.header);
        let mut nodes = HashMap::new();
        nodes.insert(genesis.hash(), Arc::clone(&genesis));

        tracing::info!(
            network = %deps.settings.network(),
            genesis = %hash_to_hex(&genesis.hash()),
            checkpoints = deps.settings.checkpoints_enabled(),
            "[consensus] Chain initialised at genesis"
        );

        Self {
            coin_view: deps.coin_view,
            block_store: deps.block_store,
            event_bus: deps.event_bus,
            checkpoints: Checkpoints::new(Arc::clone(&deps.settings)),
            settings: deps.settings,
            registry: RuleRegistry::standard(),
            index: RwLock::new(ChainIndex {
                nodes,
                children: HashMap::new(),
                tip: genesis,
                invalid: InvalidBlockCache::new(deps.config.max_invalid_cache),
                state: NodeState::Running,
            }),
            config: deps.config,
            submit_lock: tokio::sync::Mutex::new(()),
            time_source: Box::new(SystemTimeSource),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// Replace the rule set.
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the checkpoint table.
    pub fn with_checkpoints(mut self, checkpoints: Checkpoints) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    pub fn settings(&self) -> &Arc<ConsensusSettings> {
        &self.settings
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Failure a block was rejected with, if it is still remembered.
    pub fn invalid_reason(&self, hash: &Hash) -> Option<ConsensusFailure> {
        self.index.read().invalid.get(hash).cloned()
    }

    /// Tip node, for callers that need ancestry (block templates, tests).
    pub fn tip_node(&self) -> Arc<ChainHeaderNode> {
        Arc::clone(&self.index.read().tip)
    }

    async fn submit_locked(&self, block: Block) -> ChainResult<SubmitOutcome> {
        let block = Arc::new(block);
        let hash = block.hash();

        let (parent, tip) = {
            let index = self.index.read();
            if index.state.is_halted() {
                return Err(ChainError::Halted);
            }
            if index.nodes.contains_key(&hash) {
                return Err(ConsensusError::DuplicateBlock.with_detail(hash_to_hex(&hash)).into());
            }
            if let Some(failure) = index.invalid.get(&hash) {
                return Err(ChainError::Rejected(failure.clone()));
            }
            let parent = index
                .nodes
                .get(&block.header.prev_block_hash)
                .cloned()
                .ok_or_else(|| {
                    ConsensusError::BadPrevBlock
                        .with_detail(format!("unknown parent {}", hash_to_hex(&block.header.prev_block_hash)))
                })?;
            (parent, Arc::clone(&index.tip))
        };
        let height = parent.height() + 1;

        self.check_checkpoints(hash, height, &parent, &tip)?;

        let mut ctx = self.context(Arc::clone(&block), Arc::clone(&parent));
        if let Err(err) = self.registry.execute(RuleStage::Partial, &mut ctx, &self.checkpoints).await {
            return Err(self.reject(hash, height, err));
        }

        let node = ChainSelector::try_extend(block.header, &parent)?;
        self.block_store
            .put(Arc::clone(&block))
            .await
            .map_err(ChainError::Collaborator)?;
        self.index.write().insert(Arc::clone(&node));

        let selection = ChainSelector::select_best_tip(&tip, &node);
        if !selection.is_tip_change() {
            tracing::debug!(
                block_hash = %hash_to_hex(&hash),
                height,
                "[consensus] Block accepted on side branch"
            );
            return Ok(SubmitOutcome {
                status: SubmitStatus::AcceptedSideBranch,
                block_hash: hash,
                height,
                tip: TipSnapshot::from(tip.as_ref()),
            });
        }

        self.reorganize(&selection, &node).await?;
        self.commit_tip(&selection).await;

        Ok(SubmitOutcome {
            status: SubmitStatus::AcceptedNewTip,
            block_hash: hash,
            height,
            tip: TipSnapshot::from(selection.new_tip.as_ref()),
        })
    }

    fn check_checkpoints(
        &self,
        hash: Hash,
        height: u64,
        parent: &Arc<ChainHeaderNode>,
        tip: &Arc<ChainHeaderNode>,
    ) -> ChainResult<()> {
        if !self.checkpoints.is_hardened(height, &hash) {
            let failure = ConsensusError::CheckpointMismatch
                .with_detail(format!("block {} at height {}", hash_to_hex(&hash), height));
            self.remember_invalid(hash, &failure);
            return Err(ChainError::Rejected(failure));
        }

        let reached = self.checkpoints.last_checkpoint_at_or_below(tip.height());
        if reached == 0 {
            return Ok(());
        }
        let fork_height = ChainHeaderNode::find_fork(parent, tip)
            .map(|fork| fork.height())
            .unwrap_or(0);
        if fork_height < reached {
            return Err(ConsensusError::ForkBeforeCheckpoint
                .with_detail(format!("fork at {} below checkpoint {}", fork_height, reached))
                .into());
        }
        Ok(())
    }

    fn context(&self, block: Arc<Block>, parent: Arc<ChainHeaderNode>) -> RuleContext {
        let tip = TipSnapshot::from(self.index.read().tip.as_ref());
        let coin_view: Arc<dyn CoinView> = Arc::clone(&self.coin_view) as Arc<dyn CoinView>;
        RuleContext::new(
            block,
            parent,
            tip,
            Arc::clone(self.settings.params()),
            self.time_source.now(),
        )
        .with_check_pow(self.config.check_pow)
        .with_coin_view(coin_view)
    }

    /// Turn a rule failure into the caller's error, remembering consensus
    /// rejections.
    fn reject(&self, hash: Hash, height: u64, err: RuleError) -> ChainError {
        match err {
            RuleError::Consensus(failure) => {
                tracing::warn!(
                    block_hash = %hash_to_hex(&hash),
                    height,
                    code = failure.error.code(),
                    reason = %failure,
                    "[consensus] Block rejected"
                );
                self.remember_invalid(hash, &failure);
                ChainError::Rejected(failure)
            }
            RuleError::Collaborator(inner) => {
                tracing::warn!(
                    block_hash = %hash_to_hex(&hash),
                    height,
                    error = %inner,
                    "[consensus] Block could not be evaluated"
                );
                ChainError::Collaborator(inner)
            }
        }
    }

    fn remember_invalid(&self, hash: Hash, failure: &ConsensusFailure) {
        if failure.error.is_mutation() {
            return;
        }
        self.index.write().invalid.insert(hash, failure.clone());
    }

    async fn load(&self, nodes: &[Arc<ChainHeaderNode>]) -> Result<Vec<ChainBlock>, CollaboratorError> {
        let mut blocks = Vec::with_capacity(nodes.len());
        for node in nodes {
            let block = self.block_store.get(&node.hash()).await?.ok_or_else(|| {
                CollaboratorError::NotFound(format!("block body {}", hash_to_hex(&node.hash())))
            })?;
            blocks.push(ChainBlock::new(node.height(), block));
        }
        Ok(blocks)
    }

    /// Move the coin view from the old branch to the new one, or leave it
    /// exactly where it was.
    async fn reorganize(&self, selection: &TipSelection, submitted: &Arc<ChainHeaderNode>) -> ChainResult<()> {
        let loaded = match self.load(&selection.disconnected).await {
            Ok(disconnected) => self.load(&selection.connected).await.map(|c| (disconnected, c)),
            Err(err) => Err(err),
        };
        let (disconnected, connected) = match loaded {
            Ok(blocks) => blocks,
            Err(err) => {
                self.forget(submitted);
                return Err(ChainError::Collaborator(err));
            }
        };

        let mut undone = 0;
        let mut applied = 0;
        let mut failure = None;

        for block in &disconnected {
            if let Err(err) = self.coin_view.undo(std::slice::from_ref(block)).await {
                failure = Some(ConnectFailure::Collaborator(err));
                break;
            }
            undone += 1;
        }

        if failure.is_none() {
            for (node, block) in selection.connected.iter().zip(&connected) {
                if let Err(err) = self.connect(node, block).await {
                    failure = Some(err);
                    break;
                }
                applied += 1;
            }
        }

        let Some(failure) = failure else {
            return Ok(());
        };

        self.roll_back(&disconnected[..undone], &connected[..applied]).await?;

        match failure {
            ConnectFailure::Invalid { node, failure } => {
                let hash = node.hash();
                tracing::warn!(
                    block_hash = %hash_to_hex(&hash),
                    height = node.height(),
                    code = failure.error.code(),
                    reason = %failure,
                    "[consensus] Block failed on connect"
                );
                self.evict_invalid(&node, &failure);
                let own = self
                    .invalid_reason(&submitted.hash())
                    .unwrap_or(failure);
                Err(ChainError::Rejected(own))
            }
            ConnectFailure::Collaborator(err) => {
                tracing::warn!(
                    block_hash = %hash_to_hex(&submitted.hash()),
                    error = %err,
                    "[consensus] Reorganization aborted by collaborator failure"
                );
                self.forget(submitted);
                Err(ChainError::Collaborator(err))
            }
        }
    }

    /// Run the `Full` rules for one block and apply it.
    async fn connect(&self, node: &Arc<ChainHeaderNode>, block: &ChainBlock) -> Result<(), ConnectFailure> {
        let Some(parent) = node.prev().cloned() else {
            return Err(ConnectFailure::Collaborator(CollaboratorError::Corrupted(
                "connect set contains a genesis node".into(),
            )));
        };

        let mut ctx = self.context(Arc::clone(&block.block), parent);
        match self.registry.execute(RuleStage::Full, &mut ctx, &self.checkpoints).await {
            Ok(()) => {}
            Err(RuleError::Consensus(failure)) => {
                return Err(ConnectFailure::Invalid {
                    node: Arc::clone(node),
                    failure,
                })
            }
            Err(RuleError::Collaborator(err)) => return Err(ConnectFailure::Collaborator(err)),
        }

        self.coin_view
            .apply(std::slice::from_ref(block))
            .await
            .map_err(ConnectFailure::Collaborator)
    }

    /// Undo what a failed reorganization applied and re-apply what it undid.
    async fn roll_back(&self, undone: &[ChainBlock], applied: &[ChainBlock]) -> ChainResult<()> {
        let mut reverted: Vec<ChainBlock> = applied.to_vec();
        reverted.reverse();
        let mut restored: Vec<ChainBlock> = undone.to_vec();
        restored.reverse();

        let result = match self.coin_view.undo(&reverted).await {
            Ok(()) => self.coin_view.apply(&restored).await,
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            tracing::error!(
                error = %err,
                "[consensus] Rollback failed, halting until operator intervention"
            );
            self.index.write().state = NodeState::HaltedAwaitingIntervention;
            return Err(ChainError::Invariant(format!("rollback failed: {}", err)));
        }
        Ok(())
    }

    /// Drop `invalid` and everything built on it from the index and remember
    /// them. Descendants are rejected as having an invalid parent.
    fn evict_invalid(&self, invalid: &Arc<ChainHeaderNode>, failure: &ConsensusFailure) {
        let mut index = self.index.write();
        let root = invalid.hash();
        let descendants = index.descendants(&root);

        index.remove(&root);
        index.invalid.insert(root, failure.clone());
        for hash in descendants {
            index.remove(&hash);
            let inherited = ConsensusError::BadPrevBlock
                .with_detail(format!("descends from invalid block {}", hash_to_hex(&root)));
            index.invalid.insert(hash, inherited);
        }
    }

    /// Remove a block that could not be evaluated so it can be resubmitted.
    fn forget(&self, node: &Arc<ChainHeaderNode>) {
        self.index.write().remove(&node.hash());
    }

    async fn commit_tip(&self, selection: &TipSelection) {
        let new_tip = &selection.new_tip;
        self.index.write().tip = Arc::clone(new_tip);

        if selection.is_reorg() {
            crate::metrics::record_reorg();
            tracing::info!(
                tip = %hash_to_hex(&new_tip.hash()),
                height = new_tip.height(),
                disconnected = selection.disconnected.len(),
                connected = selection.connected.len(),
                "[consensus] Chain reorganized"
            );
        } else {
            tracing::info!(
                tip = %hash_to_hex(&new_tip.hash()),
                height = new_tip.height(),
                "[consensus] New best tip"
            );
        }

        let event = TipChangedEvent::new(
            new_tip,
            &selection.disconnected,
            &selection.connected,
            self.time_source.now(),
        );
        if let Err(err) = self.event_bus.publish_tip_changed(event).await {
            tracing::warn!(error = %err, "[consensus] Failed to publish tip change");
        }
    }
}

#[async_trait]
impl<C, B, E> ConsensusApi for ConsensusService<C, B, E>
where
    C: CoinView + 'static,
    B: BlockStore + 'static,
    E: EventBus + 'static,
{
    async fn submit_block(&self, block: Block) -> ChainResult<SubmitOutcome> {
        let started = Instant::now();
        let _guard = self.submit_lock.lock().await;

        let result = self.submit_locked(block).await;
        match &result {
            Ok(_) => crate::metrics::record_block_accepted(),
            Err(ChainError::Rejected(failure)) => crate::metrics::record_block_rejected(failure.error.code()),
            Err(_) => {}
        }
        crate::metrics::record_validation_latency(started.elapsed().as_secs_f64());
        result
    }

    async fn best_tip(&self) -> TipSnapshot {
        TipSnapshot::from(self.index.read().tip.as_ref())
    }

    async fn is_known(&self, hash: Hash) -> bool {
        self.index.read().nodes.contains_key(&hash)
    }

    async fn node_state(&self) -> NodeState {
        self.index.read().state
    }
}
