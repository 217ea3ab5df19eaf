//! # Test Fixtures
//!
//! A regtest consensus service on in-memory collaborators, and a builder for
//! mined blocks on arbitrary parents.

use cobalt_consensus::{
    ChainError, ChainHeaderNode, ChainResult, CheckpointInfo, Checkpoints, ConsensusApi,
    ConsensusDependencies, ConsensusError, ConsensusParams, ConsensusService, ConsensusSettings,
    FixedTimeSource, InMemoryBlockStore, InMemoryCoinView, InMemoryEventBus, Network,
    ServiceConfig, SubmitOutcome,
};
use primitive_types::U256;
use shared_types::script::{height_script, OP_TRUE};
use shared_types::{
    block_merkle_root, hash_to_target, Amount, Block, BlockHeader, CompactTarget, OutPoint,
    Transaction, TxIn, TxOut,
};
use std::sync::Arc;

pub type Service = ConsensusService<InMemoryCoinView, InMemoryBlockStore, InMemoryEventBus>;

/// Fixed "now" for every fixture service; far ahead of regtest genesis.
pub const NOW: u64 = 2_000_000_000;

/// Seconds between fixture blocks.
pub const SPACING: u32 = 600;

pub struct Chain {
    pub service: Service,
    pub coin_view: Arc<InMemoryCoinView>,
    pub block_store: Arc<InMemoryBlockStore>,
    pub events: Arc<InMemoryEventBus>,
    pub settings: Arc<ConsensusSettings>,
    pub params: Arc<ConsensusParams>,
}

impl Chain {
    /// Regtest chain using the compiled (empty) checkpoint table.
    pub fn regtest() -> Self {
        Self::build(None)
    }

    /// Regtest chain enforcing `entries` as its checkpoints.
    pub fn regtest_with_checkpoints(entries: Vec<CheckpointInfo>) -> Self {
        Self::build(Some(entries))
    }

    fn build(entries: Option<Vec<CheckpointInfo>>) -> Self {
        let settings = Arc::new(ConsensusSettings::for_network(Network::Regtest, true));
        let coin_view = Arc::new(InMemoryCoinView::new());
        let block_store = Arc::new(InMemoryBlockStore::new());
        let events = Arc::new(InMemoryEventBus::new());

        let mut service = ConsensusService::new(ConsensusDependencies {
            coin_view: Arc::clone(&coin_view),
            block_store: Arc::clone(&block_store),
            event_bus: Arc::clone(&events),
            settings: Arc::clone(&settings),
            config: ServiceConfig::default(),
        })
        .with_time_source(Box::new(FixedTimeSource::new(NOW)));
        if let Some(entries) = entries {
            service =
                service.with_checkpoints(Checkpoints::with_entries(Arc::clone(&settings), entries));
        }

        Self {
            params: Arc::clone(settings.params()),
            service,
            coin_view,
            block_store,
            events,
            settings,
        }
    }

    pub fn genesis(&self) -> Arc<ChainHeaderNode> {
        ChainHeaderNode::genesis(self.params.genesis.header)
    }

    pub fn tip(&self) -> Arc<ChainHeaderNode> {
        self.service.tip_node()
    }

    /// Mine `count` coinbase-only blocks on `parent` without submitting them.
    pub fn branch(
        &self,
        parent: &Arc<ChainHeaderNode>,
        count: usize,
        salt: u8,
    ) -> Vec<(Block, Arc<ChainHeaderNode>)> {
        let mut out = Vec::with_capacity(count);
        let mut tip = Arc::clone(parent);
        for _ in 0..count {
            let (block, node) = BlockBuilder::on(&tip, &self.params).salt(salt).build();
            tip = Arc::clone(&node);
            out.push((block, node));
        }
        out
    }

    /// Mine and submit `count` blocks on the current tip.
    pub async fn extend(&self, count: usize) -> Vec<Block> {
        let branch = self.branch(&self.tip(), count, 0);
        let mut blocks = Vec::with_capacity(count);
        for (block, _) in branch {
            self.service
                .submit_block(block.clone())
                .await
                .expect("fixture block accepted");
            blocks.push(block);
        }
        blocks
    }
}

pub fn coinbase(height: u64, value: Amount, salt: u8) -> Transaction {
    let mut script_sig = height_script(height);
    script_sig.extend_from_slice(b"/fixture/");
    script_sig.push(salt);
    Transaction {
        version: 1,
        inputs: vec![TxIn::new(OutPoint::null(), script_sig)],
        outputs: vec![TxOut::new(value, vec![OP_TRUE])],
        lock_time: 0,
    }
}

pub fn spend(prev: OutPoint, value: Amount) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![TxIn::new(prev, vec![OP_TRUE])],
        outputs: vec![TxOut::new(value, vec![OP_TRUE])],
        lock_time: 0,
    }
}

pub fn coinbase_outpoint(block: &Block) -> OutPoint {
    OutPoint::new(block.transactions[0].txid(), 0)
}

/// Grind the nonce until the header hash meets `target`.
pub fn mine_to(block: &mut Block, target: U256) {
    while hash_to_target(&block.header.hash()) > target {
        block.header.nonce += 1;
    }
}

/// Builder for a mined child of `parent`.
pub struct BlockBuilder {
    parent: Arc<ChainHeaderNode>,
    params: Arc<ConsensusParams>,
    time: u32,
    bits: u32,
    salt: u8,
    coinbase_value: Option<Amount>,
    transactions: Vec<Transaction>,
}

impl BlockBuilder {
    pub fn on(parent: &Arc<ChainHeaderNode>, params: &Arc<ConsensusParams>) -> Self {
        Self {
            parent: Arc::clone(parent),
            params: Arc::clone(params),
            time: parent.header().time + SPACING,
            bits: params.pow_limit_bits(),
            salt: 0,
            coinbase_value: None,
            transactions: Vec::new(),
        }
    }

    pub fn time(mut self, time: u32) -> Self {
        self.time = time;
        self
    }

    pub fn bits(mut self, bits: u32) -> Self {
        self.bits = bits;
        self
    }

    /// Distinguishes sibling blocks that would otherwise be identical.
    pub fn salt(mut self, salt: u8) -> Self {
        self.salt = salt;
        self
    }

    pub fn coinbase_value(mut self, value: Amount) -> Self {
        self.coinbase_value = Some(value);
        self
    }

    pub fn tx(mut self, tx: Transaction) -> Self {
        self.transactions.push(tx);
        self
    }

    /// Build and mine. Blocks whose bits decode to no usable target are
    /// mined against the pow limit instead.
    pub fn build(self) -> (Block, Arc<ChainHeaderNode>) {
        let height = self.parent.height() + 1;
        let value = self
            .coinbase_value
            .unwrap_or_else(|| self.params.block_subsidy(height));

        let mut transactions = vec![coinbase(height, value, self.salt)];
        transactions.extend(self.transactions);

        let mut block = Block::new(
            BlockHeader {
                version: 4,
                prev_block_hash: self.parent.hash(),
                merkle_root: [0u8; 32],
                time: self.time,
                bits: self.bits,
                nonce: 0,
            },
            transactions,
        );
        block.header.merkle_root = block_merkle_root(&block).0;

        let target = CompactTarget::from_bits(self.bits)
            .valid_target()
            .map_or(self.params.pow_limit, |t| t.min(self.params.pow_limit));
        mine_to(&mut block, target);

        let node = ChainHeaderNode::extend(&self.parent, block.header);
        (block, node)
    }
}

/// The consensus kind a submission was rejected with.
pub fn rejected_with(result: ChainResult<SubmitOutcome>) -> Option<ConsensusError> {
    match result {
        Err(ChainError::Rejected(failure)) => Some(failure.error),
        _ => None,
    }
}
