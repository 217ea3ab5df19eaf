//! # cobalt-consensus
//!
//! Proof-of-work block acceptance for Cobalt.
//!
//! ## Architecture
//!
//! A submitted block passes through an ordered pipeline of
//! [`ConsensusRule`](rules::ConsensusRule)s. Header and structure checks run
//! against the block's intended parent when it arrives; spend checks run
//! against the coin view when the block is connected to the best chain.
//! The heaviest valid chain wins, and every tip change is published to the
//! event bus:
//!
//! ```text
//! submit_block ──→ [checkpoint gate] ──→ [Partial rules] ──→ [chain index]
//!                                                                 │
//!                          heavier? ──→ undo old branch ──→ [Full rules + apply]
//!                                                                 │
//!                                              TipChangedEvent ←──┘
//! ```
//!
//! The engine never owns chain state. It reaches the unspent-output set and
//! block bodies only through the [`CoinView`](ports::CoinView) and
//! [`BlockStore`](ports::BlockStore) ports, and a failure there is never
//! mistaken for an invalid block.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cobalt_consensus::{ConsensusApi, ConsensusDependencies, ConsensusService};
//!
//! let service = ConsensusService::new(ConsensusDependencies {
//!     coin_view,
//!     block_store,
//!     event_bus,
//!     settings: Arc::new(ConsensusSettings::for_network(Network::Regtest, true)),
//!     config: ServiceConfig::default(),
//! });
//!
//! let outcome = service.submit_block(block).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod rules;
pub mod service;

// Re-export main types
pub use adapters::{FixedTimeSource, InMemoryBlockStore, InMemoryCoinView, InMemoryEventBus};
pub use domain::{
    ChainError, ChainHeaderNode, ChainResult, ChainSelector, CheckpointInfo, Checkpoints,
    ConsensusError, ConsensusFailure, ConsensusParams, ConsensusSettings, Network, RuleError,
    ServiceConfig, TipSelection, TipSnapshot,
};
pub use events::TipChangedEvent;
pub use ports::{
    BlockStore, ChainBlock, CoinView, ConsensusApi, EventBus, SubmitOutcome, SubmitStatus,
    TimeSource,
};
pub use rules::{ConsensusRule, RuleContext, RuleRegistry, RuleStage};
pub use service::{ConsensusDependencies, ConsensusService};
