//! Domain layer for the consensus engine
//!
//! - chain_node: immutable header ancestry with derived height and work
//! - params: per-network constants and the live checkpoint switch
//! - checkpoints: compiled known-good blocks
//! - work: next-work (difficulty retarget) computation
//! - selector: fork choice and reorg planning
//! - invalid_cache: bounded memory of rejected blocks

mod chain_node;
mod checkpoints;
mod config;
mod error;
mod invalid_cache;
mod params;
mod selector;
mod work;

pub use chain_node::*;
pub use checkpoints::*;
pub use config::*;
pub use error::*;
pub use invalid_cache::*;
pub use params::*;
pub use selector::*;
pub use work::*;
