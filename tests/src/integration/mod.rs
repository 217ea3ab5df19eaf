//! # Integration Tests
//!
//! Each module builds real mined regtest blocks and submits them through
//! [`cobalt_consensus::ConsensusApi`]; no rule is stubbed out.

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod block_acceptance;

#[cfg(test)]
mod checkpoints;

#[cfg(test)]
mod node;

#[cfg(test)]
mod reorg;
