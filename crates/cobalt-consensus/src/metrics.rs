//! # Consensus Metrics
//!
//! Prometheus metrics for the block acceptance path.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! cobalt-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `cobalt_blocks_accepted_total` - Blocks that entered the index
//! - `cobalt_blocks_rejected_total` - Rejected blocks, labeled by reject code
//! - `cobalt_reorgs_total` - Tip changes that disconnected blocks
//! - `cobalt_validation_latency_seconds` - Time spent in `submit_block`

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref BLOCKS_ACCEPTED: IntCounter = register_int_counter!(
        "cobalt_blocks_accepted_total",
        "Total number of blocks accepted into the chain index"
    )
    .expect("Failed to create BLOCKS_ACCEPTED metric");

    /// Labeled by stable reject code
    pub static ref BLOCKS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "cobalt_blocks_rejected_total",
        "Total number of blocks rejected",
        &["code"]
    )
    .expect("Failed to create BLOCKS_REJECTED metric");

    pub static ref REORGS: IntCounter = register_int_counter!(
        "cobalt_reorgs_total",
        "Total number of chain reorganizations"
    )
    .expect("Failed to create REORGS metric");

    pub static ref VALIDATION_LATENCY: Histogram = register_histogram!(
        "cobalt_validation_latency_seconds",
        "Time taken to evaluate a submitted block in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to create VALIDATION_LATENCY metric");
}

#[cfg(feature = "metrics")]
pub fn record_block_accepted() {
    BLOCKS_ACCEPTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_rejected(code: &str) {
    BLOCKS_REJECTED.with_label_values(&[code]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_reorg() {
    REORGS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_validation_latency(seconds: f64) {
    VALIDATION_LATENCY.observe(seconds);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_rejected(_code: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_reorg() {}

#[cfg(not(feature = "metrics"))]
pub fn record_validation_latency(_seconds: f64) {}
