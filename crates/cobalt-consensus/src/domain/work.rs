//! Next-work computation
//!
//! **IMPORTANT**: the target is a CEILING. When blocks come too fast the
//! target goes DOWN (harder), when too slow it goes UP (easier).
//!
//! Retargets happen once per adjustment interval. The measured timespan is
//! clamped to a factor of four either way and the result never exceeds the
//! network's pow limit.

use super::{ChainHeaderNode, ConsensusParams};
use primitive_types::{U256, U512};
use shared_types::{compact_from_target, CompactTarget};
use std::sync::Arc;

/// Maximum factor the target may move by in one retarget.
pub const MAX_ADJUSTMENT_FACTOR: u64 = 4;

/// Compact bits required for a block built on `parent` with timestamp
/// `block_time`.
pub fn next_work_required(
    parent: &Arc<ChainHeaderNode>,
    block_time: u64,
    params: &ConsensusParams,
) -> u32 {
    let pow_limit_bits = params.pow_limit_bits();
    let interval = params.difficulty_adjustment_interval();

    if (parent.height() + 1) % interval != 0 {
        if params.allow_min_difficulty_blocks {
            // A block arriving more than twice the spacing late may use the
            // easiest target.
            if block_time > parent.time() + params.pow_target_spacing * 2 {
                return pow_limit_bits;
            }
            // Otherwise inherit the last real difficulty.
            let mut node = Arc::clone(parent);
            while node.height() % interval != 0 && node.bits() == pow_limit_bits {
                match node.prev() {
                    Some(prev) => node = Arc::clone(prev),
                    None => break,
                }
            }
            return node.bits();
        }
        return parent.bits();
    }

    let first_height = parent.height().saturating_sub(interval - 1);
    let first_time = parent
        .ancestor(first_height)
        .map(|first| first.time())
        .unwrap_or_else(|| parent.time());

    calculate_next_work_required(parent, first_time, params)
}

/// Retarget from the window ending at `last`, which started at `first_time`.
pub fn calculate_next_work_required(
    last: &ChainHeaderNode,
    first_time: u64,
    params: &ConsensusParams,
) -> u32 {
    if params.no_retargeting {
        return last.bits();
    }

    let timespan = params.pow_target_timespan;
    let actual = last
        .time()
        .saturating_sub(first_time)
        .clamp(timespan / MAX_ADJUSTMENT_FACTOR, timespan * MAX_ADJUSTMENT_FACTOR);

    let old = CompactTarget::from_bits(last.bits()).target;
    let scaled = old.full_mul(U256::from(actual)) / U512::from(timespan);

    let new = if scaled > U512::from(params.pow_limit) {
        params.pow_limit
    } else {
        U256::try_from(scaled).unwrap_or(params.pow_limit)
    };

    tracing::debug!(
        height = last.height() + 1,
        actual_timespan = actual,
        old_bits = %format!("{:08x}", last.bits()),
        new_bits = %format!("{:08x}", compact_from_target(&new)),
        "[consensus] Difficulty retarget"
    );

    compact_from_target(&new)
}
