//! Compact difficulty encoding ("nBits").
//!
//! **IMPORTANT**: the target is a CEILING. A header is valid proof of work
//! when its hash, read as a little-endian 256-bit integer, is at or below the
//! target. Lower target = harder.
//!
//! The compact form is a base-256 float: the top byte is the size in bytes,
//! the low 23 bits are the mantissa and bit 23 is a sign flag.

use primitive_types::U256;

use crate::entities::Hash;

/// A decoded compact target together with the flags that make it unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactTarget {
    pub target: U256,
    pub negative: bool,
    pub overflow: bool,
}

impl CompactTarget {
    pub fn from_bits(bits: u32) -> Self {
        let size = bits >> 24;
        let mut word = bits & 0x007f_ffff;

        let negative = word != 0 && (bits & 0x0080_0000) != 0;
        let overflow = word != 0
            && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

        let target = if overflow {
            U256::zero()
        } else if size <= 3 {
            word >>= 8 * (3 - size);
            U256::from(word)
        } else {
            U256::from(word) << (8 * (size - 3) as usize)
        };

        Self {
            target,
            negative,
            overflow,
        }
    }

    /// The target if it is usable for proof of work.
    pub fn valid_target(&self) -> Option<U256> {
        if self.negative || self.overflow || self.target.is_zero() {
            None
        } else {
            Some(self.target)
        }
    }
}

/// Encode a target in compact form, normalising away the sign bit.
pub fn compact_from_target(target: &U256) -> u32 {
    let mut size = (target.bits() + 7) / 8;
    let mut compact: u32 = if size <= 3 {
        (target.low_u64() << (8 * (3 - size))) as u32
    } else {
        (*target >> (8 * (size - 3))).low_u64() as u32
    };

    // The mantissa's top bit is the sign; shift it out and bump the size.
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }

    compact | ((size as u32) << 24)
}

/// Read a block hash as the integer compared against the target.
pub fn hash_to_target(hash: &Hash) -> U256 {
    U256::from_little_endian(hash)
}

/// Expected number of hashes needed to meet `bits`: `2^256 / (target + 1)`.
///
/// Unusable bits contribute no work.
pub fn block_work(bits: u32) -> U256 {
    let Some(target) = CompactTarget::from_bits(bits).valid_target() else {
        return U256::zero();
    };
    // 2^256 does not fit, so use (~target / (target + 1)) + 1.
    match target.checked_add(U256::one()) {
        Some(denominator) => (!target / denominator) + U256::one(),
        None => U256::one(),
    }
}
