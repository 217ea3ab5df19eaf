//! # Shared Types Crate
//!
//! Block and transaction entities used by every Cobalt crate, together with
//! the consensus encoding that block and transaction hashes commit to.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: header, transaction and block layouts are
//!   defined once, here.
//! - **Exact bytes**: [`encoding`] produces the canonical serialization; hashes
//!   are always double SHA-256 over those bytes.
//! - **Targets are integers**: compact difficulty bits convert to and from
//!   [`U256`] through [`compact`], never through floating point.

pub mod compact;
pub mod encoding;
pub mod entities;
pub mod errors;
pub mod merkle;
pub mod script;

pub use compact::{block_work, compact_from_target, hash_to_target, CompactTarget};
pub use entities::*;
pub use errors::*;
pub use merkle::{block_merkle_root, compute_merkle_root};
