//! # Cobalt Test Suite
//!
//! Cross-crate scenarios that drive the consensus engine the way a node does.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs          # Block builders and a service harness
//!     ├── block_acceptance.rs  # Submitting blocks on a regtest chain
//!     ├── reorg.rs             # Branch switching and coin view replay
//!     ├── checkpoints.rs       # Checkpoint tables and the live switch
//!     └── node.rs              # The node runtime end to end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cobalt-tests
//! cargo test -p cobalt-tests integration::reorg
//! ```

pub mod integration;
