//! Adapters layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports, used by tests and the
//! regtest node.

mod block_store;
mod coin_view;
mod event_bus;
mod time;

pub use block_store::*;
pub use coin_view::*;
pub use event_bus::*;
pub use time::*;
