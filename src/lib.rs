//! A dual-lane transaction mempool for a node that accepts both EVM-shaped transactions and an
//! opaque application transaction format side by side.
//!
//! The EVM lane (`pool`) runs legacy-pool admission: static/stateful validation, pending/queued
//! classification on nonce contiguity, replace-by-fee, pool-full eviction and promotion on chain
//! reset. The application lane (`app`) is a black box behind the [`app::AppSubPool`] trait — this
//! crate only ships a minimal priority-nonce reference implementation for tests. [`dual`] wires
//! the two together behind one sender-reservation registry so a sender can never be admitted into
//! both lanes at once, and [`merge`] produces the single proposer-facing ordered stream a block
//! builder actually consumes.

pub mod app;
pub mod chain;
pub mod chain_head;
pub mod config;
pub mod dual;
pub mod error;
pub mod evm_tx;
pub mod identifier;
pub mod merge;
pub mod metrics;
pub mod pool;
pub mod reservation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use dual::{DualMempool, InvalidSequencePredicate, RawTransaction};
pub use error::{PoolError, PoolErrorKind, PoolResult};
pub use merge::{CanonicalTx, MergeIterator};
