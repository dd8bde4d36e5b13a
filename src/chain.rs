//! Read-only projection of chain state consumed by the pool.
//!
//! Nothing in this module executes transactions or mutates chain state; it only describes the
//! external collaborator the pool polls for account projections and subscribes to for new-block
//! notifications. Production wiring (an adapter backed by the real storage layer) lives outside
//! this crate; the pool only ever consumes the trait.

use alloy_primitives::{Address, B256, U256};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A synthesized block header, the subset of fields the pool needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub number: u64,
    pub timestamp: u64,
    /// `None` before the London-equivalent fork activates, or before genesis.
    pub base_fee: Option<u64>,
    pub gas_limit: u64,
    pub parent_hash: B256,
    pub state_root: B256,
    /// Always zero under instant finality; kept for wire-compatibility with PoW-shaped headers.
    pub difficulty: U256,
}

impl Header {
    /// The header returned before any block has been finalized.
    pub fn zero() -> Self {
        Self {
            number: 0,
            timestamp: 0,
            base_fee: None,
            gas_limit: i64::MAX as u64,
            parent_hash: B256::ZERO,
            state_root: B256::ZERO,
            difficulty: U256::ZERO,
        }
    }
}

/// Stable, process-lifetime chain configuration.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    /// Height at which the London-equivalent (base-fee) fork activates, if known.
    pub london_activation_height: Option<u64>,
    /// Denomination used for cross-pool fee comparison, e.g. `"wei"`.
    pub evm_denom: String,
    /// Consensus-level gas limit, or `None` if unbounded (interpreted as `2^63 - 1`).
    pub max_gas: Option<u64>,
}

impl ChainConfig {
    pub fn is_london_active_at(&self, height: u64) -> bool {
        self.london_activation_height.is_some_and(|h| height >= h)
    }

    pub fn effective_gas_limit(&self) -> u64 {
        self.max_gas.unwrap_or(i64::MAX as u64)
    }
}

/// Per-address account projection as seen by the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountState {
    pub balance: U256,
    pub nonce: u64,
    pub has_code: bool,
}

/// Event published once per newly finalized block.
#[derive(Debug, Clone)]
pub struct ChainHeadEvent {
    pub header: Header,
}

/// Read-only contract the pool polls for account projections and chain-head events.
pub trait ChainView: Send + Sync {
    /// Returns the most recently finalized header, or [`Header::zero`] before genesis. Never
    /// fails.
    fn current_header(&self) -> Header;

    /// Stable chain configuration.
    fn config(&self) -> &ChainConfig;

    /// Defined only for height 0 or 1 (the bootstrap parent lookup). Any other request indicates
    /// a reorg attempt, which violates the instant-finality assumption and must fail fatally.
    fn get_block(&self, hash: B256, number: u64) -> Header;

    /// Always returns the latest account projection regardless of the requested root: the pool
    /// never needs historical state. Returns the default (zeroed) projection for the zero hash.
    fn state_at(&self, root: B256, address: Address) -> Result<AccountState, String>;

    /// Registers a new chain-head subscriber; delivery order per subscriber is FIFO.
    fn subscribe(&self) -> broadcast::Receiver<ChainHeadEvent>;

    /// Publishes a [`ChainHeadEvent`] derived from the current header and advances the parent
    /// hash used for the next synthesized header.
    fn notify_new_block(&self);
}

/// Fee-market interface: base fee plus the denomination bookkeeping the
/// cross-pool comparison needs.
pub trait FeeMarket: Send + Sync {
    fn get_base_fee(&self) -> Option<u64>;
    fn get_block_gas_wanted(&self) -> u64;
    fn evm_denom(&self) -> &str;
}

/// Opaque handle threaded through from the consensus front-end: carries a
/// snapshot height and a cancellation signal. The pool does not interpret its contents beyond
/// checking for cancellation before blocking state loads.
#[derive(Clone)]
pub struct PoolContext {
    pub snapshot_height: u64,
    cancelled: Arc<Mutex<bool>>,
}

impl PoolContext {
    pub fn new(snapshot_height: u64) -> Self {
        Self { snapshot_height, cancelled: Arc::new(Mutex::new(false)) }
    }

    pub fn cancel(&self) {
        *self.cancelled.lock() = true;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock()
    }
}

impl Default for PoolContext {
    fn default() -> Self {
        Self::new(0)
    }
}
