//! The EVM sub-pool: legacy-pool semantics.

pub mod best;
pub mod events;
pub mod ordering;
pub mod txpool;

use crate::{evm_tx::EvmTransaction, identifier::TransactionId};
use alloy_primitives::U256;

/// A transaction that has passed static and stateful validation and been admitted into one of
/// the sub-pool's buckets.
#[derive(Debug, Clone)]
pub struct ValidEvmTransaction {
    pub id: TransactionId,
    pub transaction: EvmTransaction,
    /// Worst-case cost (`value + gas_limit * fee_cap`), cached at admission time.
    pub cost: U256,
    /// Whether this transaction was submitted by the local node.
    pub local: bool,
    /// Monotonic arrival order, used to break priority ties and for pool-full eviction
    /// tie-breaking (oldest arrival evicted first among equal fee caps).
    pub submission_id: u64,
}

impl ValidEvmTransaction {
    pub fn hash(&self) -> &alloy_primitives::TxHash {
        self.transaction.hash()
    }

    pub fn nonce(&self) -> u64 {
        self.id.nonce
    }

    /// Approximate wire size in bytes, used for the pool's byte-size budget.
    pub fn size(&self) -> usize {
        128 + self.transaction.data.len() + self.transaction.access_list.len() * 64
    }
}

/// Per-sender lifecycle state: whether a sender currently has pending, queued, both, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderPoolState {
    Empty,
    PendingOnly,
    PendingAndQueued,
    QueuedOnly,
}

/// One sender's pending/queued transactions, each keyed by nonce.
#[derive(Debug, Default)]
pub struct SenderState {
    pub pending: std::collections::BTreeMap<u64, std::sync::Arc<ValidEvmTransaction>>,
    pub queued: std::collections::BTreeMap<u64, std::sync::Arc<ValidEvmTransaction>>,
}

impl SenderState {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.queued.is_empty()
    }

    pub fn state(&self) -> SenderPoolState {
        match (self.pending.is_empty(), self.queued.is_empty()) {
            (true, true) => SenderPoolState::Empty,
            (false, true) => SenderPoolState::PendingOnly,
            (false, false) => SenderPoolState::PendingAndQueued,
            (true, false) => SenderPoolState::QueuedOnly,
        }
    }
}

/// Pool-wide size counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSize {
    pub pending: usize,
    pub queued: usize,
    pub size_bytes: usize,
}

/// A filter applied to `pending()` reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingFilter {
    pub min_tip: Option<u128>,
    pub base_fee: Option<u64>,
    pub only_plain: bool,
    pub only_blob: bool,
}

/// The outcome of successfully admitting one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddedTransactionOutcome {
    /// Newly admitted into the pending bucket.
    Pending,
    /// Newly admitted into the queued bucket (a nonce gap or balance shortfall).
    Queued,
    /// Replaced an existing same-nonce transaction; carries the replaced transaction's hash.
    Replaced { old_hash: alloy_primitives::TxHash, subpool: events::SubPool },
    /// Hash already present in the pool.
    Known,
}
