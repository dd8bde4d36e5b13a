//! Pool metrics, built on the `metrics` crate's macro-based counters/gauges rather than
//! hand-rolled atomics.

use metrics::{counter, gauge, Counter, Gauge};

/// Metrics for a single [`crate::pool::txpool::TxPool`] instance.
#[derive(Clone)]
pub struct TxPoolMetrics {
    pub pending_txs: Gauge,
    pub queued_txs: Gauge,
    pub pool_size_bytes: Gauge,
    pub inserted_total: Counter,
    pub replaced_total: Counter,
    pub rejected_total: Counter,
    pub evicted_total: Counter,
    pub promoted_total: Counter,
    pub demoted_total: Counter,
}

impl Default for TxPoolMetrics {
    fn default() -> Self {
        Self {
            pending_txs: gauge!("dual_mempool_evm_pending_txs"),
            queued_txs: gauge!("dual_mempool_evm_queued_txs"),
            pool_size_bytes: gauge!("dual_mempool_evm_pool_size_bytes"),
            inserted_total: counter!("dual_mempool_evm_inserted_total"),
            replaced_total: counter!("dual_mempool_evm_replaced_total"),
            rejected_total: counter!("dual_mempool_evm_rejected_total"),
            evicted_total: counter!("dual_mempool_evm_evicted_total"),
            promoted_total: counter!("dual_mempool_evm_promoted_total"),
            demoted_total: counter!("dual_mempool_evm_demoted_total"),
        }
    }
}

impl std::fmt::Debug for TxPoolMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxPoolMetrics").finish_non_exhaustive()
    }
}
