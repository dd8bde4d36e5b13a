//! Drives EVM sub-pool reset off new chain-head notifications.
//!
//! Subscribes to a [`ChainView`]'s broadcast channel and calls [`TxPool::reset`] once per head,
//! so pending/queued buckets stay in sync with the latest account projections without the
//! consensus front-end having to remember to do it.

use crate::{
    chain::ChainView,
    error::PoolResult,
    pool::{ordering::TransactionOrdering, txpool::TxPool},
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Runs until the chain view's broadcast sender is dropped. Intended to be spawned as a
/// background task alongside the rest of the node.
pub async fn run<C, O>(chain: Arc<C>, pool: Arc<TxPool<O>>)
where
    C: ChainView + 'static,
    O: TransactionOrdering,
{
    let mut events = chain.subscribe();
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Err(err) = on_new_head(chain.as_ref(), pool.as_ref()) {
                    warn!(target: "dual_mempool", height = event.header.number, error = %err, "pool reset failed");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(target: "dual_mempool", skipped, "chain-head subscriber lagged, resetting against current head anyway");
                if let Err(err) = on_new_head(chain.as_ref(), pool.as_ref()) {
                    warn!(target: "dual_mempool", error = %err, "pool reset failed after lag");
                }
            }
            Err(RecvError::Closed) => {
                debug!(target: "dual_mempool", "chain-head channel closed, stopping reset task");
                return;
            }
        }
    }
}

/// One reconciliation step: re-run promotion/demotion for every tracked sender against the
/// chain's current account projections. `StateLoadError` is propagated to the caller rather than
/// swallowed, since a failed reset leaves the pool's view of account nonces stale.
fn on_new_head<C, O>(chain: &C, pool: &TxPool<O>) -> PoolResult<()>
where
    C: ChainView,
    O: TransactionOrdering,
{
    pool.reset(chain)?;
    Ok(())
}
