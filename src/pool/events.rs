//! Subscription feeds for the EVM sub-pool: a `Vec<Sender<_>>` of listeners pruned with
//! `retain_mut`, each notified with a non-blocking `try_send` so one slow subscriber can't stall
//! admission for everyone else.

use crate::identifier::SenderId;
use alloy_primitives::TxHash;
use std::sync::Arc;
use tokio::sync::mpsc::{channel, error::TrySendError, Receiver, Sender};
use tracing::warn;

/// Which sub-pool bucket a transaction landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubPool {
    Pending,
    Queued,
}

/// Emitted once per newly accepted transaction.
#[derive(Debug, Clone)]
pub struct NewTransactionEvent {
    pub hash: TxHash,
    pub sender: SenderId,
    pub nonce: u64,
    pub subpool: SubPool,
}

const NEW_TX_LISTENER_BUFFER: usize = 2048;

/// Manages the set of outbound channels subscribed to new-transaction events. Slow consumers are
/// dropped rather than blocked.
#[derive(Default)]
pub struct NewTxListeners {
    listeners: Vec<Sender<NewTransactionEvent>>,
}

impl NewTxListeners {
    pub fn subscribe(&mut self) -> Receiver<NewTransactionEvent> {
        let (tx, rx) = channel(NEW_TX_LISTENER_BUFFER);
        self.listeners.push(tx);
        rx
    }

    pub fn notify(&mut self, event: &NewTransactionEvent) {
        self.listeners.retain(|listener| match listener.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(target: "dual_mempool", hash = %event.hash, "dropping full new-tx listener");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
    }
}

impl std::fmt::Debug for NewTxListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewTxListeners").field("count", &self.listeners.len()).finish()
    }
}

/// A cheap handle two components can share to register `NewTxListeners`.
pub type SharedNewTxListeners = Arc<parking_lot::Mutex<NewTxListeners>>;
