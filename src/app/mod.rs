//! The application sub-pool contract.
//!
//! Unlike the EVM sub-pool, this side of the mempool is a black box: `DualMempool` only ever
//! touches it through the [`AppSubPool`] trait. A concrete implementation lives in
//! [`priority_queue`] for tests and local development; a real deployment would plug in whatever
//! priority-nonce queue the application layer already runs.

pub mod priority_queue;

use alloy_primitives::{Address, B256, U256};
use std::fmt;

/// A single denomination/amount pair within a fee bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: U256,
}

/// The set of coins an application transaction offers as its fee. Cross-pool comparison only
/// cares about the coin matching the configured bond denomination; everything else is opaque to
/// the mempool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeeBundle(pub Vec<Coin>);

impl FeeBundle {
    pub fn single(denom: impl Into<String>, amount: U256) -> Self {
        Self(vec![Coin { denom: denom.into(), amount }])
    }

    /// The amount offered in `denom`, if the bundle names one.
    pub fn amount_of(&self, denom: &str) -> Option<U256> {
        self.0.iter().find(|c| c.denom == denom).map(|c| c.amount)
    }
}

/// An application-layer transaction: an opaque message payload plus a fee bundle and a
/// per-signer sequence number. The mempool never interprets the message bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTransaction {
    pub hash: B256,
    pub sender: Address,
    pub sequence: u64,
    pub fee: FeeBundle,
    pub messages: Vec<Vec<u8>>,
}

impl fmt::Display for AppTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppTx({}, seq={})", self.hash, self.sequence)
    }
}

/// A stateful peek/advance cursor over one sub-pool's priority-nonce ordered transactions.
/// `tx()` is idempotent; `next()` consumes the cursor and returns the cursor positioned one step
/// further, or `None` once exhausted.
pub trait AppIterator: Send {
    fn tx(&self) -> Option<AppTransaction>;
    fn next(self: Box<Self>) -> Option<Box<dyn AppIterator>>;
}

/// The external application-transaction pool. Implementations are required to be internally
/// synchronized; `DualMempool` treats every method as safe to call concurrently from any thread.
pub trait AppSubPool: Send + Sync {
    fn insert(&self, tx: AppTransaction) -> Result<(), String>;

    /// Removes a transaction previously returned by `select`/`select_by`. Returns whether it was
    /// present.
    fn remove(&self, tx: &AppTransaction) -> bool;

    fn count_tx(&self) -> usize;

    fn select(&self, skip: usize) -> Box<dyn AppIterator>;

    fn select_by(&self, skip: usize, predicate: &dyn Fn(&AppTransaction) -> bool) -> Box<dyn AppIterator> {
        let mut iter = Some(self.select(skip));
        let mut filtered = Vec::new();
        while let Some(cursor) = iter {
            match cursor.tx() {
                Some(tx) if predicate(&tx) => {
                    filtered.push(tx);
                    iter = cursor.next();
                }
                _ => break,
            }
        }
        Box::new(static_iterator(filtered))
    }

    /// Whether `addr` currently owns at least one transaction in this pool. Used by
    /// [`crate::dual::DualMempool`] to release the cross-pool sender reservation once a removal
    /// or rejection leaves the sender with nothing here.
    fn has_sender(&self, addr: Address) -> bool;
}

/// A cursor over a pre-materialized, already-ordered list of transactions. Used as the backing
/// implementation for the default `select_by`.
struct StaticIterator {
    txs: std::collections::VecDeque<AppTransaction>,
}

fn static_iterator(txs: Vec<AppTransaction>) -> StaticIterator {
    StaticIterator { txs: txs.into() }
}

/// An iterator that yields nothing. Used by callers that need a `Box<dyn AppIterator>` handle
/// without a live selection, e.g. a cancelled `Select`.
pub fn empty_iterator() -> Box<dyn AppIterator> {
    Box::new(static_iterator(Vec::new()))
}

impl AppIterator for StaticIterator {
    fn tx(&self) -> Option<AppTransaction> {
        self.txs.front().cloned()
    }

    fn next(mut self: Box<Self>) -> Option<Box<dyn AppIterator>> {
        self.txs.pop_front();
        if self.txs.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(seq: u64, amount: u64) -> AppTransaction {
        AppTransaction {
            hash: B256::repeat_byte(seq as u8),
            sender: Address::repeat_byte(1),
            sequence: seq,
            fee: FeeBundle::single("wei", U256::from(amount)),
            messages: vec![],
        }
    }

    #[test]
    fn static_iterator_yields_in_order_then_exhausts() {
        let mut cursor: Option<Box<dyn AppIterator>> = Some(Box::new(static_iterator(vec![tx(0, 1), tx(1, 2)])));
        let mut seen = vec![];
        while let Some(c) = cursor {
            let Some(t) = c.tx() else { break };
            seen.push(t.sequence);
            cursor = c.next();
        }
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn fee_bundle_looks_up_by_denom() {
        let bundle = FeeBundle(vec![
            Coin { denom: "uatom".to_string(), amount: U256::from(10u64) },
            Coin { denom: "wei".to_string(), amount: U256::from(4u64) },
        ]);
        assert_eq!(bundle.amount_of("wei"), Some(U256::from(4u64)));
        assert_eq!(bundle.amount_of("missing"), None);
    }
}
