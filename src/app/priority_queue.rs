//! A minimal priority-with-nonce [`AppSubPool`] implementation.
//!
//! Real deployments plug in whatever queue the application layer already runs; this one exists
//! so the merge and dual-pool logic has something concrete to run against in tests. Transactions
//! are indexed per sender by sequence number, and `select` walks a priority-ordered view that
//! always yields each sender's lowest outstanding sequence number first — skipping validation,
//! balance checks and eviction entirely, since none of that is this crate's concern for the app
//! side.

use crate::app::{AppIterator, AppSubPool, AppTransaction};
use alloy_primitives::{Address, B256, U256};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, VecDeque},
};

#[derive(Debug, Default)]
struct Inner {
    by_sender: FxHashMap<Address, BTreeMap<u64, AppTransaction>>,
    hash_to_sender: FxHashMap<B256, Address>,
    submission_ids: FxHashMap<B256, u64>,
    submission_counter: u64,
}

/// A priority-nonce queue keyed on a single fee denomination.
pub struct PriorityNoncePool {
    denom: String,
    inner: Mutex<Inner>,
}

impl PriorityNoncePool {
    pub fn new(denom: impl Into<String>) -> Self {
        Self { denom: denom.into(), inner: Mutex::new(Inner::default()) }
    }

    fn priority_of(&self, tx: &AppTransaction) -> U256 {
        tx.fee.amount_of(&self.denom).unwrap_or(U256::ZERO)
    }

    /// Materializes the full priority-nonce order: each sender's lowest outstanding sequence
    /// number is eligible first, and emitting it makes the sender's next sequence eligible, same
    /// two-structure shift used by the EVM side's pending view.
    fn ordered_txs(&self) -> Vec<AppTransaction> {
        let inner = self.inner.lock();
        let mut independent: BTreeSet<Head> = BTreeSet::new();
        let mut all: BTreeMap<(Address, u64), AppTransaction> = BTreeMap::new();

        for (sender, seqs) in &inner.by_sender {
            for (i, (&seq, tx)) in seqs.iter().enumerate() {
                let head = Head {
                    sender: *sender,
                    seq,
                    priority: self.priority_of(tx),
                    submission_id: inner.submission_ids.get(&tx.hash).copied().unwrap_or(u64::MAX),
                };
                if i == 0 {
                    independent.insert(head);
                }
                all.insert((*sender, seq), tx.clone());
            }
        }

        let mut ordered = Vec::with_capacity(all.len());
        while let Some(head) = independent.iter().next_back().copied() {
            independent.remove(&head);
            let Some(tx) = all.remove(&(head.sender, head.seq)) else { continue };
            let next_seq = head.seq + 1;
            if let Some(next_tx) = all.get(&(head.sender, next_seq)) {
                independent.insert(Head {
                    sender: head.sender,
                    seq: next_seq,
                    priority: self.priority_of(next_tx),
                    submission_id: inner.submission_ids.get(&next_tx.hash).copied().unwrap_or(u64::MAX),
                });
            }
            ordered.push(tx);
        }
        ordered
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Head {
    sender: Address,
    seq: u64,
    priority: U256,
    submission_id: u64,
}

impl Ord for Head {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first; ties broken by earlier arrival (lower submission id).
        self.priority.cmp(&other.priority).then_with(|| other.submission_id.cmp(&self.submission_id))
    }
}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl AppSubPool for PriorityNoncePool {
    fn insert(&self, tx: AppTransaction) -> Result<(), String> {
        let mut inner = self.inner.lock();
        if inner.hash_to_sender.contains_key(&tx.hash) {
            return Err("transaction already known".to_string());
        }
        inner.submission_counter += 1;
        let submission_id = inner.submission_counter;
        inner.submission_ids.insert(tx.hash, submission_id);
        inner.hash_to_sender.insert(tx.hash, tx.sender);
        inner.by_sender.entry(tx.sender).or_default().insert(tx.sequence, tx);
        Ok(())
    }

    fn remove(&self, tx: &AppTransaction) -> bool {
        let mut inner = self.inner.lock();
        let Some(sender) = inner.hash_to_sender.remove(&tx.hash) else { return false };
        inner.submission_ids.remove(&tx.hash);
        if let Some(seqs) = inner.by_sender.get_mut(&sender) {
            seqs.remove(&tx.sequence);
            if seqs.is_empty() {
                inner.by_sender.remove(&sender);
            }
        }
        true
    }

    fn count_tx(&self) -> usize {
        self.inner.lock().hash_to_sender.len()
    }

    fn select(&self, skip: usize) -> Box<dyn AppIterator> {
        let ordered = self.ordered_txs();
        let skip = skip.min(ordered.len());
        Box::new(Cursor { txs: ordered.into_iter().skip(skip).collect() })
    }

    fn has_sender(&self, addr: Address) -> bool {
        self.inner.lock().by_sender.get(&addr).is_some_and(|m| !m.is_empty())
    }
}

struct Cursor {
    txs: VecDeque<AppTransaction>,
}

impl AppIterator for Cursor {
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
    use crate::app::FeeBundle;

    fn tx(sender: Address, seq: u64, amount: u64) -> AppTransaction {
        let mut hash_bytes = [0u8; 32];
        hash_bytes[..20].copy_from_slice(sender.as_slice());
        hash_bytes[24..].copy_from_slice(&seq.to_be_bytes());
        AppTransaction {
            hash: B256::from(hash_bytes),
            sender,
            sequence: seq,
            fee: FeeBundle::single("wei", U256::from(amount)),
            messages: vec![],
        }
    }

    #[test]
    fn yields_strictly_increasing_sequence_per_sender() {
        let pool = PriorityNoncePool::new("wei");
        let sender = Address::repeat_byte(1);
        pool.insert(tx(sender, 0, 5)).unwrap();
        pool.insert(tx(sender, 1, 5)).unwrap();
        pool.insert(tx(sender, 2, 5)).unwrap();

        let mut cursor = Some(pool.select(0));
        let mut seqs = vec![];
        while let Some(c) = cursor {
            let Some(t) = c.tx() else { break };
            seqs.push(t.sequence);
            cursor = c.next();
        }
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn higher_fee_sender_head_wins() {
        let pool = PriorityNoncePool::new("wei");
        let low = Address::repeat_byte(1);
        let high = Address::repeat_byte(2);
        pool.insert(tx(low, 0, 1)).unwrap();
        pool.insert(tx(high, 0, 5)).unwrap();

        let cursor = pool.select(0);
        assert_eq!(cursor.tx().unwrap().sender, high);
    }

    #[test]
    fn remove_drops_sender_entirely_once_empty() {
        let pool = PriorityNoncePool::new("wei");
        let sender = Address::repeat_byte(3);
        let t = tx(sender, 0, 5);
        pool.insert(t.clone()).unwrap();
        assert!(pool.has_sender(sender));
        assert!(pool.remove(&t));
        assert!(!pool.has_sender(sender));
        assert_eq!(pool.count_tx(), 0);
    }

    #[test]
    fn select_by_stops_at_first_failing_predicate() {
        let pool = PriorityNoncePool::new("wei");
        let sender = Address::repeat_byte(4);
        pool.insert(tx(sender, 0, 5)).unwrap();
        pool.insert(tx(sender, 1, 5)).unwrap();

        let cursor = pool.select_by(0, &|t| t.sequence < 1);
        assert_eq!(cursor.tx().unwrap().sequence, 0);
        assert!(cursor.next().is_none());
    }
}
