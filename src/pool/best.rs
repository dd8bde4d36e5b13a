//! Lazy, priority-ordered view over pending EVM transactions.
//!
//! An `all: BTreeMap<TransactionId, PendingTransactionRef>` holds every pending transaction, and
//! an `independent: BTreeSet<PendingTransactionRef>` holds, for each sender, only the lowest-nonce
//! transaction not yet yielded. Popping the head of `independent` and promoting that sender's
//! descendant (if present in `all`) into `independent` gives strictly increasing per-sender nonce
//! order for free.
//!
//! The entries here are `Arc` handles to already-validated transactions, not a lazily-decoded
//! wire form — decoding happens once, at validation time, and this module only orders
//! already-decoded handles.

use crate::{
    identifier::TransactionId,
    pool::ordering::{Priority, TransactionOrdering},
    pool::ValidEvmTransaction,
};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

/// A pending transaction plus the priority it was queued under. Priority is computed once, at
/// the time the transaction became part of this view, and is not recomputed on every
/// comparison.
#[derive(Debug, Clone)]
pub struct PendingTransactionRef {
    pub submission_id: u64,
    pub transaction: Arc<ValidEvmTransaction>,
    pub priority: Priority,
}

impl PendingTransactionRef {
    pub fn id(&self) -> TransactionId {
        self.transaction.id
    }
}

impl PartialEq for PendingTransactionRef {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for PendingTransactionRef {}

impl PartialOrd for PendingTransactionRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingTransactionRef {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first; ties broken by earlier arrival (lower submission id).
        self.priority.cmp(&other.priority).then_with(|| other.submission_id.cmp(&self.submission_id))
    }
}

/// A snapshot, priority-ordered view over one sub-pool's pending transactions, grouped per
/// sender. Built fresh for each selection from the mapping returned by the pool's pending set.
#[derive(Debug, Default)]
pub struct PendingPool {
    all: BTreeMap<TransactionId, PendingTransactionRef>,
    independent: BTreeSet<PendingTransactionRef>,
}

impl PendingPool {
    /// Builds a view from a per-sender mapping of already nonce-ordered lazy refs.
    pub fn from_by_sender<O: TransactionOrdering>(
        by_sender: BTreeMap<crate::identifier::SenderId, Vec<Arc<ValidEvmTransaction>>>,
        ordering: &O,
        base_fee: Option<u64>,
        submission_id_of: impl Fn(&ValidEvmTransaction) -> u64,
    ) -> Self {
        let mut all = BTreeMap::new();
        let mut independent = BTreeSet::new();
        for (_, txs) in by_sender {
            for (i, tx) in txs.into_iter().enumerate() {
                let priority = ordering.priority(&tx.transaction, base_fee);
                let pending_ref = PendingTransactionRef {
                    submission_id: submission_id_of(&tx),
                    transaction: tx,
                    priority,
                };
                if i == 0 {
                    independent.insert(pending_ref.clone());
                }
                all.insert(pending_ref.id(), pending_ref);
            }
        }
        Self { all, independent }
    }

    pub fn is_empty(&self) -> bool {
        self.independent.is_empty()
    }

    /// Peeks the current highest-priority pending transaction without consuming it.
    pub fn peek(&self) -> Option<&PendingTransactionRef> {
        self.independent.iter().next_back()
    }

    /// Removes the current highest-priority transaction and promotes its descendant (if any) so
    /// the next call to `peek`/`shift` observes strictly increasing nonces per sender.
    pub fn shift(&mut self) -> Option<PendingTransactionRef> {
        let best = self.independent.iter().next_back().cloned()?;
        self.independent.remove(&best);
        self.all.remove(&best.id());

        let descendant_id = best.id().descendant();
        if let Some(descendant) = self.all.get(&descendant_id).cloned() {
            self.independent.insert(descendant);
        }
        Some(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        evm_tx::{EvmTransaction, GasPricing, Signature, TxType},
        identifier::SenderId,
        pool::ordering::EffectiveTipOrdering,
    };
    use alloy_primitives::{Address, Bytes, U256};

    fn tx(sender: SenderId, nonce: u64, gas_price: u128, submission_id: u64) -> Arc<ValidEvmTransaction> {
        let envelope = EvmTransaction::new(
            TxType::Legacy,
            Some(1),
            nonce,
            GasPricing::Legacy { gas_price },
            21_000,
            Some(Address::repeat_byte(9)),
            U256::ZERO,
            Bytes::new(),
            vec![],
            Signature { v: 27, r: U256::from(1), s: U256::from(1) },
            Address::repeat_byte(sender.raw() as u8 + 1),
        );
        Arc::new(ValidEvmTransaction {
            id: TransactionId::new(sender, nonce),
            transaction: envelope,
            cost: U256::ZERO,
            local: true,
            submission_id,
        })
    }

    #[test]
    fn yields_strictly_increasing_nonce_per_sender() {
        let sender = SenderId::new(0);
        let mut by_sender = BTreeMap::new();
        by_sender.insert(sender, vec![tx(sender, 0, 10, 0), tx(sender, 1, 10, 1), tx(sender, 2, 10, 2)]);

        let ordering = EffectiveTipOrdering;
        let mut pool = PendingPool::from_by_sender(by_sender, &ordering, None, |t| t.submission_id);

        let mut nonces = vec![];
        while let Some(t) = pool.shift() {
            nonces.push(t.id().nonce);
        }
        assert_eq!(nonces, vec![0, 1, 2]);
    }

    #[test]
    fn higher_fee_sender_wins_the_head() {
        let low = SenderId::new(0);
        let high = SenderId::new(1);
        let mut by_sender = BTreeMap::new();
        by_sender.insert(low, vec![tx(low, 0, 1, 0)]);
        by_sender.insert(high, vec![tx(high, 0, 5, 1)]);

        let ordering = EffectiveTipOrdering;
        let mut pool = PendingPool::from_by_sender(by_sender, &ordering, None, |t| t.submission_id);
        let first = pool.shift().unwrap();
        assert_eq!(first.id().sender, high);
    }
}
