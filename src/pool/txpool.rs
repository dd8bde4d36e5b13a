//! The EVM sub-pool's admission, eviction and promotion algorithm.
//!
//! A single coarse lock guards admission, eviction, promotion and reset; `pending()` returns a
//! read-locked snapshot of lazy references rather than letting internal pointers escape.

use crate::{
    chain::{AccountState, ChainView, PoolContext},
    config::PoolConfig,
    error::{PoolError, PoolErrorKind, PoolResult},
    evm_tx::EvmTransaction,
    identifier::{SenderId, SenderIdentifiers, TransactionId},
    metrics::TxPoolMetrics,
    pool::{
        events::{NewTransactionEvent, NewTxListeners, SubPool},
        ordering::{Priority, TransactionOrdering},
        AddedTransactionOutcome, PendingFilter, PoolSize, SenderPoolState, SenderState,
        ValidEvmTransaction,
    },
    reservation::{PoolKind, SenderReservations},
};
use alloy_primitives::{Address, TxHash, U256};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::mpsc::Receiver;
use tracing::{debug, trace};

/// The EVM legacy-pool. `O` is the [`TransactionOrdering`] used to rank pending transactions for
/// block production.
pub struct TxPool<O: TransactionOrdering> {
    inner: RwLock<Inner<O>>,
    reservations: SenderReservations,
    listeners: parking_lot::Mutex<NewTxListeners>,
    metrics: TxPoolMetrics,
}

struct Inner<O: TransactionOrdering> {
    config: PoolConfig,
    ordering: O,
    identifiers: SenderIdentifiers,
    senders: FxHashMap<SenderId, SenderState>,
    /// Global `hash -> (sender, nonce, bucket)` index. The bucket is
    /// recovered by checking which of `pending`/`queued` holds the id, rather than stored
    /// redundantly, so it can never drift out of sync.
    all: FxHashMap<TxHash, TransactionId>,
    pending_count: usize,
    queued_count: usize,
    size_bytes: usize,
    submission_counter: u64,
}

impl<O: TransactionOrdering> Inner<O> {
    fn sender_state(&self, sender: SenderId) -> &SenderState {
        static EMPTY: SenderState = SenderState { pending: BTreeMap::new(), queued: BTreeMap::new() };
        self.senders.get(&sender).unwrap_or(&EMPTY)
    }

    fn bucket_of(&self, id: &TransactionId) -> Option<SubPool> {
        let state = self.senders.get(&id.sender)?;
        if state.pending.contains_key(&id.nonce) {
            Some(SubPool::Pending)
        } else if state.queued.contains_key(&id.nonce) {
            Some(SubPool::Queued)
        } else {
            None
        }
    }
}

impl<O: TransactionOrdering> TxPool<O> {
    pub fn new(ordering: O, config: PoolConfig, reservations: SenderReservations) -> Self {
        Self {
            inner: RwLock::new(Inner {
                config,
                ordering,
                identifiers: SenderIdentifiers::default(),
                senders: FxHashMap::default(),
                all: FxHashMap::default(),
                pending_count: 0,
                queued_count: 0,
                size_bytes: 0,
                submission_counter: 0,
            }),
            reservations,
            listeners: parking_lot::Mutex::new(NewTxListeners::default()),
            metrics: TxPoolMetrics::default(),
        }
    }

    pub fn stats(&self) -> (usize, usize) {
        let inner = self.inner.read();
        (inner.pending_count, inner.queued_count)
    }

    pub fn size(&self) -> PoolSize {
        let inner = self.inner.read();
        PoolSize { pending: inner.pending_count, queued: inner.queued_count, size_bytes: inner.size_bytes }
    }

    pub fn subscribe_new_txs(&self) -> Receiver<NewTransactionEvent> {
        self.listeners.lock().subscribe()
    }

    /// Admits a batch of already-decoded, signature-recovered EVM transactions, running each one
    /// through static validation, reservation, state-check, classification, eviction and
    /// promotion, in that order. `ctx` is checked for cancellation immediately before the
    /// blocking account-state load; a cancelled context fails the transaction without touching
    /// pool state.
    pub fn add(
        &self,
        txs: Vec<EvmTransaction>,
        local: bool,
        chain: &dyn ChainView,
        ctx: &PoolContext,
    ) -> Vec<PoolResult<AddedTransactionOutcome>> {
        let mut results = Vec::with_capacity(txs.len());
        for tx in txs {
            results.push(self.add_one(tx, local, chain, ctx));
        }
        results
    }

    fn add_one(
        &self,
        tx: EvmTransaction,
        local: bool,
        chain: &dyn ChainView,
        ctx: &PoolContext,
    ) -> PoolResult<AddedTransactionOutcome> {
        let hash = *tx.hash();

        // --- 1. static validation ---
        if let Err(kind) = static_validate(&tx, chain, local) {
            self.metrics.rejected_total.increment(1);
            return Err(PoolError::new(hash, kind));
        }

        // --- 2. known check ---
        {
            let inner = self.inner.read();
            if inner.all.contains_key(&hash) {
                return Err(PoolError::new(hash, PoolErrorKind::Known));
            }
        }

        let sender_addr = tx.sender();

        // --- 3. sender reservation ---
        if !self.reservations.try_reserve(sender_addr, PoolKind::Evm) {
            self.metrics.rejected_total.increment(1);
            return Err(PoolError::new(hash, PoolErrorKind::SenderUnreservable(sender_addr)));
        }

        // --- 4. state check ---
        if ctx.is_cancelled() {
            self.release_if_unheld(sender_addr);
            return Err(PoolError::new(hash, PoolErrorKind::Cancelled));
        }
        let account = match chain.state_at(alloy_primitives::B256::ZERO, sender_addr) {
            Ok(account) => account,
            Err(e) => {
                return Err(PoolError::new(hash, PoolErrorKind::StateLoadError(e)));
            }
        };

        let outcome = self.admit_validated(tx, hash, local, account);

        // If admission failed outright (not even queued) and the sender now holds nothing in
        // this pool, release the reservation so another sub-pool may claim the sender.
        if outcome.is_err() {
            self.release_if_unheld(sender_addr);
        }

        outcome
    }

    /// Releases `addr`'s reservation unless it already holds at least one transaction in this
    /// pool — used after a failed admission so a sender mid-flight in this pool doesn't lose its
    /// reservation over an unrelated later failure.
    fn release_if_unheld(&self, addr: Address) {
        let inner = self.inner.read();
        let sender_id = inner.identifiers.sender_id(&addr);
        let still_holds = sender_id.is_some_and(|id| inner.senders.get(&id).is_some_and(|s| !s.is_empty()));
        drop(inner);
        if !still_holds {
            self.reservations.release(addr, PoolKind::Evm);
        }
    }

    fn admit_validated(
        &self,
        tx: EvmTransaction,
        hash: TxHash,
        local: bool,
        account: AccountState,
    ) -> PoolResult<AddedTransactionOutcome> {
        let mut inner = self.inner.write();
        let sender_addr = tx.sender();
        let sender_id = inner.identifiers.sender_id_or_create(sender_addr);
        let nonce = tx.nonce;

        if nonce < account.nonce {
            return Err(PoolError::new(hash, PoolErrorKind::NonceTooLow { tx_nonce: nonce, account_nonce: account.nonce }));
        }

        let cost = match tx.worst_case_cost() {
            Some(c) => c,
            None => return Err(PoolError::new(hash, PoolErrorKind::IntrinsicGasTooLow)),
        };
        if cost >= account.balance {
            return Err(PoolError::new(
                hash,
                PoolErrorKind::BalanceTooLow { required: cost.to_string(), balance: account.balance.to_string() },
            ));
        }

        inner.submission_counter += 1;
        let submission_id = inner.submission_counter;
        let id = TransactionId::new(sender_id, nonce);
        let valid = Arc::new(ValidEvmTransaction { id, transaction: tx, cost, local, submission_id });
        let size = valid.size();

        // --- 5. classification / same-nonce replacement ---
        let pending_len = inner.sender_state(sender_id).pending.len() as u64;
        let next_executable = account.nonce + pending_len;

        let existing_bucket = inner.bucket_of(&id);
        let outcome = if let Some(bucket) = existing_bucket {
            match self.try_replace(&mut inner, sender_id, bucket, valid.clone()) {
                Ok(old_hash) => AddedTransactionOutcome::Replaced { old_hash, subpool: bucket },
                Err(kind) => return Err(PoolError::new(hash, kind)),
            }
        } else if nonce == next_executable {
            self.insert_pending(&mut inner, sender_id, valid.clone());
            AddedTransactionOutcome::Pending
        } else {
            self.insert_queued(&mut inner, sender_id, valid.clone());
            AddedTransactionOutcome::Queued
        };

        inner.size_bytes += size;

        // --- 7. promotion (only meaningful when something landed in pending) ---
        if matches!(outcome, AddedTransactionOutcome::Pending | AddedTransactionOutcome::Replaced { .. }) {
            self.promote_and_demote(&mut inner, sender_id, account.nonce, account.balance);
        }

        // --- 6. pool-full handling ---
        if inner.pending_count + inner.queued_count > inner.config.limit.max_txs {
            match self.evict_worst(&mut inner, &id) {
                EvictOutcome::EvictedOther => {}
                EvictOutcome::EvictedSelf => {
                    return Err(PoolError::new(hash, PoolErrorKind::Underpriced));
                }
                EvictOutcome::PoolFull => {
                    return Err(PoolError::new(hash, PoolErrorKind::PoolFull));
                }
                EvictOutcome::NothingToEvict => {}
            }
        }

        drop(inner);

        // --- 8. emit NewTx event ---
        let subpool = match outcome {
            AddedTransactionOutcome::Pending => SubPool::Pending,
            AddedTransactionOutcome::Queued => SubPool::Queued,
            AddedTransactionOutcome::Replaced { subpool, .. } => subpool,
            AddedTransactionOutcome::Known => unreachable!("known txs return earlier"),
        };
        self.metrics.inserted_total.increment(1);
        self.listeners.lock().notify(&NewTransactionEvent { hash, sender: sender_id, nonce, subpool });

        Ok(outcome)
    }

    fn insert_pending(&self, inner: &mut Inner<O>, sender: SenderId, tx: Arc<ValidEvmTransaction>) {
        let id = tx.id;
        inner.all.insert(*tx.hash(), id);
        inner.senders.entry(sender).or_default().pending.insert(id.nonce, tx);
        inner.pending_count += 1;
        self.metrics.pending_txs.set(inner.pending_count as f64);
    }

    fn insert_queued(&self, inner: &mut Inner<O>, sender: SenderId, tx: Arc<ValidEvmTransaction>) {
        let id = tx.id;
        inner.all.insert(*tx.hash(), id);
        inner.senders.entry(sender).or_default().queued.insert(id.nonce, tx);
        inner.queued_count += 1;
        self.metrics.queued_txs.set(inner.queued_count as f64);
    }

    /// Replacement-by-fee: accept only if both the effective tip and the fee cap clear the
    /// configured bump over the existing transaction.
    fn try_replace(
        &self,
        inner: &mut Inner<O>,
        sender: SenderId,
        bucket: SubPool,
        new_tx: Arc<ValidEvmTransaction>,
    ) -> Result<TxHash, PoolErrorKind> {
        let nonce = new_tx.id.nonce;
        let bump = inner.config.price_bump;
        let state = inner.senders.get(&sender).expect("bucket_of found a sender entry");
        let old = match bucket {
            SubPool::Pending => state.pending.get(&nonce),
            SubPool::Queued => state.queued.get(&nonce),
        }
        .expect("bucket_of confirmed presence")
        .clone();

        let old_tip = old.transaction.gas_pricing.effective_tip(None);
        let new_tip = new_tx.transaction.gas_pricing.effective_tip(None);
        let old_cap = old.transaction.gas_pricing.fee_cap();
        let new_cap = new_tx.transaction.gas_pricing.fee_cap();

        if new_tip < bump.bumped(old_tip) || new_cap < bump.bumped(old_cap) {
            return Err(PoolErrorKind::ReplaceUnderpriced);
        }

        let old_hash = *old.hash();
        inner.all.remove(&old_hash);
        let state = inner.senders.get_mut(&sender).expect("checked above");
        match bucket {
            SubPool::Pending => {
                state.pending.insert(nonce, new_tx.clone());
            }
            SubPool::Queued => {
                state.queued.insert(nonce, new_tx.clone());
            }
        }
        inner.all.insert(*new_tx.hash(), new_tx.id);
        self.metrics.replaced_total.increment(1);
        Ok(old_hash)
    }

    /// Promotes queued transactions into pending while contiguous and affordable, then demotes
    /// from the pending tail back into queued (or drops them) once the balance no longer covers
    /// the cumulative cost. `account_nonce` anchors the first executable slot when the sender
    /// currently has nothing pending.
    fn promote_and_demote(&self, inner: &mut Inner<O>, sender: SenderId, account_nonce: u64, balance: U256) {
        let Some(state) = inner.senders.get_mut(&sender) else { return };

        let mut promoted = 0usize;
        loop {
            let next_nonce = state.pending.keys().next_back().map_or(account_nonce, |n| n + 1);
            let Some(candidate) = state.queued.get(&next_nonce) else { break };
            let cumulative: U256 = state.pending.values().map(|t| t.cost).fold(U256::ZERO, |a, b| a + b);
            if cumulative + candidate.cost >= balance {
                break;
            }
            let tx = state.queued.remove(&next_nonce).expect("just peeked");
            state.pending.insert(next_nonce, tx);
            promoted += 1;
        }
        if promoted > 0 {
            inner.pending_count += promoted;
            inner.queued_count -= promoted;
            self.metrics.promoted_total.increment(promoted as u64);
        }

        let mut demoted = 0usize;
        loop {
            let cumulative: U256 = state.pending.values().map(|t| t.cost).fold(U256::ZERO, |a, b| a + b);
            if cumulative < balance {
                break;
            }
            let Some((&worst_nonce, _)) = state.pending.iter().next_back() else { break };
            let tx = state.pending.remove(&worst_nonce).expect("just peeked");
            state.queued.insert(worst_nonce, tx);
            demoted += 1;
        }
        if demoted > 0 {
            inner.pending_count -= demoted;
            inner.queued_count += demoted;
            self.metrics.demoted_total.increment(demoted as u64);
        }
    }

    /// Pool-full eviction: drop the lowest-priced *evictable* transaction, tie-broken by highest
    /// nonce then oldest arrival. Local transactions are exempt from eviction (unless the pool is
    /// configured with `no_local_exemptions`), except `just_inserted` itself, which always
    /// remains a candidate so a pool made up entirely of local transactions can still reject an
    /// incoming one rather than grow without bound.
    fn evict_worst(&self, inner: &mut Inner<O>, just_inserted: &TransactionId) -> EvictOutcome {
        let exempt_locals = !inner.config.local.no_local_exemptions;
        let all_txs: Vec<Arc<ValidEvmTransaction>> =
            inner.senders.values().flat_map(|s| s.pending.values().chain(s.queued.values())).cloned().collect();

        let worst = all_txs
            .iter()
            .filter(|t| !exempt_locals || !t.local || t.id == *just_inserted)
            .min_by(|a, b| {
                let price_a = a.transaction.gas_pricing.fee_cap();
                let price_b = b.transaction.gas_pricing.fee_cap();
                price_a
                    .cmp(&price_b)
                    .then_with(|| b.id.nonce.cmp(&a.id.nonce))
                    .then_with(|| b.submission_id.cmp(&a.submission_id))
            })
            .cloned();

        let Some(worst) = worst else { return EvictOutcome::NothingToEvict };

        if worst.id != *just_inserted {
            self.remove_from_buckets(inner, &worst);
            return EvictOutcome::EvictedOther;
        }

        // `worst` is the just-inserted tx itself: it is the cheapest evictable candidate. Check
        // whether some other, cheaper transaction exists that is merely protected by the local
        // exemption rather than genuinely absent — that distinguishes a full pool that could
        // still make room (PoolFull) from one where the newcomer is simply the worst tx around
        // (Underpriced).
        let newcomer_price = worst.transaction.gas_pricing.fee_cap();
        let cheaper_but_protected =
            all_txs.iter().any(|t| t.id != *just_inserted && t.transaction.gas_pricing.fee_cap() < newcomer_price);

        self.remove_from_buckets(inner, &worst);
        if cheaper_but_protected {
            EvictOutcome::PoolFull
        } else {
            EvictOutcome::EvictedSelf
        }
    }

    fn remove_from_buckets(&self, inner: &mut Inner<O>, tx: &ValidEvmTransaction) {
        let sender = tx.id.sender;
        let nonce = tx.id.nonce;
        if let Some(state) = inner.senders.get_mut(&sender) {
            if state.pending.remove(&nonce).is_some() {
                inner.pending_count -= 1;
            } else if state.queued.remove(&nonce).is_some() {
                inner.queued_count -= 1;
            }
            if state.is_empty() {
                inner.senders.remove(&sender);
            }
        }
        inner.all.remove(tx.hash());
        inner.size_bytes = inner.size_bytes.saturating_sub(tx.size());
        self.metrics.evicted_total.increment(1);
    }

    /// Returns a per-sender mapping of pending transaction handles meeting the filter
    pub fn pending(&self, filter: PendingFilter) -> BTreeMap<SenderId, Vec<Arc<ValidEvmTransaction>>> {
        let inner = self.inner.read();
        let mut result = BTreeMap::new();
        for (&sender, state) in &inner.senders {
            let txs: Vec<_> = state
                .pending
                .values()
                .filter(|tx| {
                    if tx.transaction.is_blob() && filter.only_plain {
                        return false;
                    }
                    if !tx.transaction.is_blob() && filter.only_blob {
                        return false;
                    }
                    if let Some(min_tip) = filter.min_tip {
                        if tx.transaction.gas_pricing.effective_tip(filter.base_fee) < min_tip {
                            return false;
                        }
                    }
                    true
                })
                .cloned()
                .collect();
            if !txs.is_empty() {
                result.insert(sender, txs);
            }
        }
        result
    }

    /// Computes a transaction's priority under the pool's configured ordering, for callers
    /// (such as the merge iterator) that rank transactions without holding the pool lock open.
    pub fn priority(&self, tx: &EvmTransaction, base_fee: Option<u64>) -> Priority {
        self.inner.read().ordering.priority(tx, base_fee)
    }

    /// A priority-ordered snapshot over this pool's current pending transactions, matching
    /// `filter`. Unlike [`Self::pending`], the ordering is resolved while the read lock is held
    /// so callers never need a handle to the pool's ordering function.
    pub fn pending_view(&self, filter: PendingFilter) -> crate::pool::best::PendingPool {
        let inner = self.inner.read();
        let mut by_sender = BTreeMap::new();
        for (&sender, state) in &inner.senders {
            let txs: Vec<_> = state
                .pending
                .values()
                .filter(|tx| {
                    if tx.transaction.is_blob() && filter.only_plain {
                        return false;
                    }
                    if !tx.transaction.is_blob() && filter.only_blob {
                        return false;
                    }
                    if let Some(min_tip) = filter.min_tip {
                        if tx.transaction.gas_pricing.effective_tip(filter.base_fee) < min_tip {
                            return false;
                        }
                    }
                    true
                })
                .cloned()
                .collect();
            if !txs.is_empty() {
                by_sender.insert(sender, txs);
            }
        }
        crate::pool::best::PendingPool::from_by_sender(
            by_sender,
            &inner.ordering,
            filter.base_fee,
            |tx| tx.submission_id,
        )
    }

    pub fn sender_id(&self, addr: Address) -> Option<SenderId> {
        self.inner.read().identifiers.sender_id(&addr)
    }

    pub fn sender_state_kind(&self, sender: SenderId) -> SenderPoolState {
        self.inner.read().senders.get(&sender).map_or(SenderPoolState::Empty, SenderState::state)
    }

    /// Removes a transaction by hash.
    ///
    /// `out_of_bound` additionally drops every remaining transaction for that sender with a
    /// nonce less than or equal to the removed one's — the cleanup path used after a block
    /// inclusion, where the chain has already consumed those nonces. `unreserve` releases the
    /// sender's reservation once the sub-pool holds nothing left for them.
    pub fn remove_tx(&self, hash: TxHash, out_of_bound: bool, unreserve: bool) -> bool {
        let mut inner = self.inner.write();
        let Some(&id) = inner.all.get(&hash) else { return false };
        let sender = id.sender;

        let bucket = inner.bucket_of(&id);
        if let Some(state) = inner.senders.get_mut(&sender) {
            match bucket {
                Some(SubPool::Pending) => {
                    state.pending.remove(&id.nonce);
                    inner.pending_count -= 1;
                }
                Some(SubPool::Queued) => {
                    state.queued.remove(&id.nonce);
                    inner.queued_count -= 1;
                }
                None => {}
            }
        }
        inner.all.remove(&hash);

        if out_of_bound {
            let Inner { senders, all, pending_count, queued_count, .. } = &mut *inner;
            if let Some(state) = senders.get_mut(&sender) {
                let stale_pending: Vec<u64> =
                    state.pending.range(..=id.nonce).map(|(&n, _)| n).collect();
                for n in stale_pending {
                    if let Some(tx) = state.pending.remove(&n) {
                        all.remove(tx.hash());
                        *pending_count -= 1;
                    }
                }
                let stale_queued: Vec<u64> =
                    state.queued.range(..=id.nonce).map(|(&n, _)| n).collect();
                for n in stale_queued {
                    if let Some(tx) = state.queued.remove(&n) {
                        all.remove(tx.hash());
                        *queued_count -= 1;
                    }
                }
            }
        }

        let sender_addr = inner.identifiers.address(sender);
        let now_empty = inner.senders.get(&sender).is_none_or(SenderState::is_empty);
        if now_empty {
            inner.senders.remove(&sender);
        }
        self.metrics.pending_txs.set(inner.pending_count as f64);
        self.metrics.queued_txs.set(inner.queued_count as f64);
        drop(inner);

        if unreserve && now_empty {
            if let Some(addr) = sender_addr {
                self.reservations.release(addr, PoolKind::Evm);
            }
        }
        true
    }

    /// Chain-head reconciliation: drops mined nonces and re-runs promotion/demotion for
    /// every sender currently tracked.
    pub fn reset(&self, chain: &dyn ChainView) -> PoolResult<()> {
        let mut inner = self.inner.write();
        let senders: Vec<SenderId> = inner.senders.keys().copied().collect();
        for sender in senders {
            let Some(addr) = inner.identifiers.address(sender) else { continue };
            let account = chain
                .state_at(alloy_primitives::B256::ZERO, addr)
                .map_err(|e| PoolError::new(TxHash::ZERO, PoolErrorKind::StateLoadError(e)))?;

            {
                let Inner { senders, all, pending_count, queued_count, .. } = &mut *inner;
                let Some(state) = senders.get_mut(&sender) else { continue };

                let stale: Vec<u64> =
                    state.pending.range(..account.nonce).map(|(&n, _)| n).collect();
                for n in stale {
                    if let Some(tx) = state.pending.remove(&n) {
                        all.remove(tx.hash());
                        *pending_count -= 1;
                    }
                }
                let stale_queued: Vec<u64> =
                    state.queued.range(..account.nonce).map(|(&n, _)| n).collect();
                for n in stale_queued {
                    if let Some(tx) = state.queued.remove(&n) {
                        all.remove(tx.hash());
                        *queued_count -= 1;
                    }
                }
            }

            self.promote_and_demote(&mut inner, sender, account.nonce, account.balance);

            if inner.senders.get(&sender).is_some_and(SenderState::is_empty) {
                inner.senders.remove(&sender);
                drop(inner);
                self.reservations.release(addr, PoolKind::Evm);
                inner = self.inner.write();
            }
        }
        self.metrics.pending_txs.set(inner.pending_count as f64);
        self.metrics.queued_txs.set(inner.queued_count as f64);
        debug!(target: "dual_mempool", pending = inner.pending_count, queued = inner.queued_count, "reset complete");
        Ok(())
    }
}

enum EvictOutcome {
    EvictedSelf,
    EvictedOther,
    /// The newcomer is the cheapest evictable candidate, but a cheaper transaction exists
    /// elsewhere in the pool and is exempt from eviction (e.g. a local transaction).
    PoolFull,
    NothingToEvict,
}

/// Cheap, stateless checks that do not require an account lookup.
fn static_validate(tx: &EvmTransaction, chain: &dyn ChainView, local: bool) -> Result<(), PoolErrorKind> {
    if tx.sender.is_none() {
        return Err(PoolErrorKind::InvalidSignature);
    }
    if let Some(chain_id) = tx.chain_id {
        if chain_id != chain.config().chain_id {
            return Err(PoolErrorKind::ChainIdMismatch);
        }
    }
    if tx.intrinsic_gas() > tx.gas_limit {
        return Err(PoolErrorKind::IntrinsicGasTooLow);
    }
    if tx.worst_case_cost().is_none() {
        return Err(PoolErrorKind::IntrinsicGasTooLow);
    }
    if let Some(priority_fee) = tx.gas_pricing.max_priority_fee() {
        if priority_fee > tx.gas_pricing.fee_cap() {
            return Err(PoolErrorKind::FeeCapTooLow);
        }
    }
    if tx.is_blob() {
        return Err(PoolErrorKind::BlobNotAccepted);
    }
    let _ = local;
    trace!(target: "dual_mempool", hash = %tx.hash(), "static validation passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        evm_tx::{GasPricing, Signature, TxType},
        pool::ordering::EffectiveTipOrdering,
        test_utils::MockChainView,
    };
    use alloy_primitives::{Bytes, U256};

    fn make_tx(sender: Address, nonce: u64, gas_price: u128) -> EvmTransaction {
        EvmTransaction::new(
            TxType::Legacy,
            Some(1),
            nonce,
            GasPricing::Legacy { gas_price },
            21_000,
            Some(Address::repeat_byte(0xAA)),
            U256::ZERO,
            Bytes::new(),
            vec![],
            Signature { v: 27, r: U256::from(1), s: U256::from(1) },
            sender,
        )
    }

    fn pool() -> TxPool<EffectiveTipOrdering> {
        TxPool::new(EffectiveTipOrdering, PoolConfig::default(), SenderReservations::new())
    }

    #[test]
    fn nonce_gap_then_fill_promotes_in_order() {
        let pool = pool();
        let chain = MockChainView::with_account(Address::repeat_byte(1), U256::from(10u64.pow(18)), 0);
        let sender = Address::repeat_byte(1);

        for nonce in [5u64, 3, 1, 2, 4] {
            let res = pool.add(vec![make_tx(sender, nonce, 1_000_000_000)], true, &chain, &PoolContext::default());
            assert!(res[0].is_ok(), "nonce {nonce} should be admitted: {:?}", res[0]);
        }
        let (pending, queued) = pool.stats();
        assert_eq!(pending, 0);
        assert_eq!(queued, 5);

        let res = pool.add(vec![make_tx(sender, 0, 1_000_000_000)], true, &chain, &PoolContext::default());
        assert!(res[0].is_ok());
        let (pending, queued) = pool.stats();
        assert_eq!(pending, 6);
        assert_eq!(queued, 0);
    }

    #[test]
    fn replace_by_fee_requires_bump() {
        let pool = pool();
        let chain = MockChainView::with_account(Address::repeat_byte(2), U256::from(10u64.pow(18)), 0);
        let sender = Address::repeat_byte(2);

        let r1 = pool.add(vec![make_tx(sender, 0, 10_000_000_000)], true, &chain, &PoolContext::default());
        assert!(r1[0].is_ok());

        // 5% bump: rejected (default bump is 10%)
        let r2 = pool.add(vec![make_tx(sender, 0, 10_500_000_000)], true, &chain, &PoolContext::default());
        assert!(matches!(r2[0], Err(ref e) if e.kind == PoolErrorKind::ReplaceUnderpriced));

        // 10%+ bump: accepted
        let r3 = pool.add(vec![make_tx(sender, 0, 11_000_000_000)], true, &chain, &PoolContext::default());
        assert!(matches!(r3[0], Ok(AddedTransactionOutcome::Replaced { .. })));

        let (pending, queued) = pool.stats();
        assert_eq!(pending, 1);
        assert_eq!(queued, 0);
    }

    #[test]
    fn nonce_too_low_is_rejected() {
        let pool = pool();
        let chain = MockChainView::with_account(Address::repeat_byte(3), U256::from(10u64.pow(18)), 5);
        let sender = Address::repeat_byte(3);
        let res = pool.add(vec![make_tx(sender, 2, 1_000_000_000)], true, &chain, &PoolContext::default());
        assert!(matches!(res[0], Err(ref e) if matches!(e.kind, PoolErrorKind::NonceTooLow { .. })));
    }

    #[test]
    fn balance_too_low_is_rejected() {
        let pool = pool();
        let chain = MockChainView::with_account(Address::repeat_byte(4), U256::from(1000u64), 0);
        let sender = Address::repeat_byte(4);
        let res = pool.add(vec![make_tx(sender, 0, 1_000_000_000)], true, &chain, &PoolContext::default());
        assert!(matches!(res[0], Err(ref e) if matches!(e.kind, PoolErrorKind::BalanceTooLow { .. })));
    }

    #[test]
    fn reservation_blocks_second_owner() {
        let pool = pool();
        let sender = Address::repeat_byte(5);
        assert!(pool.reservations.try_reserve(sender, PoolKind::App));
        let chain = MockChainView::with_account(sender, U256::from(10u64.pow(18)), 0);
        let res = pool.add(vec![make_tx(sender, 0, 1_000_000_000)], true, &chain, &PoolContext::default());
        assert!(matches!(res[0], Err(ref e) if matches!(e.kind, PoolErrorKind::SenderUnreservable(_))));
    }

    #[test]
    fn pool_full_evicts_the_cheapest_other_tx() {
        let mut config = PoolConfig::default();
        config.limit.max_txs = 2;
        let pool = TxPool::new(EffectiveTipOrdering, config, SenderReservations::new());
        let chain = MockChainView::with_account(Address::repeat_byte(20), U256::from(10u64.pow(18)), 0);
        chain.set_account(Address::repeat_byte(21), U256::from(10u64.pow(18)), 0);
        chain.set_account(Address::repeat_byte(22), U256::from(10u64.pow(18)), 0);

        let a = pool.add(vec![make_tx(Address::repeat_byte(20), 0, 1)], false, &chain, &PoolContext::default());
        assert!(a[0].is_ok());
        let b = pool.add(vec![make_tx(Address::repeat_byte(21), 0, 2)], false, &chain, &PoolContext::default());
        assert!(b[0].is_ok());

        let c = pool.add(vec![make_tx(Address::repeat_byte(22), 0, 3)], false, &chain, &PoolContext::default());
        assert!(c[0].is_ok(), "the newcomer is admitted; the cheaper existing tx is evicted instead");

        let (pending, queued) = pool.stats();
        assert_eq!(pending + queued, 2);
        assert!(pool.sender_id(Address::repeat_byte(20)).is_none(), "the 1 gwei tx was the cheapest and got evicted");
    }

    #[test]
    fn pool_full_rejects_newcomer_when_only_cheaper_tx_is_local_exempt() {
        let mut config = PoolConfig::default();
        config.limit.max_txs = 2;
        let pool = TxPool::new(EffectiveTipOrdering, config, SenderReservations::new());
        let chain = MockChainView::with_account(Address::repeat_byte(23), U256::from(10u64.pow(18)), 0);
        chain.set_account(Address::repeat_byte(24), U256::from(10u64.pow(18)), 0);
        chain.set_account(Address::repeat_byte(25), U256::from(10u64.pow(18)), 0);

        let a = pool.add(vec![make_tx(Address::repeat_byte(23), 0, 1)], true, &chain, &PoolContext::default());
        assert!(a[0].is_ok());
        let b = pool.add(vec![make_tx(Address::repeat_byte(24), 0, 2)], true, &chain, &PoolContext::default());
        assert!(b[0].is_ok());

        let c = pool.add(vec![make_tx(Address::repeat_byte(25), 0, 3)], false, &chain, &PoolContext::default());
        assert!(
            matches!(c[0], Err(ref e) if e.kind == PoolErrorKind::PoolFull),
            "the only cheaper tx is local and exempt from eviction, so the pool is genuinely full"
        );

        let (pending, queued) = pool.stats();
        assert_eq!(pending + queued, 2, "the rejected newcomer must not remain in the pool");
    }

    #[test]
    fn reset_drops_mined_and_promotes_queued() {
        let pool = pool();
        let sender = Address::repeat_byte(6);
        let chain = MockChainView::with_account(sender, U256::from(10u64.pow(18)), 0);

        for nonce in [0u64, 1, 3] {
            let res = pool.add(vec![make_tx(sender, nonce, 1_000_000_000)], true, &chain, &PoolContext::default());
            assert!(res[0].is_ok());
        }
        let (pending, queued) = pool.stats();
        assert_eq!(pending, 2);
        assert_eq!(queued, 1);

        chain.set_account(sender, U256::from(10u64.pow(18)), 2);
        pool.reset(&chain).unwrap();

        let (pending, queued) = pool.stats();
        assert_eq!(pending, 0, "nonce 2 never arrived, so 3 stays queued");
        assert_eq!(queued, 1);
    }
}
