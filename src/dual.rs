//! The dual-lane mempool: one EVM sub-pool, one application sub-pool, classified and routed by
//! message shape, merged for block proposal via [`crate::merge::MergeIterator`].

use crate::{
    app::{AppSubPool, AppTransaction},
    chain::{ChainView, PoolContext},
    error::{PoolError, PoolErrorKind, PoolResult},
    evm_tx::EvmTransaction,
    merge::MergeIterator,
    pool::{ordering::TransactionOrdering, txpool::TxPool, PendingFilter},
    reservation::{PoolKind, SenderReservations},
};
use alloy_primitives::TxHash;
use std::sync::Arc;

/// What an incoming transaction decodes to, before it is routed to a sub-pool.
pub enum RawTransaction {
    /// A single EVM-shaped message.
    Evm(EvmTransaction),
    /// Anything else — forwarded to the application sub-pool as-is.
    App(AppTransaction),
    /// Zero messages.
    Empty,
}

/// A predicate deciding whether a given pool error counts as a "bad sequence" failure — the kind
/// the ABCI check-tx hook reacts to by calling [`DualMempool::insert_invalid_sequence`]. Exposed
/// as a trait object so callers can plug in whatever classification their check-tx hook uses
/// without the pool hardcoding one error kind.
pub struct InvalidSequencePredicate(pub Box<dyn Fn(&PoolErrorKind) -> bool + Send + Sync>);

impl Default for InvalidSequencePredicate {
    fn default() -> Self {
        Self(Box::new(|kind| matches!(kind, PoolErrorKind::NonceTooLow { .. })))
    }
}

impl InvalidSequencePredicate {
    pub fn matches(&self, error: &PoolError) -> bool {
        (self.0)(&error.kind)
    }
}

/// Combines exactly one EVM sub-pool with exactly one application sub-pool behind the contract
/// the consensus front-end drives: `insert`, `insert_invalid_sequence`, `select`, `select_by`,
/// `remove`, `count_tx`.
pub struct DualMempool<C: ChainView, O: TransactionOrdering, A: AppSubPool> {
    chain: Arc<C>,
    evm: Arc<TxPool<O>>,
    app: Arc<A>,
    reservations: SenderReservations,
    invalid_sequence: InvalidSequencePredicate,
}

impl<C: ChainView, O: TransactionOrdering, A: AppSubPool> DualMempool<C, O, A> {
    /// `evm_subpool_count` must be exactly `1`: the pool owns exactly one EVM sub-pool instance,
    /// and construction panics otherwise rather than silently accepting a misconfiguration that
    /// would violate the sender-reservation invariant.
    pub fn new(
        chain: Arc<C>,
        evm: Arc<TxPool<O>>,
        app: Arc<A>,
        reservations: SenderReservations,
        evm_subpool_count: usize,
        invalid_sequence: InvalidSequencePredicate,
    ) -> Self {
        assert_eq!(evm_subpool_count, 1, "DualMempool must own exactly one EVM sub-pool");
        Self { chain, evm, app, reservations, invalid_sequence }
    }

    /// Classifies and routes a transaction: a single EVM-shaped message goes to the EVM sub-pool
    /// as a local submission; anything else is forwarded to the application sub-pool. `ctx` is
    /// honored for the EVM lane's blocking account-state load; a cancelled context fails the
    /// call without mutating either sub-pool.
    pub fn insert(&self, ctx: &PoolContext, tx: RawTransaction) -> PoolResult<()> {
        if ctx.is_cancelled() {
            return Err(PoolError::new(TxHash::ZERO, PoolErrorKind::Cancelled));
        }
        match tx {
            RawTransaction::Empty => Err(PoolError::new(TxHash::ZERO, PoolErrorKind::NoMessages)),
            RawTransaction::Evm(envelope) => {
                let hash = *envelope.hash();
                let results = self.evm.add(vec![envelope], true, self.chain.as_ref(), ctx);
                results.into_iter().next().unwrap_or(Err(PoolError::new(hash, PoolErrorKind::WrongShape))).map(|_| ())
            }
            RawTransaction::App(app_tx) => {
                if !self.reservations.try_reserve(app_tx.sender, PoolKind::App) {
                    return Err(PoolError::new(
                        app_tx.hash,
                        PoolErrorKind::SenderUnreservable(app_tx.sender),
                    ));
                }
                let sender = app_tx.sender;
                self.app.insert(app_tx.clone()).map_err(|_| {
                    if !self.app.has_sender(sender) {
                        self.reservations.release(sender, PoolKind::App);
                    }
                    PoolError::new(app_tx.hash, PoolErrorKind::WrongShape)
                })
            }
        }
    }

    /// Whether `error` is the kind of bad-sequence failure that should route a retry through
    /// [`Self::insert_invalid_sequence`] rather than being reported straight back to the
    /// submitter. Delegates to the predicate supplied at construction.
    pub fn is_invalid_sequence(&self, error: &PoolError) -> bool {
        self.invalid_sequence.matches(error)
    }

    /// Invoked by the ABCI check-tx hook when check-tx reported a bad-sequence error. EVM-shaped
    /// transactions are parked in the EVM sub-pool as a non-local (future-nonce) submission so
    /// they have a chance to become executable once earlier nonces land; anything else is
    /// discarded silently, since the application sub-pool offers no mechanism to hold and later
    /// promote an out-of-sequence transaction.
    pub fn insert_invalid_sequence(&self, tx: RawTransaction) {
        if let RawTransaction::Evm(envelope) = tx {
            let _ = self.evm.add(vec![envelope], false, self.chain.as_ref(), &PoolContext::default());
        }
    }

    /// Builds a [`MergeIterator`] over both sub-pools' current heads. A cancelled `ctx` yields an
    /// iterator that is already exhausted rather than an error, since `select` has no failure
    /// channel of its own and building the snapshot performs no mutation to undo.
    pub fn select(&self, ctx: &PoolContext, skip: usize) -> MergeIterator {
        if ctx.is_cancelled() {
            return MergeIterator::new(crate::pool::best::PendingPool::default(), crate::app::empty_iterator(), String::new());
        }
        let base_fee = self.chain.current_header().base_fee;
        let filter = PendingFilter { base_fee, only_plain: true, only_blob: false, min_tip: None };
        let evm_view = self.evm.pending_view(filter);
        let app_iter = self.app.select(skip);
        let bond_denom = self.chain.config().evm_denom.clone();
        MergeIterator::new(evm_view, app_iter, bond_denom)
    }

    /// As [`Self::select`], but the returned stream already stops once `predicate` rejects a
    /// transaction — termination is guaranteed because both underlying iterators are finite.
    pub fn select_by(
        &self,
        ctx: &PoolContext,
        skip: usize,
        predicate: impl Fn(&crate::merge::CanonicalTx) -> bool,
    ) -> Vec<crate::merge::CanonicalTx> {
        let mut iter = self.select(ctx, skip);
        let mut out = Vec::new();
        while let Some(tx) = iter.tx() {
            if !predicate(&tx) {
                break;
            }
            out.push(tx);
            if iter.next().is_none() {
                break;
            }
        }
        out
    }

    /// Symmetrical to `insert`: EVM-shaped transactions are removed (and their sender's
    /// reservation released) from the EVM sub-pool; everything else is forwarded.
    pub fn remove(&self, tx: RawTransaction) -> PoolResult<()> {
        match tx {
            RawTransaction::Empty => Err(PoolError::new(TxHash::ZERO, PoolErrorKind::NoMessages)),
            RawTransaction::Evm(envelope) => {
                self.evm.remove_tx(*envelope.hash(), true, true);
                Ok(())
            }
            RawTransaction::App(app_tx) => {
                let sender = app_tx.sender;
                self.app.remove(&app_tx);
                if !self.app.has_sender(sender) {
                    self.reservations.release(sender, PoolKind::App);
                }
                Ok(())
            }
        }
    }

    /// `app_sub_pool.CountTx() + evm_pending_count`; queued EVM transactions are intentionally
    /// excluded since they are not yet inclusion-ready.
    pub fn count_tx(&self) -> usize {
        let (pending, _queued) = self.evm.stats();
        self.app.count_tx() + pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::priority_queue::PriorityNoncePool,
        config::PoolConfig,
        evm_tx::{GasPricing, Signature, TxType},
        pool::ordering::EffectiveTipOrdering,
        test_utils::MockChainView,
    };
    use alloy_primitives::{Address, Bytes, U256};

    fn evm_tx(sender: Address, nonce: u64, gas_price: u128) -> EvmTransaction {
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

    fn dual_mempool() -> (DualMempool<MockChainView, EffectiveTipOrdering, PriorityNoncePool>, Address) {
        let sender = Address::repeat_byte(1);
        let chain = Arc::new(MockChainView::with_account(sender, U256::from(10u64.pow(18)), 0));
        let reservations = SenderReservations::new();
        let evm = Arc::new(TxPool::new(EffectiveTipOrdering, PoolConfig::default(), reservations.clone()));
        let app = Arc::new(PriorityNoncePool::new("wei"));
        let mempool = DualMempool::new(chain, evm, app, reservations, 1, InvalidSequencePredicate::default());
        (mempool, sender)
    }

    #[test]
    #[should_panic(expected = "exactly one EVM sub-pool")]
    fn construction_rejects_wrong_subpool_count() {
        let sender = Address::repeat_byte(1);
        let chain = Arc::new(MockChainView::with_account(sender, U256::from(1u64), 0));
        let reservations = SenderReservations::new();
        let evm = Arc::new(TxPool::new(EffectiveTipOrdering, PoolConfig::default(), reservations.clone()));
        let app = Arc::new(PriorityNoncePool::new("wei"));
        let _ = DualMempool::new(chain, evm, app, reservations, 2, InvalidSequencePredicate::default());
    }

    #[test]
    fn insert_routes_evm_shaped_tx_to_evm_pool() {
        let (mempool, sender) = dual_mempool();
        mempool.insert(&PoolContext::default(), RawTransaction::Evm(evm_tx(sender, 0, 1_000_000_000))).unwrap();
        assert_eq!(mempool.count_tx(), 1);
    }

    #[test]
    fn count_tx_excludes_queued_evm_txs() {
        let (mempool, sender) = dual_mempool();
        mempool.insert(&PoolContext::default(), RawTransaction::Evm(evm_tx(sender, 5, 1_000_000_000))).unwrap();
        assert_eq!(mempool.count_tx(), 0, "nonce 5 is queued, not pending");
    }

    #[test]
    fn insert_invalid_sequence_discards_non_evm_silently() {
        let (mempool, _sender) = dual_mempool();
        let app_tx = AppTransaction {
            hash: alloy_primitives::B256::repeat_byte(9),
            sender: Address::repeat_byte(2),
            sequence: 0,
            fee: crate::app::FeeBundle::single("wei", U256::from(1u64)),
            messages: vec![],
        };
        mempool.insert_invalid_sequence(RawTransaction::App(app_tx));
        assert_eq!(mempool.count_tx(), 0);
    }

    #[test]
    fn app_insert_respects_an_existing_evm_reservation() {
        let (mempool, sender) = dual_mempool();
        mempool.insert(&PoolContext::default(), RawTransaction::Evm(evm_tx(sender, 0, 1_000_000_000))).unwrap();

        let app_tx = AppTransaction {
            hash: alloy_primitives::B256::repeat_byte(3),
            sender,
            sequence: 0,
            fee: crate::app::FeeBundle::single("wei", U256::from(1u64)),
            messages: vec![],
        };
        assert!(mempool.insert(&PoolContext::default(), RawTransaction::App(app_tx)).is_err());
    }

    #[test]
    fn cancelled_context_rejects_insert_without_touching_state() {
        let (mempool, sender) = dual_mempool();
        let ctx = PoolContext::new(0);
        ctx.cancel();
        let result = mempool.insert(&ctx, RawTransaction::Evm(evm_tx(sender, 0, 1_000_000_000)));
        assert!(matches!(result, Err(ref e) if e.kind == PoolErrorKind::Cancelled));
        assert_eq!(mempool.count_tx(), 0);
    }

    #[test]
    fn cancelled_context_yields_an_empty_selection() {
        let (mempool, sender) = dual_mempool();
        mempool.insert(&PoolContext::default(), RawTransaction::Evm(evm_tx(sender, 0, 1_000_000_000))).unwrap();

        let ctx = PoolContext::new(0);
        ctx.cancel();
        let iter = mempool.select(&ctx, 0);
        assert!(iter.tx().is_none());
    }

    #[test]
    fn is_invalid_sequence_matches_nonce_too_low() {
        let (mempool, _sender) = dual_mempool();
        let error = PoolError::new(
            alloy_primitives::TxHash::ZERO,
            PoolErrorKind::NonceTooLow { tx_nonce: 0, account_nonce: 1 },
        );
        assert!(mempool.is_invalid_sequence(&error));

        let other = PoolError::new(alloy_primitives::TxHash::ZERO, PoolErrorKind::PoolFull);
        assert!(!mempool.is_invalid_sequence(&other));
    }
}
