//! Transaction ordering: the pool never compares transactions directly, it goes through a small
//! trait so the priority function stays swappable without touching sub-pool bookkeeping.

use crate::evm_tx::EvmTransaction;

/// A transaction's priority under the current base fee. Higher sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(pub u128);

/// Computes a transaction's priority for the pending pool.
pub trait TransactionOrdering: Send + Sync + std::fmt::Debug + 'static {
    fn priority(&self, tx: &EvmTransaction, base_fee: Option<u64>) -> Priority;
}

/// The default ordering: effective tip under the current base fee.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectiveTipOrdering;

impl TransactionOrdering for EffectiveTipOrdering {
    fn priority(&self, tx: &EvmTransaction, base_fee: Option<u64>) -> Priority {
        Priority(tx.gas_pricing.effective_tip(base_fee))
    }
}
