//! Merges the EVM pending view and the application sub-pool's iterator into a single
//! proposer-facing ordered stream, deciding at each step which side's head wins by comparing fees
//! in a shared bond denomination.

use crate::{
    app::{AppIterator, AppTransaction},
    evm_tx::EvmTransaction,
    pool::best::PendingPool,
};
use alloy_primitives::U256;

/// A transaction realized into its canonical, denomination-neutral form for block inclusion.
#[derive(Debug, Clone)]
pub enum CanonicalTx {
    Evm(EvmTransaction),
    App(AppTransaction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Evm,
    App,
}

/// A stateful peek/advance cursor over the merged EVM/app stream. `tx()` may be called any number
/// of times without side effects; `next()` advances exactly one side's underlying cursor.
pub struct MergeIterator {
    evm_view: PendingPool,
    app_iter: Option<Box<dyn AppIterator>>,
    bond_denom: String,
    last_side: Option<Side>,
}

impl MergeIterator {
    pub fn new(evm_view: PendingPool, app_iter: Box<dyn AppIterator>, bond_denom: String) -> Self {
        Self { evm_view, app_iter: Some(app_iter), bond_denom, last_side: None }
    }

    fn app_head(&self) -> Option<AppTransaction> {
        self.app_iter.as_ref().and_then(|iter| iter.tx())
    }

    /// Chooses which side's head the merged stream should emit next, given that both heads are
    /// present. The app side wins only if it names a coin in `bond_denom` strictly larger than
    /// the EVM head's effective tip; ties and anything else favor EVM.
    fn choose(&self, evm_priority: u128, app_tx: &AppTransaction) -> Side {
        let Some(app_amount) = app_tx.fee.amount_of(&self.bond_denom) else { return Side::Evm };
        let evm_fee = U256::from(evm_priority);
        if app_amount > evm_fee {
            Side::App
        } else {
            Side::Evm
        }
    }

    /// Peeks the next transaction the merged stream would emit, without consuming it.
    pub fn tx(&self) -> Option<CanonicalTx> {
        let evm_head = self.evm_view.peek();
        let app_head = self.app_head();

        match (evm_head, app_head) {
            (None, None) => None,
            (Some(evm), None) => Some(CanonicalTx::Evm(evm.transaction.transaction.clone())),
            (None, Some(app)) => Some(CanonicalTx::App(app)),
            (Some(evm), Some(app)) => match self.choose(evm.priority.0, &app) {
                Side::App => Some(CanonicalTx::App(app)),
                Side::Evm => Some(CanonicalTx::Evm(evm.transaction.transaction.clone())),
            },
        }
    }

    /// Advances past the transaction last returned by `tx()`. Returns `None` once the merged
    /// stream is exhausted, `Some(())` if more remain on either side.
    pub fn next(&mut self) -> Option<()> {
        let evm_present = self.evm_view.peek().is_some();
        let app_present = self.app_head().is_some();

        if !evm_present && !app_present {
            return None;
        }

        let side = if !evm_present {
            Side::App
        } else if !app_present {
            Side::Evm
        } else {
            let evm_priority = self.evm_view.peek().expect("checked above").priority.0;
            let app_tx = self.app_head().expect("checked above");
            self.choose(evm_priority, &app_tx)
        };

        match side {
            Side::Evm => {
                self.evm_view.shift();
            }
            Side::App => {
                if let Some(iter) = self.app_iter.take() {
                    self.app_iter = iter.next();
                }
            }
        }
        self.last_side = Some(side);

        if self.evm_view.peek().is_some() || self.app_head().is_some() {
            Some(())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::{priority_queue::PriorityNoncePool, AppSubPool, FeeBundle},
        evm_tx::{GasPricing, Signature, TxType},
        identifier::SenderId,
        pool::{ordering::EffectiveTipOrdering, ValidEvmTransaction},
    };
    use alloy_primitives::{Address, Bytes, B256};
    use std::{collections::BTreeMap, sync::Arc};

    fn evm_tx(sender_id: SenderId, nonce: u64, gas_price: u128) -> Arc<ValidEvmTransaction> {
        let envelope = EvmTransaction::new(
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
            Address::repeat_byte(sender_id.raw() as u8 + 1),
        );
        Arc::new(ValidEvmTransaction {
            id: crate::identifier::TransactionId::new(sender_id, nonce),
            transaction: envelope,
            cost: U256::ZERO,
            local: true,
            submission_id: nonce,
        })
    }

    fn evm_view(gas_price: u128) -> PendingPool {
        let sender = SenderId::new(0);
        let mut by_sender = BTreeMap::new();
        by_sender.insert(sender, vec![evm_tx(sender, 0, gas_price)]);
        PendingPool::from_by_sender(by_sender, &EffectiveTipOrdering, None, |t| t.submission_id)
    }

    fn app_tx(amount: u64, denom: &str) -> AppTransaction {
        AppTransaction {
            hash: B256::repeat_byte(7),
            sender: Address::repeat_byte(9),
            sequence: 0,
            fee: FeeBundle::single(denom, U256::from(amount)),
            messages: vec![],
        }
    }

    #[test]
    fn app_wins_when_fee_strictly_exceeds_evm() {
        let evm_view = evm_view(3_000_000_000); // 3 gwei effective tip
        let app_pool = PriorityNoncePool::new("wei");
        app_pool.insert(app_tx(4_000_000_000, "wei")).unwrap();

        let merge = MergeIterator::new(evm_view, app_pool.select(0), "wei".to_string());
        assert!(matches!(merge.tx(), Some(CanonicalTx::App(_))));
    }

    #[test]
    fn wrong_denom_loses_to_evm() {
        let evm_view = evm_view(1_000_000_000);
        let app_pool = PriorityNoncePool::new("wei");
        app_pool.insert(app_tx(10_000_000_000, "uatom")).unwrap();

        let merge = MergeIterator::new(evm_view, app_pool.select(0), "wei".to_string());
        assert!(matches!(merge.tx(), Some(CanonicalTx::Evm(_))));
    }

    #[test]
    fn tie_favors_evm() {
        let evm_view = evm_view(3_000_000_000);
        let app_pool = PriorityNoncePool::new("wei");
        app_pool.insert(app_tx(3_000_000_000, "wei")).unwrap();

        let merge = MergeIterator::new(evm_view, app_pool.select(0), "wei".to_string());
        assert!(matches!(merge.tx(), Some(CanonicalTx::Evm(_))));
    }

    #[test]
    fn advancing_exhausts_both_sides() {
        let evm_view = evm_view(1_000_000_000);
        let app_pool = PriorityNoncePool::new("wei");
        app_pool.insert(app_tx(1, "wei")).unwrap();

        let mut merge = MergeIterator::new(evm_view, app_pool.select(0), "wei".to_string());
        let mut emitted = 0;
        while merge.tx().is_some() {
            emitted += 1;
            if merge.next().is_none() {
                break;
            }
        }
        assert_eq!(emitted, 2);
    }
}
