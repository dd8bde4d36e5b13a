//! Cross-sub-pool sender reservation.
//!
//! A sender may be managed by at most one sub-pool at a time. Because the two sub-pools
//! ([`crate::pool::txpool::TxPool`] and any [`crate::app::AppSubPool`]) are otherwise unaware of
//! each other, [`DualMempool`](crate::dual::DualMempool) hands both a clone of the same
//! [`SenderReservations`] registry so reservation is atomic across the pair: reserve a sender
//! before inserting into either sub-pool, release it once that sub-pool holds nothing of theirs.

use alloy_primitives::Address;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Which sub-pool currently owns a sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Evm,
    App,
}

#[derive(Debug, Default)]
struct Inner {
    owners: FxHashMap<Address, PoolKind>,
}

/// Shared, thread-safe sender reservation registry.
#[derive(Debug, Clone, Default)]
pub struct SenderReservations {
    inner: Arc<Mutex<Inner>>,
}

impl SenderReservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to reserve `addr` for `kind`. Returns `true` if the sender was already reserved
    /// by `kind` or was unreserved (and is now reserved by `kind`); returns `false` if another
    /// pool holds the reservation.
    pub fn try_reserve(&self, addr: Address, kind: PoolKind) -> bool {
        let mut inner = self.inner.lock();
        match inner.owners.get(&addr) {
            Some(owner) if *owner != kind => false,
            _ => {
                inner.owners.insert(addr, kind);
                true
            }
        }
    }

    /// Releases `addr`'s reservation, but only if it is currently held by `kind` — prevents a
    /// stale release racing a genuine reservation by the other pool.
    pub fn release(&self, addr: Address, kind: PoolKind) {
        let mut inner = self.inner.lock();
        if inner.owners.get(&addr) == Some(&kind) {
            inner.owners.remove(&addr);
        }
    }

    pub fn is_reserved_by(&self, addr: Address, kind: PoolKind) -> bool {
        self.inner.lock().owners.get(&addr) == Some(&kind)
    }

    #[cfg(test)]
    pub fn reserved_count(&self) -> usize {
        self.inner.lock().owners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutually_exclusive_reservation() {
        let reservations = SenderReservations::new();
        let addr = Address::repeat_byte(7);
        assert!(reservations.try_reserve(addr, PoolKind::Evm));
        assert!(!reservations.try_reserve(addr, PoolKind::App));
        assert!(reservations.try_reserve(addr, PoolKind::Evm));
        reservations.release(addr, PoolKind::Evm);
        assert!(reservations.try_reserve(addr, PoolKind::App));
    }
}
