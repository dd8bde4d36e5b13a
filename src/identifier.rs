//! Internal sender/transaction identifiers.
//!
//! The pool never indexes directly by [`Address`](alloy_primitives::Address): addresses are
//! 20 bytes and comparing/hashing them repeatedly in hot loops is wasteful once a sender has
//! more than a handful of transactions in flight. Instead every sender seen by the pool is
//! assigned a small monotonically increasing [`SenderId`] the first time it is observed.

use alloy_primitives::Address;
use rustc_hash::FxHashMap;
use std::fmt;

/// Internal, process-local identifier for a transaction sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SenderId(u64);

impl SenderId {
    /// Constructs a sender id from a raw index. Only used by tests and [`SenderIdentifiers`].
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw numeric value, used by tests that need to derive deterministic addresses.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SenderId({})", self.0)
    }
}

/// A transaction identifier: the combination of sender and nonce uniquely identifies the slot a
/// transaction occupies, independent of its hash (which changes on replacement-by-fee).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId {
    pub sender: SenderId,
    pub nonce: u64,
}

impl TransactionId {
    pub const fn new(sender: SenderId, nonce: u64) -> Self {
        Self { sender, nonce }
    }

    /// The id of the transaction that would occupy the previous nonce slot for this sender, if
    /// any (`None` at nonce 0).
    pub fn ancestor(&self) -> Option<Self> {
        (self.nonce > 0).then(|| Self::new(self.sender, self.nonce - 1))
    }

    /// The id of the next nonce slot for this sender.
    pub fn descendant(&self) -> Self {
        Self::new(self.sender, self.nonce + 1)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sender, self.nonce)
    }
}

/// Bidirectional mapping between on-chain addresses and the [`SenderId`]s the pool uses
/// internally. Addresses are never evicted: the mapping is small (one entry per unique sender
/// ever seen) and eviction would risk handing out a reused id for a different address.
#[derive(Debug, Default)]
pub struct SenderIdentifiers {
    address_to_id: FxHashMap<Address, SenderId>,
    id_to_address: FxHashMap<SenderId, Address>,
    next_id: u64,
}

impl SenderIdentifiers {
    /// Returns the existing id for `addr`, assigning a fresh one if this is the first time the
    /// address has been observed.
    pub fn sender_id_or_create(&mut self, addr: Address) -> SenderId {
        if let Some(id) = self.address_to_id.get(&addr) {
            return *id;
        }
        let id = SenderId::new(self.next_id);
        self.next_id += 1;
        self.address_to_id.insert(addr, id);
        self.id_to_address.insert(id, addr);
        id
    }

    /// Looks up an existing id without creating one.
    pub fn sender_id(&self, addr: &Address) -> Option<SenderId> {
        self.address_to_id.get(addr).copied()
    }

    /// Reverse lookup, used for diagnostics and chain-head reconciliation.
    pub fn address(&self, id: SenderId) -> Option<Address> {
        self.id_to_address.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_address_gets_same_id() {
        let mut ids = SenderIdentifiers::default();
        let addr = Address::repeat_byte(1);
        let a = ids.sender_id_or_create(addr);
        let b = ids.sender_id_or_create(addr);
        assert_eq!(a, b);
        assert_eq!(ids.address(a), Some(addr));
    }

    #[test]
    fn distinct_addresses_get_distinct_ids() {
        let mut ids = SenderIdentifiers::default();
        let a = ids.sender_id_or_create(Address::repeat_byte(1));
        let b = ids.sender_id_or_create(Address::repeat_byte(2));
        assert_ne!(a, b);
    }

    #[test]
    fn ancestor_descendant() {
        let id = TransactionId::new(SenderId::new(0), 5);
        assert_eq!(id.ancestor(), Some(TransactionId::new(SenderId::new(0), 4)));
        assert_eq!(id.descendant(), TransactionId::new(SenderId::new(0), 6));
        let zero = TransactionId::new(SenderId::new(0), 0);
        assert_eq!(zero.ancestor(), None);
    }
}
