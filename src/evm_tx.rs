//! EVM transaction envelopes.
//!
//! Three recognized shapes, bit-exact with mainnet Ethereum: legacy, EIP-2930 access-list and
//! EIP-1559 dynamic-fee. Blob transactions (type `0x03`) are recognized only long enough to be
//! rejected under the `only_plain` policy — this pool never admits them.

use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
use sha3::{Digest, Keccak256};

/// An access-list entry: an address plus the storage slots the transaction pre-declares access
/// to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

pub type AccessList = Vec<AccessListItem>;

/// ECDSA signature components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

/// The fee fields of an EVM transaction, abstracting over legacy `gas_price` and EIP-1559
/// `max_fee_per_gas`/`max_priority_fee_per_gas`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPricing {
    Legacy { gas_price: u128 },
    Dynamic { max_fee_per_gas: u128, max_priority_fee_per_gas: u128 },
}

impl GasPricing {
    /// The maximum the sender could ever pay per unit of gas, used for the balance check
    /// and the replace-by-fee fee-cap comparison.
    pub const fn fee_cap(&self) -> u128 {
        match self {
            Self::Legacy { gas_price } => *gas_price,
            Self::Dynamic { max_fee_per_gas, .. } => *max_fee_per_gas,
        }
    }

    /// `min(max_priority_fee, max_fee - base_fee)` for dynamic-fee txs, `gas_price - base_fee`
    /// for legacy when `base_fee` is non-null.
    pub fn effective_tip(&self, base_fee: Option<u64>) -> u128 {
        let base_fee = base_fee.unwrap_or(0) as u128;
        match self {
            Self::Legacy { gas_price } => gas_price.saturating_sub(base_fee),
            Self::Dynamic { max_fee_per_gas, max_priority_fee_per_gas } => {
                let headroom = max_fee_per_gas.saturating_sub(base_fee);
                (*max_priority_fee_per_gas).min(headroom)
            }
        }
    }

    pub const fn max_priority_fee(&self) -> Option<u128> {
        match self {
            Self::Legacy { .. } => None,
            Self::Dynamic { max_priority_fee_per_gas, .. } => Some(*max_priority_fee_per_gas),
        }
    }
}

/// Transaction type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxType {
    Legacy,
    Eip2930,
    Eip1559,
    /// EIP-4844 (type `0x03`): recognized only so it can be rejected.
    Eip4844,
}

/// A decoded EVM transaction envelope, sans signature for hashing purposes but signature is kept
/// for replay/propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmTransaction {
    pub tx_type: TxType,
    pub chain_id: Option<u64>,
    pub nonce: u64,
    pub gas_pricing: GasPricing,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub access_list: AccessList,
    pub signature: Signature,
    /// Recovered sender; `None` until signature verification runs.
    pub sender: Option<Address>,
    hash: TxHash,
}

impl EvmTransaction {
    /// Builds a transaction and computes its hash. `sender` must already be the result of
    /// signature recovery — this constructor does not verify signatures itself, that happens
    /// during static validation in `pool::txpool`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tx_type: TxType,
        chain_id: Option<u64>,
        nonce: u64,
        gas_pricing: GasPricing,
        gas_limit: u64,
        to: Option<Address>,
        value: U256,
        data: Bytes,
        access_list: AccessList,
        signature: Signature,
        sender: Address,
    ) -> Self {
        let mut tx = Self {
            tx_type,
            chain_id,
            nonce,
            gas_pricing,
            gas_limit,
            to,
            value,
            data,
            access_list,
            signature,
            sender: Some(sender),
            hash: TxHash::ZERO,
        };
        tx.hash = tx.compute_hash();
        tx
    }

    /// Hash = keccak256 of a canonical byte encoding of the envelope sans signature. This does
    /// not implement full RLP; instead it hashes a stable field-order encoding, which satisfies
    /// the pool's only real requirement on the hash: that it is a deterministic,
    /// collision-resistant function of the envelope contents.
    fn compute_hash(&self) -> TxHash {
        let mut hasher = Keccak256::new();
        hasher.update([self.tx_type as u8]);
        if let Some(id) = self.chain_id {
            hasher.update(id.to_be_bytes());
        }
        hasher.update(self.nonce.to_be_bytes());
        match self.gas_pricing {
            GasPricing::Legacy { gas_price } => hasher.update(gas_price.to_be_bytes()),
            GasPricing::Dynamic { max_fee_per_gas, max_priority_fee_per_gas } => {
                hasher.update(max_fee_per_gas.to_be_bytes());
                hasher.update(max_priority_fee_per_gas.to_be_bytes());
            }
        }
        hasher.update(self.gas_limit.to_be_bytes());
        if let Some(to) = self.to {
            hasher.update(to.as_slice());
        }
        hasher.update(self.value.to_be_bytes::<32>());
        hasher.update(&self.data);
        TxHash::from_slice(&hasher.finalize())
    }

    pub const fn hash(&self) -> &TxHash {
        &self.hash
    }

    pub fn sender(&self) -> Address {
        self.sender.expect("sender must be recovered before a transaction enters the pool")
    }

    /// `value + gas_limit * fee_cap`, the worst-case cost used for the balance check. Returns
    /// `None` on overflow.
    pub fn worst_case_cost(&self) -> Option<U256> {
        let gas_cost = U256::from(self.gas_limit).checked_mul(U256::from(self.gas_pricing.fee_cap()))?;
        gas_cost.checked_add(self.value)
    }

    pub fn is_blob(&self) -> bool {
        matches!(self.tx_type, TxType::Eip4844)
    }

    /// Intrinsic gas: base 21000 plus calldata cost, ignoring access-list refinements (out of
    /// scope — the gas schedule itself belongs to the execution engine, not the pool).
    pub fn intrinsic_gas(&self) -> u64 {
        const TX_BASE_GAS: u64 = 21_000;
        const ZERO_BYTE_GAS: u64 = 4;
        const NONZERO_BYTE_GAS: u64 = 16;
        let data_gas: u64 = self
            .data
            .iter()
            .map(|b| if *b == 0 { ZERO_BYTE_GAS } else { NONZERO_BYTE_GAS })
            .sum();
        TX_BASE_GAS + data_gas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(nonce: u64, gas_price: u128) -> EvmTransaction {
        EvmTransaction::new(
            TxType::Legacy,
            Some(1),
            nonce,
            GasPricing::Legacy { gas_price },
            21_000,
            Some(Address::repeat_byte(2)),
            U256::ZERO,
            Bytes::new(),
            vec![],
            Signature { v: 27, r: U256::from(1), s: U256::from(1) },
            Address::repeat_byte(1),
        )
    }

    #[test]
    fn hash_changes_with_gas_price() {
        let a = sample(0, 1);
        let b = sample(0, 2);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn effective_tip_legacy() {
        let pricing = GasPricing::Legacy { gas_price: 5_000_000_000 };
        assert_eq!(pricing.effective_tip(Some(2_000_000_000)), 3_000_000_000);
        assert_eq!(pricing.effective_tip(None), 5_000_000_000);
    }

    #[test]
    fn effective_tip_dynamic_capped_by_headroom() {
        let pricing = GasPricing::Dynamic {
            max_fee_per_gas: 10_000_000_000,
            max_priority_fee_per_gas: 5_000_000_000,
        };
        // headroom = 10 - 8 = 2, capped below the priority fee
        assert_eq!(pricing.effective_tip(Some(8_000_000_000)), 2_000_000_000);
    }
}
