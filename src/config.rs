//! Pool configuration.

/// Default replacement-by-fee bump, in percent.
pub const DEFAULT_PRICE_BUMP: u32 = 10;

/// Default number of pending slots a single sender may occupy before further transactions from
/// that sender are preferentially evicted under pool-full pressure.
pub const DEFAULT_MAX_ACCOUNT_SLOTS: usize = 16;

/// Default global pending+queued transaction-count cap.
pub const DEFAULT_MAX_POOL_TXS: usize = 10_000;

/// Default global pool byte-size cap (20 MiB).
pub const DEFAULT_MAX_POOL_SIZE_BYTES: usize = 20 * 1024 * 1024;

/// Minimum percentage price bump required to replace an existing transaction occupying the same
/// nonce slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBumpConfig {
    pub default_price_bump: u32,
}

impl Default for PriceBumpConfig {
    fn default() -> Self {
        Self { default_price_bump: DEFAULT_PRICE_BUMP }
    }
}

impl PriceBumpConfig {
    /// `old * (1 + bump / 100)`, saturating.
    pub fn bumped(&self, old: u128) -> u128 {
        old.saturating_add(old.saturating_mul(self.default_price_bump as u128) / 100)
    }
}

/// Global limits enforced across the whole pool (pending + queued).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubPoolLimit {
    pub max_txs: usize,
    pub max_size_bytes: usize,
}

impl Default for SubPoolLimit {
    fn default() -> Self {
        Self { max_txs: DEFAULT_MAX_POOL_TXS, max_size_bytes: DEFAULT_MAX_POOL_SIZE_BYTES }
    }
}

/// Whether local (node-originated) transactions get relaxed treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalTransactionConfig {
    /// Local transactions are never dropped by pool-full eviction.
    pub no_local_exemptions: bool,
}

/// Which EVM transaction shapes this sub-pool accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptancePolicy {
    #[default]
    OnlyPlain,
    OnlyBlob,
}

/// Full pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub price_bump: PriceBumpConfig,
    pub limit: SubPoolLimit,
    pub max_account_slots: usize,
    pub local: LocalTransactionConfig,
    pub acceptance: AcceptancePolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            price_bump: PriceBumpConfig::default(),
            limit: SubPoolLimit::default(),
            max_account_slots: DEFAULT_MAX_ACCOUNT_SLOTS,
            local: LocalTransactionConfig::default(),
            acceptance: AcceptancePolicy::default(),
        }
    }
}
