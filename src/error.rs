//! Pool error taxonomy.
//!
//! A thin [`PoolError`] wrapper carrying the offending transaction hash around a
//! [`PoolErrorKind`] enum of local, never-retried admission failures.
//! `StateLoadError` and cancellation are the only kinds an enclosing block proposal should treat
//! as fatal; everything else is reported back to the caller and otherwise ignored by the pool.

use alloy_primitives::{Address, TxHash};

/// Result alias used throughout the pool.
pub type PoolResult<T> = Result<T, PoolError>;

/// A pool error tied to the transaction hash that triggered it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("[{hash}] {kind}")]
pub struct PoolError {
    pub hash: TxHash,
    pub kind: PoolErrorKind,
}

impl PoolError {
    pub const fn new(hash: TxHash, kind: PoolErrorKind) -> Self {
        Self { hash, kind }
    }

    /// Whether this error indicates the transaction is permanently invalid rather than merely
    /// not-yet-executable (a distinction the ABCI check-tx hook relies on, see
    /// [`crate::dual::InvalidSequencePredicate`]).
    pub const fn is_bad_sequence(&self) -> bool {
        matches!(self.kind, PoolErrorKind::NonceTooLow { .. })
    }
}

/// Kinds of pool-local errors. All of these are reported to the caller and never retried
/// internally by the pool itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolErrorKind {
    #[error("transaction carries no messages")]
    NoMessages,

    #[error("expected a single EVM-shaped message")]
    WrongShape,

    #[error("transaction already known")]
    Known,

    #[error("nonce {tx_nonce} too low, account nonce is {account_nonce}")]
    NonceTooLow { tx_nonce: u64, account_nonce: u64 },

    #[error("balance too low: needs {required}, has {balance}")]
    BalanceTooLow { required: String, balance: String },

    #[error("transaction underpriced")]
    Underpriced,

    #[error("replacement transaction underpriced")]
    ReplaceUnderpriced,

    #[error("sender {0} is reserved by another sub-pool")]
    SenderUnreservable(Address),

    #[error("pool is full")]
    PoolFull,

    #[error("failed to decode transaction: {0}")]
    DecodeError(String),

    #[error("fee cap too low")]
    FeeCapTooLow,

    #[error("signature invalid")]
    InvalidSignature,

    #[error("chain id mismatch")]
    ChainIdMismatch,

    #[error("intrinsic gas exceeds gas limit")]
    IntrinsicGasTooLow,

    #[error("blob transactions are not accepted by this pool")]
    BlobNotAccepted,

    #[error("operation was cancelled")]
    Cancelled,

    #[error("failed to load chain state: {0}")]
    StateLoadError(String),
}
