use thiserror::Error;

use crate::Amount;

/// Protocol-wide error types for the SEVN farm.
///
/// Every variant aborts the operation that produced it; the engine never
/// commits partial state and never retries on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FarmError {
    /// The caller does not hold the admin capability.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Withdrawal exceeds the principal held by the position.
    #[error("Insufficient balance: requested {requested} but only {available} staked")]
    InsufficientBalance { requested: Amount, available: Amount },

    /// A pool already exists for the asset.
    #[error("Duplicate asset: {0}")]
    DuplicateAsset(String),

    /// Fee percentages, weights, or other configuration values are invalid.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The underlying value-transfer ledger rejected a transfer or mint.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// An emission or accumulator computation exceeded its integer width.
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Unknown pool index.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the current state, or a broken ledger invariant.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
