//! Error types for the faucet ledger core.

use thiserror::Error;

/// Malformed input for one of the core types.
///
/// These are client-caused: the caller sent something the ledger cannot
/// store, and retrying the same input will fail the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request id must not be empty")]
    EmptyRequestId,

    #[error("address must not be empty")]
    EmptyAddress,

    #[error("transaction id must not be empty")]
    EmptyTxId,

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, ValidationError>;
