//! Error types for the faucet.

use faucet_ledger_core::ValidationError;
use faucet_ledger_cycle::CycleError;
use faucet_ledger_store::StoreError;
use thiserror::Error;

/// Errors surfaced to faucet callers.
#[derive(Debug, Error)]
pub enum FaucetError {
    /// The request itself is malformed.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// The verifier refused the request. Holds its message verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Driver error.
    #[error("cycle error: {0}")]
    Cycle(#[from] CycleError),

    /// Bad configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FaucetError {
    /// True when the caller caused the failure and retrying the same
    /// request will not help.
    pub fn is_client_error(&self) -> bool {
        matches!(self, FaucetError::Validation(_) | FaucetError::Rejected(_))
    }
}

/// Result type for faucet operations.
pub type Result<T> = std::result::Result<T, FaucetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(FaucetError::Validation(ValidationError::EmptyAddress).is_client_error());
        assert!(FaucetError::Rejected("bad token".into()).is_client_error());
        assert!(!FaucetError::Store(StoreError::Internal("down".into())).is_client_error());
        assert!(!FaucetError::Config("nope".into()).is_client_error());
    }

    #[test]
    fn test_rejection_message_is_verbatim() {
        let err = FaucetError::Rejected("timeout-or-duplicate".into());
        assert_eq!(err.to_string(), "timeout-or-duplicate");
    }
}
