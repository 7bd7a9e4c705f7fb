//! Error types for the store module.

use std::fmt;
use std::time::Duration;

use faucet_ledger_core::{RequestId, ValidationError};
use thiserror::Error;

/// Boxed error produced by an external callback.
pub type CallbackSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The ledger operation an error or log line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Scan,
    Confirm,
    Expire,
    Retry,
    Send,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Scan => "scan",
            Operation::Confirm => "confirm",
            Operation::Expire => "expire",
            Operation::Retry => "retry",
            Operation::Send => "send",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input from the caller. Not worth retrying.
    Validation,
    /// An external callback failed or misbehaved. The transaction was
    /// aborted and the next cycle will try again.
    Callback,
    /// The ledger itself failed.
    Internal,
}

/// Errors that can occur during ledger operations.
///
/// Every error from a write operation means its transaction was aborted and
/// the ledger is exactly as it was before the call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A request with this id is already stored.
    #[error("duplicate request id: {0}")]
    DuplicateKey(RequestId),

    /// The record was malformed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The batch callback returned an error. Its message is kept verbatim.
    #[error("{operation} callback failed: {source}")]
    Callback {
        operation: Operation,
        #[source]
        source: CallbackSource,
    },

    /// The batch callback did not finish within the configured deadline.
    #[error("{operation} callback timed out after {timeout:?}")]
    CallbackTimeout {
        operation: Operation,
        timeout: Duration,
    },

    /// The batch callback returned a different number of results than
    /// records it was given.
    #[error("{operation} callback returned {actual} results for {expected} records")]
    BatchLengthMismatch {
        operation: Operation,
        expected: usize,
        actual: usize,
    },

    /// Transaction engine failure.
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::DuplicateKey(_) | StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::Callback { .. }
            | StoreError::CallbackTimeout { .. }
            | StoreError::BatchLengthMismatch { .. } => ErrorKind::Callback,
            StoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The error returned by the callback, if that is what failed.
    pub fn callback_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            StoreError::Callback { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn poisoned() -> Self {
        StoreError::Internal("ledger lock poisoned".into())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_message_is_verbatim() {
        let err = StoreError::Callback {
            operation: Operation::Send,
            source: anyhow::anyhow!("Negative Testing").into(),
        };
        assert_eq!(err.kind(), ErrorKind::Callback);
        assert_eq!(err.callback_source().unwrap().to_string(), "Negative Testing");
        assert_eq!(err.to_string(), "send callback failed: Negative Testing");
    }

    #[test]
    fn test_kinds() {
        let dup = StoreError::DuplicateKey(RequestId::new("a").unwrap());
        assert_eq!(dup.kind(), ErrorKind::Validation);
        assert_eq!(StoreError::poisoned().kind(), ErrorKind::Internal);
        let mismatch = StoreError::BatchLengthMismatch {
            operation: Operation::Confirm,
            expected: 2,
            actual: 1,
        };
        assert_eq!(mismatch.kind(), ErrorKind::Callback);
    }
}
