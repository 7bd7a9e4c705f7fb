//! Error types for the lifecycle driver.

use std::fmt;

use faucet_ledger_store::StoreError;
use thiserror::Error;

/// One step of a lifecycle cycle, in the order the driver runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Expire,
    Send,
    Confirm,
    Retry,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ORDER: [Phase; 4] = [Phase::Expire, Phase::Send, Phase::Confirm, Phase::Retry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Expire => "expire",
            Phase::Send => "send",
            Phase::Confirm => "confirm",
            Phase::Retry => "retry",
        }
    }

    /// Phases that come after this one.
    pub fn remaining(self) -> &'static [Phase] {
        match self {
            Phase::Expire => &[Phase::Send, Phase::Confirm, Phase::Retry],
            Phase::Send => &[Phase::Confirm, Phase::Retry],
            Phase::Confirm => &[Phase::Retry],
            Phase::Retry => &[],
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the driver.
#[derive(Debug, Error)]
pub enum CycleError {
    /// A ledger operation failed during a cycle.
    #[error("{phase} phase failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: StoreError,
    },

    /// The driver was configured with unusable values.
    #[error("invalid cycle config: {0}")]
    InvalidConfig(String),
}

impl CycleError {
    /// The phase that failed, if this is a phase failure.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            CycleError::Phase { phase, .. } => Some(*phase),
            CycleError::InvalidConfig(_) => None,
        }
    }
}

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, CycleError>;
