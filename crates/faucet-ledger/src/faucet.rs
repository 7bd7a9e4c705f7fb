//! The Faucet: one handle over the ledger, its ingress and its driver.

use std::sync::Arc;

use faucet_ledger_core::LedgerSummary;
use faucet_ledger_cycle::Driver;
use faucet_ledger_store::{BatchConfirmer, BatchSender, Ledger, MemoryLedger};

use crate::config::FaucetConfig;
use crate::error::Result;
use crate::ingress::{Ingress, Verifier};

/// The main Faucet struct.
///
/// Owns a shared ledger and hands out the two things that use it:
/// - an [`Ingress`] for accepting requests
/// - a [`Driver`] for moving them through their lifecycle
pub struct Faucet<L: ?Sized = MemoryLedger> {
    ledger: Arc<L>,
    config: FaucetConfig,
}

impl Faucet<MemoryLedger> {
    /// Create a faucet over a fresh in-memory ledger.
    pub fn new(config: FaucetConfig) -> Result<Self> {
        let ledger = Arc::new(MemoryLedger::with_options(config.ledger));
        Self::with_ledger(ledger, config)
    }
}

impl<L: Ledger + ?Sized> Faucet<L> {
    /// Create a faucet over an existing ledger.
    pub fn with_ledger(ledger: Arc<L>, config: FaucetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { ledger, config })
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn config(&self) -> &FaucetConfig {
        &self.config
    }

    /// An ingress that checks callers with `verifier`.
    pub fn ingress<V: Verifier>(&self, verifier: V) -> Ingress<L, V> {
        Ingress::new(self.ledger.clone(), verifier)
    }

    /// Current request counts.
    pub async fn summary(&self) -> Result<LedgerSummary> {
        Ok(self.ledger.scan().await?)
    }

    /// A lifecycle driver using the configured cycle settings.
    pub fn driver<S, C>(&self, sender: S, confirmer: C) -> Result<Driver<L, S, C>>
    where
        S: BatchSender,
        C: BatchConfirmer,
    {
        Ok(Driver::new(
            self.ledger.clone(),
            sender,
            confirmer,
            self.config.cycle.clone(),
        )?)
    }
}
