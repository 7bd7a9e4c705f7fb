//! In-memory implementation of the Ledger trait.
//!
//! Volatile: everything is lost when the ledger is dropped.
//! Writers are serialized; readers work on the last committed snapshot and
//! never wait for a writer, even one blocked on a slow callback.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use faucet_ledger_core::{FundRequest, LedgerSummary, RequestId, Timestamp};

use crate::error::Result;
use crate::lifecycle;
use crate::traits::{BatchConfirmer, BatchSender, Ledger};
use crate::txn::{Committed, Snapshot};

/// Default deadline for a batch callback.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning for a [`MemoryLedger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOptions {
    /// Deadline for each batch callback. A callback that runs longer is
    /// treated as failed and its transaction aborted. `None` waits forever,
    /// holding the writer lock for as long as the callback takes.
    pub callback_timeout: Option<Duration>,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            callback_timeout: Some(DEFAULT_CALLBACK_TIMEOUT),
        }
    }
}

/// In-memory ledger store.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    committed: Committed,
    options: LedgerOptions,
}

impl MemoryLedger {
    /// Create an empty ledger with the default callback deadline.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LedgerOptions) -> Self {
        Self {
            committed: Committed::default(),
            options,
        }
    }

    pub fn options(&self) -> &LedgerOptions {
        &self.options
    }

    /// A consistent view of everything committed so far.
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.committed.snapshot()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn insert(&self, request: FundRequest) -> Result<()> {
        let mut txn = self.committed.begin().await?;
        let id = request.id().clone();
        txn.insert(request)?;
        txn.commit()?;
        debug!(request_id = %id, "inserted fund request");
        Ok(())
    }

    async fn scan(&self) -> Result<LedgerSummary> {
        Ok(self.snapshot()?.summary())
    }

    async fn get(&self, id: &RequestId) -> Result<Option<FundRequest>> {
        Ok(self.snapshot()?.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<FundRequest>> {
        Ok(self.snapshot()?.iter().cloned().collect())
    }

    async fn confirm(&self, confirmer: &dyn BatchConfirmer, limit: usize) -> Result<usize> {
        let txn = self.committed.begin().await?;
        lifecycle::confirm(txn, confirmer, limit, self.options.callback_timeout).await
    }

    async fn expire(&self, now: Timestamp, ttl: Duration) -> Result<usize> {
        let txn = self.committed.begin().await?;
        lifecycle::expire(txn, now, ttl)
    }

    async fn retry(&self) -> Result<usize> {
        let txn = self.committed.begin().await?;
        lifecycle::retry(txn)
    }

    async fn send(&self, sender: &dyn BatchSender, limit: usize) -> Result<usize> {
        let txn = self.committed.begin().await?;
        lifecycle::send(txn, sender, limit, self.options.callback_timeout).await
    }
}
