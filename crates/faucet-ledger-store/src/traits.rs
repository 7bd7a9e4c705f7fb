//! Ledger trait: the interface the faucet service drives, plus the batch
//! callbacks the lifecycle operations call out to.
//!
//! The ledger knows nothing about chains. Sending and confirming are
//! delegated to a [`BatchSender`] and a [`BatchConfirmer`] supplied per call.

use std::time::Duration;

use async_trait::async_trait;
use faucet_ledger_core::{FundRequest, LedgerSummary, RequestId, Timestamp, TxId};

use crate::error::Result;

/// Dispatches a batch of pending requests to the chain.
#[async_trait]
pub trait BatchSender: Send + Sync {
    /// Send one transaction per request.
    ///
    /// Must return exactly one transaction id per request, in the same order.
    /// Any error aborts the whole batch.
    async fn send_batch(&self, requests: &[FundRequest]) -> anyhow::Result<Vec<TxId>>;
}

/// Checks whether dispatched transactions have landed.
#[async_trait]
pub trait BatchConfirmer: Send + Sync {
    /// Return one success flag per transaction id, in the same order.
    ///
    /// `false` means "not confirmed yet", not "failed forever".
    async fn confirm_batch(&self, tx_ids: &[TxId]) -> anyhow::Result<Vec<bool>>;
}

/// The Ledger trait: a transactional collection of fund requests.
///
/// Every write operation runs in a single transaction and is all-or-nothing:
/// on error nothing has changed. Records are visited in request-id order and
/// callbacks see them in that order.
///
/// # Cycle order
///
/// The lifecycle operations are meant to be driven as
/// `expire`, `send`, `confirm`, `retry` on every cycle. `retry` assumes
/// `expire` and `confirm` already ran, so any request still in flight is
/// fresh and unconfirmed.
#[async_trait]
pub trait Ledger: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Record Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a new request.
    ///
    /// Fails with `DuplicateKey` if the id is taken.
    async fn insert(&self, request: FundRequest) -> Result<()>;

    /// Count stored requests by state.
    async fn scan(&self) -> Result<LedgerSummary>;

    /// Look up one request.
    async fn get(&self, id: &RequestId) -> Result<Option<FundRequest>>;

    /// All requests, in id order.
    async fn list(&self) -> Result<Vec<FundRequest>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Confirm up to `limit` in-flight requests, deleting the ones whose
    /// transaction succeeded.
    ///
    /// Returns the number deleted. With nothing in flight the confirmer is
    /// not called.
    async fn confirm(&self, confirmer: &dyn BatchConfirmer, limit: usize) -> Result<usize>;

    /// Delete every request created more than `ttl` before `now`, whatever
    /// its state.
    async fn expire(&self, now: Timestamp, ttl: Duration) -> Result<usize>;

    /// Put every in-flight request back to pending.
    async fn retry(&self) -> Result<usize>;

    /// Send up to `limit` pending requests and mark them in flight.
    ///
    /// Returns the number sent. With nothing pending the sender is not
    /// called.
    async fn send(&self, sender: &dyn BatchSender, limit: usize) -> Result<usize>;
}
