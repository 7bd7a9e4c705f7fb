//! The four batch procedures that move fund requests through their lifecycle.
//!
//! Each one consumes a write transaction and either commits it or aborts it.
//! Callbacks run while the transaction is open, so no other writer can
//! change the candidate records between the scan and the apply step.

use std::future::Future;
use std::time::Duration;

use faucet_ledger_core::{FundRequest, RequestId, Timestamp, TxId};
use tracing::{debug, info, warn};

use crate::error::{Operation, Result, StoreError};
use crate::traits::{BatchConfirmer, BatchSender};
use crate::txn::WriteTxn;

/// Await a callback, applying the optional deadline and wrapping its error.
async fn invoke<T, F>(operation: Operation, deadline: Option<Duration>, call: F) -> Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let outcome = match deadline {
        Some(timeout) => tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| StoreError::CallbackTimeout { operation, timeout })?,
        None => call.await,
    };

    outcome.map_err(|source| StoreError::Callback {
        operation,
        source: source.into(),
    })
}

fn check_len(operation: Operation, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(StoreError::BatchLengthMismatch {
            operation,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Confirm up to `limit` in-flight requests.
pub(crate) async fn confirm(
    mut txn: WriteTxn<'_>,
    confirmer: &dyn BatchConfirmer,
    limit: usize,
    deadline: Option<Duration>,
) -> Result<usize> {
    // The limit bounds the in-flight requests collected, not the scan.
    let (ids, tx_ids): (Vec<RequestId>, Vec<TxId>) = txn
        .base()
        .iter()
        .filter_map(|r| r.tx_id().map(|tx| (r.id().clone(), tx.clone())))
        .take(limit)
        .unzip();

    if tx_ids.is_empty() {
        txn.abort();
        debug!("confirm: nothing in flight");
        return Ok(0);
    }

    let flags = match invoke(Operation::Confirm, deadline, confirmer.confirm_batch(&tx_ids)).await {
        Ok(flags) => flags,
        Err(e) => {
            warn!(batch = tx_ids.len(), error = %e, "confirm aborted");
            return Err(e);
        }
    };
    check_len(Operation::Confirm, tx_ids.len(), flags.len())?;

    let mut confirmed = 0;
    for (id, ok) in ids.iter().zip(flags) {
        if ok && txn.delete(id) {
            confirmed += 1;
        }
    }

    txn.commit()?;
    info!(batch = tx_ids.len(), confirmed, "confirm committed");
    Ok(confirmed)
}

/// Delete every request older than `ttl` at `now`.
pub(crate) fn expire(mut txn: WriteTxn<'_>, now: Timestamp, ttl: Duration) -> Result<usize> {
    let cutoff = now.cutoff(ttl);
    let expired: Vec<RequestId> = txn.base().created_before(cutoff).cloned().collect();

    let mut count = 0;
    for id in &expired {
        if txn.delete(id) {
            count += 1;
        }
    }

    txn.commit()?;
    if count > 0 {
        info!(expired = count, %now, ttl_secs = ttl.as_secs(), "expire committed");
    } else {
        debug!(%now, "expire: nothing to remove");
    }
    Ok(count)
}

/// Put every in-flight request back to pending.
pub(crate) fn retry(mut txn: WriteTxn<'_>) -> Result<usize> {
    // Expire and confirm have run this cycle, so whatever is still in flight
    // is fresh and unconfirmed.
    let stuck: Vec<FundRequest> = txn
        .base()
        .iter()
        .filter(|r| r.is_in_flight())
        .map(FundRequest::reset)
        .collect();

    let count = stuck.len();
    for request in stuck {
        txn.replace(request)?;
    }

    txn.commit()?;
    if count > 0 {
        info!(retried = count, "retry committed");
    }
    Ok(count)
}

/// Send up to `limit` pending requests.
pub(crate) async fn send(
    mut txn: WriteTxn<'_>,
    sender: &dyn BatchSender,
    limit: usize,
    deadline: Option<Duration>,
) -> Result<usize> {
    let batch: Vec<FundRequest> = txn
        .base()
        .iter()
        .filter(|r| r.is_pending())
        .take(limit)
        .cloned()
        .collect();

    if batch.is_empty() {
        txn.abort();
        debug!("send: nothing pending");
        return Ok(0);
    }

    let tx_ids = match invoke(Operation::Send, deadline, sender.send_batch(&batch)).await {
        Ok(tx_ids) => tx_ids,
        Err(e) => {
            warn!(batch = batch.len(), error = %e, "send aborted");
            return Err(e);
        }
    };
    check_len(Operation::Send, batch.len(), tx_ids.len())?;

    let sent = batch.len();
    for (request, tx_id) in batch.iter().zip(tx_ids) {
        txn.replace(request.dispatched(tx_id))?;
    }

    txn.commit()?;
    info!(sent, "send committed");
    Ok(sent)
}
