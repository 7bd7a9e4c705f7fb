//! Proptest generators for property-based testing.
//!
//! Besides value strategies, this module provides [`LedgerOp`] sequences and
//! a reference [`Model`] of the ledger's semantics, so any [`Ledger`]
//! implementation can be checked against it operation by operation.

use std::collections::BTreeMap;
use std::time::Duration;

use proptest::prelude::*;

use faucet_ledger_core::{Address, FundRequest, RequestId, RequestState, Timestamp, TxId};
use faucet_ledger_store::Ledger;

use crate::fixtures::{RecordingConfirmer, RecordingSender};

/// Seconds around `2021-08-29T04:00:07Z`.
const BASE_SECS: i64 = 1_630_209_607;

/// Generate a request id from a small pool, so duplicates happen.
pub fn request_id() -> impl Strategy<Value = RequestId> {
    "[a-f]{1,2}".prop_map(|s| RequestId::new(s).expect("non-empty id"))
}

/// Generate a hex address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(|bytes| {
        Address::new(format!("0x{}", hex::encode(bytes))).expect("non-empty address")
    })
}

/// Generate a timestamp within a ten-minute window.
pub fn timestamp() -> impl Strategy<Value = Timestamp> {
    (BASE_SECS..BASE_SECS + 600).prop_map(|s| Timestamp::from_secs(s).expect("in range"))
}

/// Generate a transaction id.
pub fn tx_id() -> impl Strategy<Value = TxId> {
    "[0-9a-f]{8,64}".prop_map(|s| TxId::new(s).expect("non-empty tx id"))
}

/// Generate a request state.
pub fn request_state() -> impl Strategy<Value = RequestState> {
    prop_oneof![
        Just(RequestState::Pending),
        tx_id().prop_map(|tx_id| RequestState::InFlight { tx_id }),
    ]
}

/// Generate a fund request in any state.
pub fn fund_request() -> impl Strategy<Value = FundRequest> {
    (request_id(), timestamp(), address(), request_state()).prop_map(
        |(id, created_at, address, state)| {
            FundRequest::new(id, created_at, address).with_state(state)
        },
    )
}

/// One ledger call, with the callback outcome baked in.
#[derive(Debug, Clone)]
pub enum LedgerOp {
    Insert(FundRequest),
    /// Send with a [`RecordingSender`], failing if `fail`.
    Send { limit: usize, fail: bool },
    /// Confirm answering `Some(flag)` for every tx, or failing on `None`.
    Confirm { limit: usize, answer: Option<bool> },
    Expire { now: Timestamp, ttl_secs: u64 },
    Retry,
}

/// Generate a single ledger operation.
pub fn ledger_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        4 => fund_request().prop_map(LedgerOp::Insert),
        2 => (0usize..5, any::<bool>()).prop_map(|(limit, fail)| LedgerOp::Send { limit, fail }),
        2 => (0usize..5, any::<Option<bool>>())
            .prop_map(|(limit, answer)| LedgerOp::Confirm { limit, answer }),
        1 => (timestamp(), 0u64..600)
            .prop_map(|(now, ttl_secs)| LedgerOp::Expire { now, ttl_secs }),
        1 => Just(LedgerOp::Retry),
    ]
}

/// Generate a sequence of ledger operations.
pub fn ledger_ops(max_len: usize) -> impl Strategy<Value = Vec<LedgerOp>> {
    prop::collection::vec(ledger_op(), 0..=max_len)
}

/// Reference semantics of the ledger, with no concurrency and no
/// transactions.
///
/// `apply` returns the count the ledger should report, or `None` where the
/// ledger should return an error and change nothing.
#[derive(Debug, Clone, Default)]
pub struct Model {
    records: BTreeMap<RequestId, FundRequest>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in id order.
    pub fn records(&self) -> Vec<FundRequest> {
        self.records.values().cloned().collect()
    }

    pub fn apply(&mut self, op: &LedgerOp) -> Option<usize> {
        match op {
            LedgerOp::Insert(request) => {
                if self.records.contains_key(request.id()) {
                    return None;
                }
                self.records.insert(request.id().clone(), request.clone());
                Some(0)
            }
            LedgerOp::Send { limit, fail } => {
                let batch: Vec<RequestId> = self
                    .records
                    .values()
                    .filter(|r| r.is_pending())
                    .take(*limit)
                    .map(|r| r.id().clone())
                    .collect();
                if batch.is_empty() {
                    return Some(0);
                }
                if *fail {
                    return None;
                }
                for id in &batch {
                    if let Some(request) = self.records.get_mut(id) {
                        *request = request.dispatched(RecordingSender::tx_id_for(id));
                    }
                }
                Some(batch.len())
            }
            LedgerOp::Confirm { limit, answer } => {
                let batch: Vec<RequestId> = self
                    .records
                    .values()
                    .filter(|r| r.is_in_flight())
                    .take(*limit)
                    .map(|r| r.id().clone())
                    .collect();
                if batch.is_empty() {
                    return Some(0);
                }
                match answer {
                    None => None,
                    Some(false) => Some(0),
                    Some(true) => {
                        for id in &batch {
                            self.records.remove(id);
                        }
                        Some(batch.len())
                    }
                }
            }
            LedgerOp::Expire { now, ttl_secs } => {
                let ttl = Duration::from_secs(*ttl_secs);
                let before = self.records.len();
                self.records
                    .retain(|_, r| !r.created_at().is_expired(*now, ttl));
                Some(before - self.records.len())
            }
            LedgerOp::Retry => {
                let mut count = 0;
                for request in self.records.values_mut() {
                    if request.is_in_flight() {
                        *request = request.reset();
                        count += 1;
                    }
                }
                Some(count)
            }
        }
    }
}

/// Run `op` against a real ledger. Errors become `None`.
pub async fn apply_to<L: Ledger + ?Sized>(ledger: &L, op: &LedgerOp) -> Option<usize> {
    match op {
        LedgerOp::Insert(request) => ledger.insert(request.clone()).await.ok().map(|_| 0),
        LedgerOp::Send { limit, fail } => {
            let sender = if *fail {
                RecordingSender::failing("send failed")
            } else {
                RecordingSender::new()
            };
            ledger.send(&sender, *limit).await.ok()
        }
        LedgerOp::Confirm { limit, answer } => {
            let confirmer = match answer {
                Some(true) => RecordingConfirmer::all_confirmed(),
                Some(false) => RecordingConfirmer::none_confirmed(),
                None => RecordingConfirmer::failing("confirm failed"),
            };
            ledger.confirm(&confirmer, *limit).await.ok()
        }
        LedgerOp::Expire { now, ttl_secs } => ledger
            .expire(*now, Duration::from_secs(*ttl_secs))
            .await
            .ok(),
        LedgerOp::Retry => ledger.retry().await.ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faucet_ledger_core::LedgerSummary;
    use faucet_ledger_store::MemoryLedger;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime")
    }

    proptest! {
        #[test]
        fn test_memory_ledger_matches_model(ops in ledger_ops(60)) {
            let ledger = MemoryLedger::new();
            let mut model = Model::new();

            runtime().block_on(async {
                for (step, op) in ops.iter().enumerate() {
                    let expected = model.apply(op);
                    let actual = apply_to(&ledger, op).await;
                    prop_assert_eq!(actual, expected, "step {} {:?}", step, op);
                }
                prop_assert_eq!(ledger.list().await.unwrap(), model.records());
                Ok(())
            })?;
        }

        #[test]
        fn test_scan_partitions_every_record(ops in ledger_ops(40)) {
            let ledger = MemoryLedger::new();

            runtime().block_on(async {
                for op in &ops {
                    apply_to(&ledger, op).await;
                    let scan = ledger.scan().await.unwrap();
                    let listed: LedgerSummary = ledger.list().await.unwrap().iter().collect();
                    prop_assert_eq!(scan, listed);
                    prop_assert_eq!(scan.pending + scan.in_flight, scan.total);
                }
                Ok(())
            })?;
        }

        #[test]
        fn test_retry_is_idempotent(requests in prop::collection::vec(fund_request(), 0..20)) {
            let ledger = MemoryLedger::new();

            runtime().block_on(async {
                for request in requests {
                    let _ = ledger.insert(request).await;
                }
                let in_flight = ledger.scan().await.unwrap().in_flight;

                prop_assert_eq!(ledger.retry().await.unwrap(), in_flight);
                prop_assert_eq!(ledger.retry().await.unwrap(), 0);
                prop_assert_eq!(ledger.scan().await.unwrap().in_flight, 0);
                Ok(())
            })?;
        }
    }
}
