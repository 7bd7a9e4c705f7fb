//! Test fixtures and mock chain callbacks.
//!
//! Common setup code for ledger, driver and ingress tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::Rng;

use faucet_ledger_core::{Address, FundRequest, LedgerSummary, RequestId, Timestamp, TxId};
use faucet_ledger_store::{BatchConfirmer, BatchSender, Ledger, MemoryLedger};

/// Address used by every sample request.
pub const SAMPLE_ADDRESS: &str = "0x0334995e2CFc53CF785C554839F6e845A3A09e79";

/// Build a request from literals. Panics on malformed input.
pub fn request(id: &str, created_at: &str, tx_id: Option<&str>) -> FundRequest {
    let request = FundRequest::new(
        RequestId::new(id).expect("sample id"),
        Timestamp::parse(created_at).expect("sample timestamp"),
        Address::new(SAMPLE_ADDRESS).expect("sample address"),
    );
    match tx_id {
        Some(tx) => request.dispatched(TxId::new(tx).expect("sample tx id")),
        None => request,
    }
}

/// Three pending requests created two minutes apart, starting at
/// `2021-08-29T04:00:07Z`. In id order: `...a1`, `...a3`, `22db...`.
pub fn sample_pending() -> Vec<FundRequest> {
    vec![
        request("1e1413cc-f604-44db-969d-eb3b40fea4a1", "2021-08-29T04:00:07Z", None),
        request("22db01c2-2e3b-4ec2-9ce7-77f0372a50b2", "2021-08-29T04:02:07Z", None),
        request("1e1413cc-f604-44db-969d-eb3b40fea4a3", "2021-08-29T04:04:07Z", None),
    ]
}

/// Two in-flight requests and one pending, all created at the same instant.
pub fn sample_mixed() -> Vec<FundRequest> {
    vec![
        request(
            "1e1413cc-f604-44db-969d-eb3b40fea4a1",
            "2021-08-29T04:00:07Z",
            Some("b56281dc5dd8b44f37fc44bb12d3cc170616eeef121abd364369b15b9b8473a3"),
        ),
        request(
            "22db01c2-2e3b-4ec2-9ce7-77f0372a50b2",
            "2021-08-29T04:00:07Z",
            Some("9bb742ccb83de0689fee2e8f7967ced7e0d60f1577d94a08c770e8e49838e187"),
        ),
        request("1e1413cc-f604-44db-969d-eb3b40fea4a3", "2021-08-29T04:00:07Z", None),
    ]
}

/// A random 20-byte hex address.
pub fn random_address() -> Address {
    let bytes: [u8; 20] = rand::thread_rng().gen();
    Address::new(format!("0x{}", hex::encode(bytes))).expect("non-empty address")
}

/// Shorthand for building an expected scan result.
pub fn summary(total: usize, pending: usize, in_flight: usize) -> LedgerSummary {
    LedgerSummary {
        total,
        pending,
        in_flight,
    }
}

/// A shared in-memory ledger preloaded with requests.
pub struct LedgerFixture {
    pub ledger: Arc<MemoryLedger>,
}

impl LedgerFixture {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(MemoryLedger::new()),
        }
    }

    /// Create a ledger holding `requests`.
    pub async fn with_requests(requests: Vec<FundRequest>) -> Self {
        let fixture = Self::new();
        for request in requests {
            fixture
                .ledger
                .insert(request)
                .await
                .expect("fixture insert");
        }
        fixture
    }

    pub async fn summary(&self) -> LedgerSummary {
        self.ledger.scan().await.expect("fixture scan")
    }
}

impl Default for LedgerFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// How a mock callback answers.
#[derive(Debug, Clone)]
enum Behavior<T> {
    Answer(T),
    Fail(String),
}

/// A [`BatchSender`] that records every batch and answers with
/// `tx-<request id>`, or fails with a fixed message.
#[derive(Debug, Clone)]
pub struct RecordingSender {
    behavior: Behavior<()>,
    batches: Arc<Mutex<Vec<Vec<RequestId>>>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self {
            behavior: Behavior::Answer(()),
            batches: Arc::default(),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Fail(message.into()),
            batches: Arc::default(),
        }
    }

    /// Request ids of every batch received so far.
    pub fn batches(&self) -> Vec<Vec<RequestId>> {
        self.batches.lock().expect("sender log").clone()
    }

    /// The transaction id this sender assigns to `id`.
    pub fn tx_id_for(id: &RequestId) -> TxId {
        TxId::new(format!("tx-{}", id)).expect("non-empty tx id")
    }
}

impl Default for RecordingSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchSender for RecordingSender {
    async fn send_batch(&self, requests: &[FundRequest]) -> anyhow::Result<Vec<TxId>> {
        self.batches
            .lock()
            .expect("sender log")
            .push(requests.iter().map(|r| r.id().clone()).collect());

        match &self.behavior {
            Behavior::Answer(()) => Ok(requests
                .iter()
                .map(|r| Self::tx_id_for(r.id()))
                .collect()),
            Behavior::Fail(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}

/// A [`BatchConfirmer`] that records every batch and answers with a fixed
/// flag for every transaction, or fails with a fixed message.
#[derive(Debug, Clone)]
pub struct RecordingConfirmer {
    behavior: Behavior<bool>,
    batches: Arc<Mutex<Vec<Vec<TxId>>>>,
    calls: Arc<AtomicUsize>,
}

impl RecordingConfirmer {
    /// Confirms everything.
    pub fn all_confirmed() -> Self {
        Self::answering(true)
    }

    /// Confirms nothing.
    pub fn none_confirmed() -> Self {
        Self::answering(false)
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(message.into()))
    }

    fn answering(flag: bool) -> Self {
        Self::with_behavior(Behavior::Answer(flag))
    }

    fn with_behavior(behavior: Behavior<bool>) -> Self {
        Self {
            behavior,
            batches: Arc::default(),
            calls: Arc::default(),
        }
    }

    pub fn batches(&self) -> Vec<Vec<TxId>> {
        self.batches.lock().expect("confirmer log").clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchConfirmer for RecordingConfirmer {
    async fn confirm_batch(&self, tx_ids: &[TxId]) -> anyhow::Result<Vec<bool>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches
            .lock()
            .expect("confirmer log")
            .push(tx_ids.to_vec());

        match &self.behavior {
            Behavior::Answer(flag) => Ok(vec![*flag; tx_ids.len()]),
            Behavior::Fail(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}
