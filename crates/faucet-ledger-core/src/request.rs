//! FundRequest: one disbursement tracked by the ledger.
//!
//! A request is created `Pending`, becomes `InFlight` once a batch sender has
//! dispatched a chain transaction for it, and may fall back to `Pending` when
//! that transaction is retried. Values are immutable; every transition
//! returns a new request.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{Address, RequestId, Timestamp, TxId};

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// Not yet submitted; eligible for sending.
    Pending,
    /// Submitted as `tx_id`; awaiting confirmation or retry.
    InFlight { tx_id: TxId },
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::InFlight { .. })
    }

    pub fn tx_id(&self) -> Option<&TxId> {
        match self {
            RequestState::Pending => None,
            RequestState::InFlight { tx_id } => Some(tx_id),
        }
    }
}

/// A fund request stored in the ledger.
///
/// On the wire the state is flattened into a `txId` field that is empty
/// while the request is pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireFundRequest", into = "WireFundRequest")]
pub struct FundRequest {
    id: RequestId,
    created_at: Timestamp,
    address: Address,
    state: RequestState,
}

impl FundRequest {
    /// Create a pending request.
    pub fn new(id: RequestId, created_at: Timestamp, address: Address) -> Self {
        Self {
            id,
            created_at,
            address,
            state: RequestState::Pending,
        }
    }

    /// Create a pending request for `address` with a fresh id, created now.
    pub fn fresh(address: Address) -> Self {
        Self::new(RequestId::generate(), Timestamp::now(), address)
    }

    /// Replace the state, keeping identity.
    pub fn with_state(self, state: RequestState) -> Self {
        Self { state, ..self }
    }

    /// A copy of this request marked as sent in `tx_id`.
    pub fn dispatched(&self, tx_id: TxId) -> Self {
        self.clone().with_state(RequestState::InFlight { tx_id })
    }

    /// A copy of this request with its transaction dropped.
    pub fn reset(&self) -> Self {
        self.clone().with_state(RequestState::Pending)
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn tx_id(&self) -> Option<&TxId> {
        self.state.tx_id()
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.is_in_flight()
    }
}

/// Flat record layout: `{"id", "createdAt", "address", "txId"}`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFundRequest {
    id: RequestId,
    created_at: Timestamp,
    address: Address,
    #[serde(default)]
    tx_id: String,
}

impl From<FundRequest> for WireFundRequest {
    fn from(req: FundRequest) -> Self {
        let tx_id = match req.state {
            RequestState::Pending => String::new(),
            RequestState::InFlight { tx_id } => tx_id.into(),
        };
        Self {
            id: req.id,
            created_at: req.created_at,
            address: req.address,
            tx_id,
        }
    }
}

impl TryFrom<WireFundRequest> for FundRequest {
    type Error = ValidationError;

    fn try_from(wire: WireFundRequest) -> Result<Self, Self::Error> {
        let state = if wire.tx_id.is_empty() {
            RequestState::Pending
        } else {
            RequestState::InFlight {
                tx_id: TxId::new(wire.tx_id)?,
            }
        };
        Ok(Self {
            id: wire.id,
            created_at: wire.created_at,
            address: wire.address,
            state,
        })
    }
}

/// Counts produced by a ledger scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Every stored request.
    pub total: usize,
    /// Requests waiting to be sent.
    pub pending: usize,
    /// Requests sent and awaiting confirmation.
    pub in_flight: usize,
}

impl LedgerSummary {
    /// Count one request.
    pub fn record(&mut self, request: &FundRequest) {
        self.total += 1;
        match request.state() {
            RequestState::Pending => self.pending += 1,
            RequestState::InFlight { .. } => self.in_flight += 1,
        }
    }
}

impl<'a> FromIterator<&'a FundRequest> for LedgerSummary {
    fn from_iter<I: IntoIterator<Item = &'a FundRequest>>(iter: I) -> Self {
        let mut summary = Self::default();
        for request in iter {
            summary.record(request);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> FundRequest {
        FundRequest::new(
            RequestId::new("1e1413cc-f604-44db-969d-eb3b40fea4a1").unwrap(),
            Timestamp::parse("2021-08-29T04:00:07Z").unwrap(),
            Address::new("0x0334995e2CFc53CF785C554839F6e845A3A09e79").unwrap(),
        )
    }

    #[test]
    fn test_transitions_preserve_identity() {
        let pending = sample();
        let tx =
            TxId::new("b56281dc5dd8b44f37fc44bb12d3cc170616eeef121abd364369b15b9b8473a1").unwrap();

        let sent = pending.dispatched(tx.clone());
        assert!(sent.is_in_flight());
        assert_eq!(sent.tx_id(), Some(&tx));
        assert_eq!(sent.id(), pending.id());
        assert_eq!(sent.created_at(), pending.created_at());
        assert_eq!(sent.address(), pending.address());

        let retried = sent.reset();
        assert_eq!(retried, pending);
        // The original value is untouched.
        assert!(sent.is_in_flight());
    }

    #[test]
    fn test_wire_layout() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "1e1413cc-f604-44db-969d-eb3b40fea4a1",
                "createdAt": "2021-08-29T04:00:07Z",
                "address": "0x0334995e2CFc53CF785C554839F6e845A3A09e79",
                "txId": "",
            })
        );
    }

    #[test]
    fn test_wire_tx_id_maps_to_in_flight() {
        let raw = r#"{
            "id": "22db01c2-2e3b-4ec2-9ce7-77f0372a50b2",
            "createdAt": "2021-08-29T04:02:07Z",
            "address": "0x0334995e2CFc53CF785C554839F6e845A3A09e79",
            "txId": "9bb742ccb83de0689fee2e8f7967ced7e0d60f1577d94a08c770e8e49838e187"
        }"#;
        let req: FundRequest = serde_json::from_str(raw).unwrap();
        assert!(req.is_in_flight());
        assert_eq!(
            req.tx_id().map(TxId::as_str),
            Some("9bb742ccb83de0689fee2e8f7967ced7e0d60f1577d94a08c770e8e49838e187")
        );
    }

    #[test]
    fn test_wire_rejects_empty_id() {
        let raw = r#"{"id": "", "createdAt": "2021-08-29T04:02:07Z", "address": "0xabc"}"#;
        assert!(serde_json::from_str::<FundRequest>(raw).is_err());
    }

    #[test]
    fn test_summary_counts_states() {
        let a = sample();
        let b = sample().dispatched(TxId::new("tx-b").unwrap());
        let c = sample().dispatched(TxId::new("tx-c").unwrap());

        let summary: LedgerSummary = [&a, &b, &c].into_iter().collect();
        assert_eq!(
            summary,
            LedgerSummary {
                total: 3,
                pending: 1,
                in_flight: 2
            }
        );
    }

    proptest! {
        #[test]
        fn test_summary_partitions_total(flags in prop::collection::vec(any::<bool>(), 0..64)) {
            let requests: Vec<FundRequest> = flags
                .iter()
                .enumerate()
                .map(|(i, in_flight)| {
                    let req = sample();
                    if *in_flight {
                        req.dispatched(TxId::new(format!("tx-{i}")).unwrap())
                    } else {
                        req
                    }
                })
                .collect();

            let summary: LedgerSummary = requests.iter().collect();
            prop_assert_eq!(summary.total, requests.len());
            prop_assert_eq!(summary.pending + summary.in_flight, summary.total);
            prop_assert_eq!(summary.in_flight, flags.iter().filter(|f| **f).count());
        }
    }
}
