//! # Faucet Ledger Core
//!
//! Pure types for the faucet ledger: fund requests, their identifiers, and the
//! two-state lifecycle they move through.
//!
//! This crate contains no I/O, no locking, no async. Storage and the batch
//! lifecycle live in `faucet-ledger-store`.
//!
//! ## Key Types
//!
//! - [`FundRequest`] - One pending or in-flight disbursement to an address
//! - [`RequestState`] - `Pending`, or `InFlight` with the chain transaction id
//! - [`RequestId`] - Primary key of a fund request (UUID v4 when generated)
//! - [`Timestamp`] - Second-precision creation time, RFC 3339 on the wire
//! - [`LedgerSummary`] - Counts returned by a ledger scan
//!
//! ## Records are values
//!
//! A [`FundRequest`] is never edited in place. State transitions produce a
//! new value with the same `id`, `created_at` and `address`, which the ledger
//! swaps in transactionally.

pub mod error;
pub mod request;
pub mod types;

pub use error::{Result, ValidationError};
pub use request::{FundRequest, LedgerSummary, RequestState};
pub use types::{Address, RequestId, Timestamp, TxId};
