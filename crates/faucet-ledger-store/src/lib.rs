//! # Faucet Ledger Store
//!
//! The transactional request ledger and its batch lifecycle engine.
//!
//! ## Overview
//!
//! The [`Ledger`] trait is what the faucet service drives: ingress inserts
//! fresh requests, and a periodic cycle runs the four lifecycle operations.
//! [`MemoryLedger`] is the implementation: a copy-on-write table with a
//! single writer at a time and lock-free snapshot reads.
//!
//! ## Key Types
//!
//! - [`Ledger`] - The async trait for all ledger operations
//! - [`MemoryLedger`] - Volatile in-memory ledger
//! - [`BatchSender`] / [`BatchConfirmer`] - Chain callbacks used by `send` and `confirm`
//! - [`Snapshot`] - A consistent read-only view of committed data
//! - [`StoreError`] - Everything that can go wrong, classified by [`ErrorKind`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use faucet_ledger_core::{Address, FundRequest, Timestamp};
//! use faucet_ledger_store::{BatchConfirmer, BatchSender, Ledger, MemoryLedger};
//!
//! async fn cycle(sender: &dyn BatchSender, confirmer: &dyn BatchConfirmer) {
//!     let ledger = MemoryLedger::new();
//!
//!     let address = Address::new("0x0334995e2CFc53CF785C554839F6e845A3A09e79").unwrap();
//!     ledger.insert(FundRequest::fresh(address)).await.unwrap();
//!
//!     ledger.expire(Timestamp::now(), Duration::from_secs(180)).await.unwrap();
//!     ledger.send(sender, 10).await.unwrap();
//!     ledger.confirm(confirmer, 10).await.unwrap();
//!     ledger.retry().await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **All-or-nothing**: a failing, slow, or misbehaving callback aborts its
//!   transaction; the ledger is left exactly as it was.
//! - **Stable order**: every scan visits requests by id, and callbacks get
//!   them in that order. Results are matched back by position.
//! - **Writer held across callbacks**: no other write can interleave between
//!   choosing a batch and applying its results.

pub mod error;
mod lifecycle;
pub mod memory;
pub mod traits;
mod txn;

pub use error::{CallbackSource, ErrorKind, Operation, Result, StoreError};
pub use memory::{LedgerOptions, MemoryLedger, DEFAULT_CALLBACK_TIMEOUT};
pub use traits::{BatchConfirmer, BatchSender, Ledger};
pub use txn::Snapshot;
