//! # Faucet Ledger Testkit
//!
//! Testing utilities for the faucet ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Sample requests, preloaded ledgers, and recording mock
//!   chain callbacks
//! - **Generators**: Proptest strategies for requests and operation sequences
//! - **Model**: A plain reference ledger to check implementations against
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use faucet_ledger_testkit::fixtures::{sample_pending, summary, LedgerFixture, RecordingSender};
//! use faucet_ledger_store::Ledger;
//!
//! async fn scenario() {
//!     let fixture = LedgerFixture::with_requests(sample_pending()).await;
//!     let sender = RecordingSender::new();
//!
//!     fixture.ledger.send(&sender, 2).await.unwrap();
//!     assert_eq!(fixture.summary().await, summary(3, 1, 2));
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use faucet_ledger_testkit::generators::{apply_to, ledger_ops, Model};
//!
//! proptest! {
//!     #[test]
//!     fn ledger_matches_model(ops in ledger_ops(50)) {
//!         // run each op against both and compare
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    request, sample_mixed, sample_pending, summary, LedgerFixture, RecordingConfirmer,
    RecordingSender, SAMPLE_ADDRESS,
};
pub use generators::{apply_to, fund_request, ledger_ops, LedgerOp, Model};
