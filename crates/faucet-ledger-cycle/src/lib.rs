//! # Faucet Ledger Cycle
//!
//! Runs the ledger's lifecycle operations on a timer.
//!
//! ## Overview
//!
//! Each cycle runs four phases against a [`Ledger`](faucet_ledger_store::Ledger)
//! in a fixed order:
//!
//! ```text
//! Expire ──► Send ──► Confirm ──► Retry
//! ```
//!
//! Every phase is its own transaction. A cycle is not atomic; the order is
//! what keeps the lifecycle coherent.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use faucet_ledger_cycle::{CycleConfig, Driver};
//! use faucet_ledger_store::{BatchConfirmer, BatchSender, MemoryLedger};
//! use tokio::sync::watch;
//!
//! async fn serve<S: BatchSender, C: BatchConfirmer>(sender: S, confirmer: C) {
//!     let ledger = Arc::new(MemoryLedger::new());
//!     let driver = Driver::new(ledger, sender, confirmer, CycleConfig::default()).unwrap();
//!
//!     let (_stop, shutdown) = watch::channel(false);
//!     let cycles = driver.run(shutdown).await;
//!     println!("ran {} cycles", cycles);
//! }
//! ```
//!
//! ## Failure Policy
//!
//! | Failing phase | Effect on the rest of the cycle |
//! |---------------|---------------------------------|
//! | Expire        | Send, Confirm and Retry skipped |
//! | Send          | none                            |
//! | Confirm       | Retry skipped                   |
//! | Retry         | none                            |
//!
//! Failures are logged and collected in the [`CycleReport`]; the driver keeps
//! running.

pub mod driver;
pub mod error;

pub use driver::{CycleConfig, CycleReport, Driver};
pub use error::{CycleError, Phase, Result};
