//! # Faucet Ledger
//!
//! The unified API for a token faucet's disbursement ledger: accept fund
//! requests, send them in batches, confirm them, and clean up.
//!
//! ## Overview
//!
//! - **Ingress**: verifies a caller and records a pending request
//! - **Ledger**: a transactional in-memory table of requests
//! - **Driver**: runs Expire, Send, Confirm and Retry on an interval
//!
//! The blockchain client and the CAPTCHA check are supplied by the caller
//! through the [`BatchSender`](store::BatchSender),
//! [`BatchConfirmer`](store::BatchConfirmer) and [`Verifier`] traits.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use faucet_ledger::{Faucet, FaucetConfig, RequestContext, Verifier};
//! use faucet_ledger::store::{BatchConfirmer, BatchSender};
//! use tokio::sync::watch;
//!
//! async fn serve<V, S, C>(verifier: V, sender: S, confirmer: C) -> faucet_ledger::Result<()>
//! where
//!     V: Verifier,
//!     S: BatchSender + 'static,
//!     C: BatchConfirmer + 'static,
//! {
//!     let faucet = Faucet::new(FaucetConfig::from_env()?)?;
//!
//!     // Background lifecycle
//!     let driver = faucet.driver(sender, confirmer)?;
//!     let (stop, shutdown) = watch::channel(false);
//!     let handle = tokio::spawn(async move { driver.run(shutdown).await });
//!
//!     // One incoming request
//!     let ingress = faucet.ingress(verifier);
//!     let ctx = RequestContext::new("203.0.113.7").with_request_id("abc");
//!     let id = ingress
//!         .submit(&ctx, "0x0334995e2CFc53CF785C554839F6e845A3A09e79", "captcha-token")
//!         .await?;
//!     println!("queued {}", id);
//!
//!     stop.send(true).ok();
//!     handle.await.ok();
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `faucet_ledger::core` - Request model and value types
//! - `faucet_ledger::store` - The `Ledger` trait and in-memory ledger
//! - `faucet_ledger::cycle` - The lifecycle driver

pub mod config;
pub mod error;
pub mod faucet;
pub mod ingress;

// Re-export component crates
pub use faucet_ledger_core as core;
pub use faucet_ledger_cycle as cycle;
pub use faucet_ledger_store as store;

// Re-export main types for convenience
pub use config::FaucetConfig;
pub use error::{FaucetError, Result};
pub use faucet::Faucet;
pub use ingress::{Ingress, RequestContext, Verifier};

// Re-export commonly used types
pub use faucet_ledger_core::{
    Address, FundRequest, LedgerSummary, RequestId, RequestState, Timestamp, TxId,
};
pub use faucet_ledger_cycle::{CycleConfig, CycleReport, Driver};
pub use faucet_ledger_store::{Ledger, LedgerOptions, MemoryLedger};
