//! The periodic lifecycle driver.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use faucet_ledger_core::Timestamp;
use faucet_ledger_store::{BatchConfirmer, BatchSender, Ledger, StoreError};

use crate::error::{CycleError, Phase, Result};

/// Configuration for the lifecycle driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Time between cycles.
    pub interval: Duration,
    /// Requests older than this are expired, whatever their state.
    pub ttl: Duration,
    /// Maximum pending requests sent per cycle.
    pub send_batch_limit: usize,
    /// Maximum in-flight requests confirmed per cycle.
    pub confirm_batch_limit: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            ttl: Duration::from_secs(180),
            send_batch_limit: 10,
            confirm_batch_limit: 10,
        }
    }
}

impl CycleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(CycleError::InvalidConfig("interval must be non-zero".into()));
        }
        if self.send_batch_limit == 0 {
            return Err(CycleError::InvalidConfig(
                "send batch limit must be at least 1".into(),
            ));
        }
        if self.confirm_batch_limit == 0 {
            return Err(CycleError::InvalidConfig(
                "confirm batch limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one cycle.
#[derive(Debug)]
pub struct CycleReport {
    /// The instant expiry was measured against.
    pub now: Timestamp,
    pub expired: usize,
    pub sent: usize,
    pub confirmed: usize,
    pub retried: usize,
    /// Phases that failed, in the order they ran.
    pub failures: Vec<CycleError>,
    /// Phases not run because an earlier one failed.
    pub skipped: Vec<Phase>,
}

impl CycleReport {
    fn new(now: Timestamp) -> Self {
        Self {
            now,
            expired: 0,
            sent: 0,
            confirmed: 0,
            retried: 0,
            failures: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// True if every phase ran and none failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    pub fn failed(&self, phase: Phase) -> bool {
        self.failures.iter().any(|e| e.phase() == Some(phase))
    }

    fn record_failure(&mut self, phase: Phase, source: StoreError) {
        warn!(%phase, error = %source, "cycle phase failed");
        self.failures.push(CycleError::Phase { phase, source });
    }

    fn skip_after(&mut self, phase: Phase) {
        self.skipped.extend_from_slice(phase.remaining());
    }
}

/// Drives a ledger through Expire, Send, Confirm and Retry on a fixed
/// interval.
///
/// The phase order matters: expiry runs first so stale requests are never
/// sent, and retry runs last so it only resets requests confirm has already
/// looked at.
pub struct Driver<L: ?Sized, S, C> {
    ledger: Arc<L>,
    sender: S,
    confirmer: C,
    config: CycleConfig,
}

impl<L, S, C> Driver<L, S, C>
where
    L: Ledger + ?Sized,
    S: BatchSender,
    C: BatchConfirmer,
{
    /// Create a driver. Fails if `config` does not validate.
    pub fn new(ledger: Arc<L>, sender: S, confirmer: C, config: CycleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ledger,
            sender,
            confirmer,
            config,
        })
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Run one cycle at `now`.
    ///
    /// A failing Send does not stop the cycle. A failing Confirm skips Retry,
    /// since retrying unconfirmed requests could send them twice. A failing
    /// Expire skips everything after it.
    pub async fn tick(&self, now: Timestamp) -> CycleReport {
        let mut report = CycleReport::new(now);

        match self.ledger.expire(now, self.config.ttl).await {
            Ok(n) => report.expired = n,
            Err(e) => {
                report.record_failure(Phase::Expire, e);
                report.skip_after(Phase::Expire);
                return report;
            }
        }

        match self
            .ledger
            .send(&self.sender, self.config.send_batch_limit)
            .await
        {
            Ok(n) => report.sent = n,
            Err(e) => report.record_failure(Phase::Send, e),
        }

        match self
            .ledger
            .confirm(&self.confirmer, self.config.confirm_batch_limit)
            .await
        {
            Ok(n) => report.confirmed = n,
            Err(e) => {
                report.record_failure(Phase::Confirm, e);
                report.skip_after(Phase::Confirm);
                return report;
            }
        }

        match self.ledger.retry().await {
            Ok(n) => report.retried = n,
            Err(e) => report.record_failure(Phase::Retry, e),
        }

        debug!(
            expired = report.expired,
            sent = report.sent,
            confirmed = report.confirmed,
            retried = report.retried,
            "cycle complete"
        );
        report
    }

    /// Run cycles every `interval` until `shutdown` turns true or its sender
    /// is dropped. A cycle in progress always finishes.
    ///
    /// Returns the number of cycles run.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = period.as_secs(), "lifecycle driver started");
        let mut cycles = 0u64;

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick(Timestamp::now()).await;
                    cycles += 1;
                    if !report.is_clean() {
                        warn!(
                            cycle = cycles,
                            failures = report.failures.len(),
                            skipped = report.skipped.len(),
                            "cycle finished with errors"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(cycles, "lifecycle driver stopped");
        cycles
    }
}
