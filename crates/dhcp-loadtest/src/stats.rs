//! Aggregation of per-transaction outcomes.
//!
//! `LeaseStats` is shared between client tasks through an `Arc`; every
//! terminal outcome goes through exactly one locked update, so totals do not
//! depend on completion order.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use dhcp_wire::FailureKind;

use crate::executor::{LeaseTransaction, TransactionOutcome};

#[derive(Debug, Default)]
struct Tally {
    acked: usize,
    setup_failed: usize,
    timed_out: usize,
    rejected: usize,
    aborted: usize,
    latency_sum: Duration,
    latency_min: Option<Duration>,
    latency_max: Duration,
}

impl Tally {
    fn recorded(&self) -> usize {
        self.acked + self.setup_failed + self.timed_out + self.rejected + self.aborted
    }
}

/// Running counters for one load test run.
#[derive(Debug)]
pub struct LeaseStats {
    requested: usize,
    tally: Mutex<Tally>,
}

impl LeaseStats {
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            tally: Mutex::new(Tally::default()),
        }
    }

    /// Record the terminal outcome of one transaction.
    pub fn record(&self, tx: &LeaseTransaction) {
        let mut tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        match &tx.outcome {
            TransactionOutcome::Acked(_) => {
                tally.acked += 1;
                tally.latency_sum += tx.elapsed;
                tally.latency_max = tally.latency_max.max(tx.elapsed);
                tally.latency_min = Some(match tally.latency_min {
                    Some(min) => min.min(tx.elapsed),
                    None => tx.elapsed,
                });
            }
            TransactionOutcome::Failed { kind, .. } => match kind {
                FailureKind::Setup => tally.setup_failed += 1,
                FailureKind::TimedOut => tally.timed_out += 1,
                FailureKind::Rejected => tally.rejected += 1,
            },
        }
    }

    /// Record a client task that ended without producing a transaction (panicked).
    pub fn record_aborted(&self) {
        self.tally
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .aborted += 1;
    }

    /// Number of outcomes recorded so far.
    pub fn recorded(&self) -> usize {
        self.tally
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recorded()
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Snapshot the final result. Call once every client task has been joined.
    pub fn finish(&self, elapsed: Duration) -> AggregateResult {
        let tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);

        let latency = tally.latency_min.map(|min| LatencySummary {
            min,
            mean: tally.latency_sum / tally.acked as u32,
            max: tally.latency_max,
        });

        AggregateResult {
            requested: self.requested,
            successes: tally.acked,
            setup_failed: tally.setup_failed,
            timed_out: tally.timed_out,
            rejected: tally.rejected,
            aborted: tally.aborted,
            elapsed,
            latency,
        }
    }
}

/// Latency of acknowledged transactions, from open to ACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySummary {
    pub min: Duration,
    pub mean: Duration,
    pub max: Duration,
}

/// Final totals of a load test run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub requested: usize,
    pub successes: usize,
    pub setup_failed: usize,
    pub timed_out: usize,
    pub rejected: usize,
    pub aborted: usize,
    /// Wall clock from first launch to the completion barrier.
    pub elapsed: Duration,
    pub latency: Option<LatencySummary>,
}

impl AggregateResult {
    pub fn failures(&self) -> usize {
        self.setup_failed + self.timed_out + self.rejected + self.aborted
    }

    pub fn recorded(&self) -> usize {
        self.successes + self.failures()
    }

    /// Every requested client reached ACK. Vacuously true for an empty run.
    pub fn all_acked(&self) -> bool {
        self.successes == self.requested
    }

    /// Leases per second, `None` when no time elapsed.
    pub fn throughput(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            Some(self.successes as f64 / secs)
        } else {
            None
        }
    }
}
