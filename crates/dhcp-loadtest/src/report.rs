use std::fmt;

use tracing::info;

use crate::stats::AggregateResult;

impl fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "--- Load Test Results ---")?;
        writeln!(f, "Clients Simulated: {}", self.requested)?;
        writeln!(f, "Fully ACKED Leases: {}", self.successes)?;
        match self.throughput() {
            Some(tps) => writeln!(f, "Effective TPS: {:.2} leases/sec", tps)?,
            None => writeln!(f, "Effective TPS: undefined leases/sec")?,
        }
        if self.all_acked() {
            write!(f, "SUCCESS: 100% Lease Rate")
        } else {
            write!(
                f,
                "WARNING: {} failed transactions",
                self.requested.saturating_sub(self.successes)
            )
        }
    }
}

/// Log the failure breakdown and latency figures that the fixed report omits.
pub fn log_breakdown(result: &AggregateResult) {
    info!(
        setup = result.setup_failed,
        timed_out = result.timed_out,
        rejected = result.rejected,
        aborted = result.aborted,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "Failure breakdown"
    );
    if let Some(latency) = result.latency {
        info!(
            "Lease latency: min {:?}, mean {:?}, max {:?}",
            latency.min, latency.mean, latency.max
        );
    }
}
