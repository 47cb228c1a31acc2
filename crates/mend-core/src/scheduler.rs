//! Two-tier cadence loop around the coordinator.
//!
//! Normal operation polls patiently; a coordinator-level failure aborts
//! only that cycle and retries on a short backoff. The scheduler never
//! lets a cycle failure take the process down.

use crate::coordinator::Coordinator;
use std::sync::Arc;
use std::time::Duration;

pub struct Scheduler {
    coordinator: Arc<Coordinator>,
    interval: Duration,
    error_backoff: Duration,
}

impl Scheduler {
    pub fn new(coordinator: Arc<Coordinator>, interval: Duration, error_backoff: Duration) -> Self {
        Self {
            coordinator,
            interval,
            error_backoff,
        }
    }

    /// Which delay follows a cycle with this outcome.
    fn next_delay(&self, cycle_ok: bool) -> Duration {
        if cycle_ok {
            self.interval
        } else {
            self.error_backoff
        }
    }

    /// Run `cycles` cycles, sleeping between them. Used by tests and the
    /// CLI's bounded monitor mode.
    pub async fn run_cycles(&self, cycles: u64) {
        for _ in 0..cycles {
            let ok = self.tick().await;
            tokio::time::sleep(self.next_delay(ok)).await;
        }
    }

    /// Run until the process is stopped.
    pub async fn run(&self) {
        loop {
            let ok = self.tick().await;
            let delay = self.next_delay(ok);
            tracing::info!(delay_secs = delay.as_secs(), "sleeping until next cycle");
            tokio::time::sleep(delay).await;
        }
    }

    async fn tick(&self) -> bool {
        match self.coordinator.run_cycle().await {
            Ok(report) => {
                tracing::info!(
                    cycle = report.cycle,
                    fixed = report.errors_fixed,
                    failed = report.errors_failed,
                    "cycle complete"
                );
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "cycle aborted, retrying on short backoff");
                false
            }
        }
    }
}
