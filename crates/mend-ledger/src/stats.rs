//! Per-pattern aggregates and outcome history records.

use crate::DURATION_WINDOW_CAP;
use chrono::{DateTime, Utc};
use mend_patterns::PatternId;
use serde::{Deserialize, Serialize};

/// Running aggregates for one pattern.
///
/// `success_rate` is intentionally not a field: it is recomputed from the
/// counters every time so it can never drift from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    /// Mean of the rolling duration window, milliseconds.
    pub avg_duration_ms: f64,
    /// Last `DURATION_WINDOW_CAP` attempt durations, oldest first.
    pub durations_window: Vec<u64>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub first_seen: DateTime<Utc>,
}

impl PatternStats {
    pub fn new(first_seen: DateTime<Utc>) -> Self {
        Self {
            attempts: 0,
            successes: 0,
            failures: 0,
            avg_duration_ms: 0.0,
            durations_window: Vec::new(),
            last_attempt: None,
            first_seen,
        }
    }

    /// Successes over attempts; 0.0 when nothing has been attempted.
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }

    /// Fold one attempt into the aggregates.
    pub(crate) fn record(&mut self, success: bool, duration_ms: u64, at: DateTime<Utc>) {
        self.attempts += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        if self.durations_window.len() == DURATION_WINDOW_CAP {
            self.durations_window.remove(0);
        }
        self.durations_window.push(duration_ms);
        let total: u64 = self.durations_window.iter().sum();
        self.avg_duration_ms = total as f64 / self.durations_window.len() as f64;
        self.last_attempt = Some(at);
    }
}

/// One recorded attempt outcome, kept in the bounded history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixOutcome {
    pub timestamp: DateTime<Utc>,
    pub pattern: PatternId,
    pub success: bool,
    pub duration_ms: u64,
    pub error_message: String,
    pub fix_applied: String,
}

/// Whole-ledger aggregate view for operator reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub patterns: usize,
    pub total_attempts: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    pub overall_success_rate: f64,
}
