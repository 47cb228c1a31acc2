//! Priority engine.
//!
//! Scores a batch of classified events and produces a total order:
//! base severity weight, plus a bonus for strategies that historically
//! work (worth retrying), a bonus for noisy errors, and a large bonus for
//! anything blocking the pipeline. The score is clamped at
//! [`MAX_SCORE`]; a blocking critical event already sits at the ceiling,
//! so several distinct high-priority inputs deliberately collapse to ties
//! and the stable sort falls back to detection order.

use mend_ledger::Ledger;
use mend_patterns::{ErrorEvent, Severity};
use serde::{Deserialize, Serialize};

/// Score ceiling.
pub const MAX_SCORE: u32 = 150;

/// Added when the ledger's learned success rate exceeds
/// [`SUCCESS_RATE_CUTOFF`] — retrying things that work is cheap wins.
pub const SUCCESS_RATE_BONUS: u32 = 10;

/// Added when frequency in the window exceeds [`FREQUENCY_CUTOFF`].
pub const FREQUENCY_BONUS: u32 = 15;

/// Added for pipeline-blocking errors.
pub const BLOCKING_BONUS: u32 = 50;

/// Success-rate threshold above which the history bonus applies.
pub const SUCCESS_RATE_CUTOFF: f64 = 0.7;

/// Frequency threshold above which the noise bonus applies.
pub const FREQUENCY_CUTOFF: u32 = 5;

/// An event annotated with its computed score and the ledger's retry
/// verdict, so the executor can skip low-value work without recomputing.
#[derive(Debug, Clone)]
pub struct PrioritizedEvent {
    pub event: ErrorEvent,
    pub score: u32,
    pub should_retry: bool,
}

/// Counts per severity tier, carried into the per-cycle report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityBreakdown {
    pub fn tally(events: &[PrioritizedEvent]) -> Self {
        let mut breakdown = Self::default();
        for item in events {
            match item.event.severity {
                Severity::Critical => breakdown.critical += 1,
                Severity::High => breakdown.high += 1,
                Severity::Medium => breakdown.medium += 1,
                Severity::Low => breakdown.low += 1,
            }
        }
        breakdown
    }
}

/// Score one event against the ledger's learned history.
pub fn score(event: &ErrorEvent, ledger: &Ledger) -> u32 {
    let mut score = event.severity.weight();
    if ledger.success_rate(&event.pattern) > SUCCESS_RATE_CUTOFF {
        score += SUCCESS_RATE_BONUS;
    }
    if event.frequency > FREQUENCY_CUTOFF {
        score += FREQUENCY_BONUS;
    }
    if event.blocking {
        score += BLOCKING_BONUS;
    }
    score.min(MAX_SCORE)
}

/// Order a batch of events, highest score first.
///
/// The sort is stable: equal scores keep their original detection order.
/// Each result carries the ledger's `should_retry` verdict at `threshold`.
pub fn prioritize(
    events: Vec<ErrorEvent>,
    ledger: &Ledger,
    retry_threshold: f64,
) -> Vec<PrioritizedEvent> {
    let mut prioritized: Vec<PrioritizedEvent> = events
        .into_iter()
        .map(|event| {
            let score = score(&event, ledger);
            let should_retry = ledger.should_retry(&event.pattern, retry_threshold);
            tracing::debug!(
                pattern = %event.pattern,
                score,
                should_retry,
                "scored error event"
            );
            PrioritizedEvent {
                event,
                score,
                should_retry,
            }
        })
        .collect();
    prioritized.sort_by(|a, b| b.score.cmp(&a.score));
    prioritized
}
