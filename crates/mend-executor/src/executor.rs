//! Drives one event through the escalation levels.

use crate::action::FixAction;
use crate::state::{next, AttemptOutcome, FixLevel, RemediationState};
use chrono::{DateTime, Utc};
use mend_patterns::{ErrorCategory, ErrorEvent, PatternId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-level outcome, fed to the ledger and the per-cycle report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationAttempt {
    pub error_type: ErrorCategory,
    pub pattern: PatternId,
    pub level: FixLevel,
    pub success: bool,
    pub duration_ms: u64,
    /// Description of the applied fix, or the failure reason.
    pub fix_applied: String,
    pub timestamp: DateTime<Utc>,
}

/// Terminal result of remediating one event within a cycle.
#[derive(Debug, Clone)]
pub struct RemediationRecord {
    pub pattern: PatternId,
    pub state: RemediationState,
    /// Level attempts in the order they ran.
    pub attempts: Vec<RemediationAttempt>,
    /// True when safe mode stopped the walk before a terminal state.
    pub safe_mode_skipped: bool,
}

impl RemediationRecord {
    pub fn resolved(&self) -> bool {
        self.state == RemediationState::Resolved
    }
}

/// Operator emergency stop. Checked before every individual fix attempt;
/// engaging it mid-walk stops the walk at the next level boundary.
#[derive(Debug, Clone, Default)]
pub struct SafeMode(Arc<AtomicBool>);

impl SafeMode {
    pub fn new(engaged: bool) -> Self {
        Self(Arc::new(AtomicBool::new(engaged)))
    }

    pub fn engage(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn disengage(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_engaged(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-level execution policy.
#[derive(Debug, Clone)]
pub struct LevelPolicy {
    /// Level 1/2/3 enable switches. Level 3 (service restarts, restores)
    /// requires explicit operator opt-in.
    pub enabled: [bool; 3],
    /// Wall-clock budget for a single level attempt.
    pub attempt_timeout: Duration,
    /// Delay before escalating to the next level; doubles per level so a
    /// transient condition is not hammered.
    pub base_delay: Duration,
}

impl Default for LevelPolicy {
    fn default() -> Self {
        Self {
            enabled: [true, true, false],
            attempt_timeout: Duration::from_secs(120),
            base_delay: Duration::from_secs(5),
        }
    }
}

impl LevelPolicy {
    fn delay_after(&self, level: FixLevel) -> Duration {
        self.base_delay * 2u32.pow(level.index() as u32)
    }
}

/// The leveled remediation executor.
pub struct Executor {
    action: Arc<dyn FixAction>,
    policy: LevelPolicy,
    safe_mode: SafeMode,
}

impl Executor {
    pub fn new(action: Arc<dyn FixAction>, policy: LevelPolicy, safe_mode: SafeMode) -> Self {
        Self {
            action,
            policy,
            safe_mode,
        }
    }

    pub fn safe_mode(&self) -> &SafeMode {
        &self.safe_mode
    }

    /// Walk one event through the levels: first success is terminal, a
    /// timeout counts as a failure at that level, disabled levels advance
    /// the machine without an attempt.
    pub async fn remediate(&self, event: &ErrorEvent) -> RemediationRecord {
        let mut state = next(RemediationState::New, AttemptOutcome::Failure);
        let mut attempts = Vec::new();

        while let Some(level) = state.level() {
            if self.safe_mode.is_engaged() {
                tracing::warn!(
                    pattern = %event.pattern,
                    %level,
                    "safe mode engaged, skipping fix"
                );
                return RemediationRecord {
                    pattern: event.pattern.clone(),
                    state,
                    attempts,
                    safe_mode_skipped: true,
                };
            }

            if !self.policy.enabled[level.index()] {
                tracing::debug!(pattern = %event.pattern, %level, "level disabled, escalating");
                state = next(state, AttemptOutcome::Failure);
                continue;
            }

            let started = Instant::now();
            let (outcome, description) = match tokio::time::timeout(
                self.policy.attempt_timeout,
                self.action.apply(level, event),
            )
            .await
            {
                Ok(Ok(report)) => (AttemptOutcome::Success, report.description),
                Ok(Err(e)) => {
                    tracing::warn!(pattern = %event.pattern, %level, error = %e, "fix attempt failed");
                    (AttemptOutcome::Failure, e.to_string())
                }
                Err(_) => {
                    tracing::warn!(
                        pattern = %event.pattern,
                        %level,
                        timeout_ms = self.policy.attempt_timeout.as_millis() as u64,
                        "fix attempt timed out"
                    );
                    (
                        AttemptOutcome::Failure,
                        format!("timed out after {}ms", self.policy.attempt_timeout.as_millis()),
                    )
                }
            };

            attempts.push(RemediationAttempt {
                error_type: event.category,
                pattern: event.pattern.clone(),
                level,
                success: outcome == AttemptOutcome::Success,
                duration_ms: started.elapsed().as_millis() as u64,
                fix_applied: description,
                timestamp: Utc::now(),
            });

            state = next(state, outcome);
            if state.is_terminal() {
                break;
            }
            tokio::time::sleep(self.policy.delay_after(level)).await;
        }

        tracing::info!(
            pattern = %event.pattern,
            terminal = %state,
            attempts = attempts.len(),
            "remediation walk finished"
        );
        RemediationRecord {
            pattern: event.pattern.clone(),
            state,
            attempts,
            safe_mode_skipped: false,
        }
    }
}
