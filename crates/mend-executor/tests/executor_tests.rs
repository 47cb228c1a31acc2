use mend_executor::{Executor, FixLevel, LevelPolicy, RemediationState, SafeMode};
use mend_patterns::{ErrorCategory, Severity};
use mend_test_utils::{test_event, HangingFixAction, ScriptedFixAction};
use std::sync::Arc;
use std::time::Duration;

fn fast_policy() -> LevelPolicy {
    LevelPolicy {
        enabled: [true, true, true],
        attempt_timeout: Duration::from_secs(5),
        base_delay: Duration::ZERO,
    }
}

fn build_event() -> mend_patterns::ErrorEvent {
    test_event(
        "build-compile-failed",
        ErrorCategory::BuildFailure,
        Severity::Critical,
        3,
        true,
    )
}

#[tokio::test]
async fn first_success_is_terminal_at_level_one() {
    let action = Arc::new(ScriptedFixAction::new([true]));
    let executor = Executor::new(action.clone(), fast_policy(), SafeMode::default());

    let record = executor.remediate(&build_event()).await;
    assert_eq!(record.state, RemediationState::Resolved);
    assert_eq!(record.attempts.len(), 1);
    assert_eq!(record.attempts[0].level, FixLevel::L1);
    assert!(record.attempts[0].success);
    assert_eq!(action.calls().len(), 1);
}

#[tokio::test]
async fn fail_fail_success_resolves_with_three_ordered_attempts() {
    let action = Arc::new(ScriptedFixAction::new([false, false, true]));
    let executor = Executor::new(action.clone(), fast_policy(), SafeMode::default());

    let record = executor.remediate(&build_event()).await;
    assert_eq!(record.state, RemediationState::Resolved);
    assert_eq!(record.attempts.len(), 3);
    let levels: Vec<FixLevel> = record.attempts.iter().map(|a| a.level).collect();
    assert_eq!(levels, vec![FixLevel::L1, FixLevel::L2, FixLevel::L3]);
    assert!(!record.attempts[0].success);
    assert!(!record.attempts[1].success);
    assert!(record.attempts[2].success);
}

#[tokio::test]
async fn three_failures_exhaust() {
    let action = Arc::new(ScriptedFixAction::always_failing());
    let executor = Executor::new(action, fast_policy(), SafeMode::default());

    let record = executor.remediate(&build_event()).await;
    assert_eq!(record.state, RemediationState::Exhausted);
    assert_eq!(record.attempts.len(), 3);
    assert!(record.attempts.iter().all(|a| !a.success));
}

#[tokio::test(start_paused = true)]
async fn a_timeout_counts_as_a_failure_and_escalates() {
    let policy = LevelPolicy {
        enabled: [true, false, false],
        attempt_timeout: Duration::from_millis(100),
        base_delay: Duration::ZERO,
    };
    let executor = Executor::new(Arc::new(HangingFixAction), policy, SafeMode::default());

    let record = executor.remediate(&build_event()).await;
    // Level 1 timed out, levels 2 and 3 are disabled: exhausted with one
    // recorded attempt.
    assert_eq!(record.state, RemediationState::Exhausted);
    assert_eq!(record.attempts.len(), 1);
    assert!(!record.attempts[0].success);
    assert!(record.attempts[0].fix_applied.contains("timed out"));
}

#[tokio::test]
async fn disabled_levels_advance_without_attempts() {
    let policy = LevelPolicy {
        enabled: [false, true, false],
        attempt_timeout: Duration::from_secs(5),
        base_delay: Duration::ZERO,
    };
    let action = Arc::new(ScriptedFixAction::new([true]));
    let executor = Executor::new(action.clone(), policy, SafeMode::default());

    let record = executor.remediate(&build_event()).await;
    assert_eq!(record.state, RemediationState::Resolved);
    // Only the enabled level actually ran.
    assert_eq!(record.attempts.len(), 1);
    assert_eq!(record.attempts[0].level, FixLevel::L2);
    assert_eq!(action.calls(), vec![(FixLevel::L2, record.pattern.clone())]);
}

#[tokio::test]
async fn safe_mode_skips_without_executing_any_fix() {
    let action = Arc::new(ScriptedFixAction::new([true, true, true]));
    let executor = Executor::new(action.clone(), fast_policy(), SafeMode::new(true));

    let record = executor.remediate(&build_event()).await;
    assert!(record.safe_mode_skipped);
    assert!(record.attempts.is_empty());
    assert!(!record.resolved());
    assert!(action.calls().is_empty());
}

#[tokio::test]
async fn disengaging_safe_mode_restores_execution() {
    let action = Arc::new(ScriptedFixAction::new([true]));
    let safe_mode = SafeMode::new(true);
    let executor = Executor::new(action, fast_policy(), safe_mode.clone());

    assert!(executor.remediate(&build_event()).await.safe_mode_skipped);
    safe_mode.disengage();
    assert!(executor.remediate(&build_event()).await.resolved());
}
