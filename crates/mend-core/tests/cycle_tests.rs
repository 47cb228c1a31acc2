//! End-to-end cycle tests over scripted collaborators.

use mend_core::{Coordinator, CoordinatorBuilder, CoordinatorError, ErrorSource, MendConfig, RawError, ReportEmitter, SourceError};
use mend_executor::FixLevel;
use mend_ledger::{FixContext, Ledger};
use mend_patterns::{Classifier, PatternId, PatternStore};
use mend_test_utils::{RecordingTracker, ScriptedFixAction, StaticErrorSource, TrackerCall};
use mend_tracker::IssueSync;
use std::sync::Arc;
use std::time::Duration;

const BUILD_LINE: &str = "Build failed with exit code 1";
const DOCS_LINE: &str = "Warning: documentation is outdated for /api/recipes";

fn two_event_source() -> Arc<StaticErrorSource> {
    let mut lines: Vec<String> = std::iter::repeat(BUILD_LINE.to_owned()).take(10).collect();
    lines.push(DOCS_LINE.to_owned());
    Arc::new(StaticErrorSource::new(lines))
}

fn builder(source: Arc<dyn ErrorSource>, ledger: Arc<Ledger>) -> CoordinatorBuilder {
    CoordinatorBuilder::new(
        MendConfig {
            escalation_base_delay: Duration::ZERO,
            ..MendConfig::default()
        },
        Classifier::new(PatternStore::builtin().unwrap()),
        ledger,
        source,
    )
    .with_emitter(ReportEmitter::log_only())
    .with_sync(IssueSync::disabled())
}

#[tokio::test]
async fn blocking_build_failure_is_remediated_before_documentation() {
    let ledger = Arc::new(Ledger::in_memory());
    let action = Arc::new(ScriptedFixAction::new([true, true]));
    let coordinator = builder(two_event_source(), ledger.clone())
        .with_action(action.clone())
        .build();

    let report = coordinator.run_cycle().await.unwrap();
    assert_eq!(report.errors_detected, 2);
    assert_eq!(report.errors_fixed, 2);
    assert_eq!(report.errors_failed, 0);
    assert_eq!(report.success_rate, 1.0);
    assert_eq!(report.priority_breakdown.critical, 1);
    assert_eq!(report.priority_breakdown.low, 1);

    let calls = action.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1.as_str(), "build-compile-failed");
    assert_eq!(calls[1].1.as_str(), "docs-out-of-date");

    // Every attempt landed in the ledger.
    assert_eq!(ledger.aggregate().total_attempts, 2);
    assert_eq!(ledger.success_rate(&PatternId::new("build-compile-failed")), 1.0);
}

#[tokio::test]
async fn the_fix_cap_bounds_a_flooded_cycle() {
    let ledger = Arc::new(Ledger::in_memory());
    let action = Arc::new(ScriptedFixAction::new([true]));
    let mut config = MendConfig {
        escalation_base_delay: Duration::ZERO,
        ..MendConfig::default()
    };
    config.max_fixes = 1;
    let coordinator = CoordinatorBuilder::new(
        config,
        Classifier::new(PatternStore::builtin().unwrap()),
        ledger,
        two_event_source(),
    )
    .with_emitter(ReportEmitter::log_only())
    .with_sync(IssueSync::disabled())
    .with_action(action.clone())
    .build();

    let report = coordinator.run_cycle().await.unwrap();
    assert_eq!(report.errors_detected, 2);
    // Only the highest-priority event was attempted.
    assert_eq!(action.calls().len(), 1);
    assert_eq!(action.calls()[0].1.as_str(), "build-compile-failed");
    assert_eq!(report.errors_fixed, 1);
}

#[tokio::test]
async fn escalation_attempts_are_each_recorded_in_the_ledger() {
    let ledger = Arc::new(Ledger::in_memory());
    // Level 3 must be enabled for the full walk.
    let mut config = MendConfig {
        escalation_base_delay: Duration::ZERO,
        ..MendConfig::default()
    };
    config.levels_enabled = [true, true, true];
    let action = Arc::new(ScriptedFixAction::new([false, false, true]));
    let coordinator = CoordinatorBuilder::new(
        config,
        Classifier::new(PatternStore::builtin().unwrap()),
        ledger.clone(),
        Arc::new(StaticErrorSource::new([BUILD_LINE])),
    )
    .with_emitter(ReportEmitter::log_only())
    .with_sync(IssueSync::disabled())
    .with_action(action.clone())
    .build();

    let report = coordinator.run_cycle().await.unwrap();
    assert_eq!(report.errors_fixed, 1);

    let levels: Vec<FixLevel> = action.calls().iter().map(|(l, _)| *l).collect();
    assert_eq!(levels, vec![FixLevel::L1, FixLevel::L2, FixLevel::L3]);

    let stats = ledger.aggregate();
    assert_eq!(stats.total_attempts, 3);
    assert_eq!(stats.total_successes, 1);
    assert_eq!(stats.total_failures, 2);
}

#[tokio::test]
async fn hopeless_patterns_are_skipped_not_retried() {
    let ledger = Arc::new(Ledger::in_memory());
    let pattern = PatternId::new("build-compile-failed");
    for _ in 0..5 {
        ledger
            .record_fix(&pattern, false, FixContext {
                duration_ms: 1,
                message: String::new(),
                fix_description: String::new(),
            })
            .unwrap();
    }

    let action = Arc::new(ScriptedFixAction::new([true]));
    let coordinator = builder(Arc::new(StaticErrorSource::new([BUILD_LINE])), ledger)
        .with_action(action.clone())
        .build();

    let report = coordinator.run_cycle().await.unwrap();
    assert_eq!(report.errors_detected, 1);
    assert_eq!(report.errors_skipped, 1);
    assert_eq!(report.errors_fixed, 0);
    assert!(action.calls().is_empty());
}

#[tokio::test]
async fn dry_run_classifies_and_prioritizes_only() {
    let ledger = Arc::new(Ledger::in_memory());
    let action = Arc::new(ScriptedFixAction::new([true, true]));
    let mut config = MendConfig {
        escalation_base_delay: Duration::ZERO,
        ..MendConfig::default()
    };
    config.dry_run = true;
    let coordinator = CoordinatorBuilder::new(
        config,
        Classifier::new(PatternStore::builtin().unwrap()),
        ledger.clone(),
        two_event_source(),
    )
    .with_emitter(ReportEmitter::log_only())
    .with_sync(IssueSync::disabled())
    .with_action(action.clone())
    .build();

    let report = coordinator.run_cycle().await.unwrap();
    assert_eq!(report.errors_detected, 2);
    assert_eq!(report.errors_fixed, 0);
    assert!(action.calls().is_empty());
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn unmatched_lines_are_reported_but_not_remediated() {
    let ledger = Arc::new(Ledger::in_memory());
    let action = Arc::new(ScriptedFixAction::new([true]));
    let coordinator = builder(
        Arc::new(StaticErrorSource::new(["some totally novel breakage"])),
        ledger,
    )
    .with_action(action.clone())
    .build();

    let report = coordinator.run_cycle().await.unwrap();
    assert_eq!(report.errors_detected, 0);
    assert_eq!(report.unmatched, 1);
    assert!(action.calls().is_empty());
}

#[tokio::test]
async fn issue_sync_mirrors_each_processed_event() {
    let ledger = Arc::new(Ledger::in_memory());
    let tracker = Arc::new(RecordingTracker::default());
    let action = Arc::new(ScriptedFixAction::new([true, true]));
    let coordinator = builder(two_event_source(), ledger)
        .with_action(action)
        .with_sync(IssueSync::new(tracker.clone(), Duration::ZERO))
        .build();

    coordinator.run_cycle().await.unwrap();
    // Both events resolved with no pre-existing tickets: two lookups,
    // nothing created.
    let finds = tracker
        .calls()
        .iter()
        .filter(|c| matches!(c, TrackerCall::Find { .. }))
        .count();
    assert_eq!(finds, 2);
}

#[tokio::test]
async fn a_failing_tracker_does_not_abort_the_cycle() {
    let ledger = Arc::new(Ledger::in_memory());
    let tracker = Arc::new(RecordingTracker::failing());
    let action = Arc::new(ScriptedFixAction::new([true, true]));
    let coordinator = builder(two_event_source(), ledger)
        .with_action(action)
        .with_sync(IssueSync::new(tracker, Duration::ZERO))
        .build();

    let report = coordinator.run_cycle().await.unwrap();
    assert_eq!(report.errors_fixed, 2);
}

#[tokio::test]
async fn overlapping_cycles_are_rejected() {
    struct GatedSource {
        release: tokio::sync::Notify,
        entered: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl ErrorSource for GatedSource {
        async fn collect(&self) -> Result<Vec<RawError>, SourceError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(Vec::new())
        }
    }

    let source = Arc::new(GatedSource {
        release: tokio::sync::Notify::new(),
        entered: tokio::sync::Notify::new(),
    });
    let ledger = Arc::new(Ledger::in_memory());
    let coordinator: Arc<Coordinator> =
        Arc::new(builder(source.clone(), ledger).build());

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.run_cycle().await }
    });
    // Wait until the first cycle is inside collect, then try a second.
    source.entered.notified().await;
    match coordinator.run_cycle().await {
        Err(CoordinatorError::CycleInProgress) => {}
        other => panic!("expected CycleInProgress, got {other:?}"),
    }

    source.release.notify_one();
    let report = first.await.unwrap().unwrap();
    assert_eq!(report.errors_detected, 0);

    // The guard clears once the cycle finishes.
    source.release.notify_one();
    assert!(coordinator.run_cycle().await.is_ok());
}

#[tokio::test]
async fn safe_mode_stops_fixes_but_cycles_keep_reporting() {
    let ledger = Arc::new(Ledger::in_memory());
    let action = Arc::new(ScriptedFixAction::new([true, true]));
    let mut config = MendConfig {
        escalation_base_delay: Duration::ZERO,
        ..MendConfig::default()
    };
    config.safe_mode = true;
    let coordinator = CoordinatorBuilder::new(
        config,
        Classifier::new(PatternStore::builtin().unwrap()),
        ledger.clone(),
        two_event_source(),
    )
    .with_emitter(ReportEmitter::log_only())
    .with_sync(IssueSync::disabled())
    .with_action(action.clone())
    .build();

    let report = coordinator.run_cycle().await.unwrap();
    assert_eq!(report.errors_detected, 2);
    assert_eq!(report.errors_fixed, 0);
    assert_eq!(report.errors_failed, 0);
    assert!(action.calls().is_empty());
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn reports_are_written_one_file_per_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(Ledger::in_memory());
    let action = Arc::new(ScriptedFixAction::new([true, true, true, true]));
    let coordinator = CoordinatorBuilder::new(
        MendConfig {
            escalation_base_delay: Duration::ZERO,
            ..MendConfig::default()
        },
        Classifier::new(PatternStore::builtin().unwrap()),
        ledger,
        two_event_source(),
    )
    .with_emitter(ReportEmitter::new(dir.path()))
    .with_sync(IssueSync::disabled())
    .with_action(action)
    .build();

    coordinator.run_cycle().await.unwrap();
    coordinator.run_cycle().await.unwrap();

    let count = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(count, 2);
}
