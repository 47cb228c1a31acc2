use mend_executor::{RemediationAttempt, RemediationRecord, RemediationState};
use mend_patterns::{ErrorCategory, Severity};
use mend_test_utils::{test_event, RecordingTracker, TrackerCall};
use mend_tracker::{issue_title, IssueRef, IssueState, IssueSync};
use std::sync::Arc;
use std::time::Duration;

fn record(state: RemediationState, attempts: Vec<RemediationAttempt>) -> RemediationRecord {
    RemediationRecord {
        pattern: mend_patterns::PatternId::new("db-connection-refused"),
        state,
        attempts,
        safe_mode_skipped: false,
    }
}

fn event() -> mend_patterns::ErrorEvent {
    test_event(
        "db-connection-refused",
        ErrorCategory::DatabaseConnection,
        Severity::Critical,
        7,
        true,
    )
}

fn sync_over(tracker: Arc<RecordingTracker>) -> IssueSync {
    IssueSync::new(tracker, Duration::ZERO)
}

#[tokio::test]
async fn creates_an_open_issue_for_a_new_unresolved_pattern() {
    let tracker = Arc::new(RecordingTracker::default());
    let sync = sync_over(tracker.clone());

    sync.sync(&event(), &record(RemediationState::Exhausted, Vec::new())).await;

    let calls = tracker.calls();
    assert!(matches!(calls[0], TrackerCall::Find { .. }));
    match &calls[1] {
        TrackerCall::Create { title, body } => {
            assert_eq!(title, &issue_title(&event().pattern));
            assert!(body.contains("db-connection-refused"));
        }
        other => panic!("expected Create, got {other:?}"),
    }
}

#[tokio::test]
async fn updates_and_closes_an_existing_issue_on_success() {
    let title = issue_title(&event().pattern);
    let tracker = Arc::new(RecordingTracker::with_existing(vec![IssueRef {
        id: 42,
        title,
        state: IssueState::Open,
    }]));
    let sync = sync_over(tracker.clone());

    sync.sync(&event(), &record(RemediationState::Resolved, Vec::new())).await;

    assert!(tracker.calls().contains(&TrackerCall::Update {
        id: 42,
        state: IssueState::Closed,
    }));
}

#[tokio::test]
async fn resolved_pattern_with_no_ticket_creates_nothing() {
    let tracker = Arc::new(RecordingTracker::default());
    let sync = sync_over(tracker.clone());

    sync.sync(&event(), &record(RemediationState::Resolved, Vec::new())).await;

    assert!(!tracker
        .calls()
        .iter()
        .any(|c| matches!(c, TrackerCall::Create { .. })));
}

#[tokio::test]
async fn tracker_outage_is_swallowed() {
    let tracker = Arc::new(RecordingTracker::failing());
    let sync = sync_over(tracker.clone());

    // Must not panic or propagate; issue sync is best-effort.
    sync.sync(&event(), &record(RemediationState::Exhausted, Vec::new())).await;
    assert_eq!(tracker.calls().len(), 1);
}

#[tokio::test]
async fn disabled_sync_is_a_no_op() {
    let sync = IssueSync::disabled();
    sync.sync(&event(), &record(RemediationState::Exhausted, Vec::new())).await;
}
