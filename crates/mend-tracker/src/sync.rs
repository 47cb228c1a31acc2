//! Per-cycle mirroring of pattern state into tracker tickets.

use crate::client::{IssueState, IssueTracker};
use mend_executor::RemediationRecord;
use mend_patterns::{ErrorEvent, PatternId};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

/// Label attached to every auto-managed ticket, used to scope searches.
pub const SYNC_LABEL: &str = "mend-auto";

/// Deterministic ticket title for a pattern. The title is the join key
/// between cycles, so it must depend only on the pattern id.
pub fn issue_title(pattern: &PatternId) -> String {
    format!("[mend] Recurring error: {pattern}")
}

/// Best-effort issue mirroring with a fixed inter-call delay.
///
/// Holds an optional tracker: with no credentials configured the
/// coordinator constructs a disabled sync and every call is a no-op
/// rather than a null-dereference waiting to happen.
#[derive(Clone)]
pub struct IssueSync {
    tracker: Option<Arc<dyn IssueTracker>>,
    call_delay: Duration,
}

impl IssueSync {
    pub fn new(tracker: Arc<dyn IssueTracker>, call_delay: Duration) -> Self {
        Self {
            tracker: Some(tracker),
            call_delay,
        }
    }

    /// A sync that does nothing. Used when tracker credentials are unset.
    pub fn disabled() -> Self {
        Self {
            tracker: None,
            call_delay: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tracker.is_some()
    }

    /// Mirror one remediated event into the tracker.
    ///
    /// Looks up the ticket by derived title, updates it if present,
    /// creates it if absent and the pattern is still unresolved, and
    /// closes it once the latest walk resolved. Every tracker failure is
    /// logged and swallowed; issue sync is not authoritative state.
    pub async fn sync(&self, event: &ErrorEvent, record: &RemediationRecord) {
        let Some(tracker) = &self.tracker else {
            return;
        };

        let title = issue_title(&event.pattern);
        let body = render_body(event, record);
        let desired_state = if record.resolved() {
            IssueState::Closed
        } else {
            IssueState::Open
        };

        match tracker.find_issue_by_title(&title).await {
            Ok(Some(existing)) => {
                tokio::time::sleep(self.call_delay).await;
                if let Err(e) = tracker.update_issue(existing.id, &body, desired_state).await {
                    tracing::warn!(pattern = %event.pattern, error = %e, "issue update failed");
                }
            }
            Ok(None) => {
                if desired_state == IssueState::Closed {
                    // Nothing tracked and nothing left to report.
                    return;
                }
                tokio::time::sleep(self.call_delay).await;
                if let Err(e) = tracker
                    .create_issue(&title, &body, &[SYNC_LABEL.to_owned()])
                    .await
                {
                    tracing::warn!(pattern = %event.pattern, error = %e, "issue create failed");
                }
            }
            Err(e) => {
                tracing::warn!(pattern = %event.pattern, error = %e, "issue lookup failed");
            }
        }
        tokio::time::sleep(self.call_delay).await;
    }
}

fn render_body(event: &ErrorEvent, record: &RemediationRecord) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "## Auto-detected error pattern\n");
    let _ = writeln!(body, "- **Pattern**: `{}`", event.pattern);
    let _ = writeln!(body, "- **Category**: {}", event.category);
    let _ = writeln!(body, "- **Severity**: {}", event.severity);
    let _ = writeln!(body, "- **Blocking**: {}", event.blocking);
    let _ = writeln!(body, "- **Frequency (last window)**: {}", event.frequency);
    let _ = writeln!(body, "- **Last message**:\n\n```\n{}\n```\n", event.message);

    if record.safe_mode_skipped {
        let _ = writeln!(body, "Safe mode was engaged; no fixes were attempted.");
    } else if record.attempts.is_empty() {
        let _ = writeln!(body, "No remediation attempts ran this cycle.");
    } else {
        let _ = writeln!(body, "### Remediation attempts (latest cycle)\n");
        for attempt in &record.attempts {
            let _ = writeln!(
                body,
                "- {} — {} — {}ms — {}",
                attempt.level,
                if attempt.success { "success" } else { "failed" },
                attempt.duration_ms,
                attempt.fix_applied,
            );
        }
        let _ = writeln!(body, "\nTerminal state: **{}**", record.state);
    }
    body
}
