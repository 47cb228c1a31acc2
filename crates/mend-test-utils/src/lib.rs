//! Testing utilities for the MEND workspace
//!
//! Shared fakes: scripted fix actions, a recording tracker, and canned
//! error sources.

#![allow(missing_docs)]

use chrono::Utc;
use mend_core::{ErrorSource, RawError, SourceError};
use mend_executor::{FixAction, FixError, FixLevel, FixReport};
use mend_patterns::{ErrorCategory, ErrorEvent, FixStrategy, PatternId, Severity};
use mend_tracker::{IssueRef, IssueState, IssueTracker, TrackerError};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Build an [`ErrorEvent`] without going through the classifier.
pub fn test_event(
    pattern: &str,
    category: ErrorCategory,
    severity: Severity,
    frequency: u32,
    blocking: bool,
) -> ErrorEvent {
    ErrorEvent {
        pattern: PatternId::new(pattern),
        category,
        severity,
        strategy: FixStrategy::RetryBuild,
        message: format!("synthetic {pattern} failure"),
        timestamp: Utc::now(),
        frequency,
        blocking,
    }
}

/// Fix action that replays a script of outcomes, one per call, and
/// records the levels it was invoked at. Replays `true` as success,
/// `false` as failure; an exhausted script fails.
pub struct ScriptedFixAction {
    script: Mutex<VecDeque<bool>>,
    calls: Mutex<Vec<(FixLevel, PatternId)>>,
}

impl ScriptedFixAction {
    pub fn new(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> Vec<(FixLevel, PatternId)> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl FixAction for ScriptedFixAction {
    async fn apply(&self, level: FixLevel, event: &ErrorEvent) -> Result<FixReport, FixError> {
        self.calls.lock().push((level, event.pattern.clone()));
        let outcome = self.script.lock().pop_front().unwrap_or(false);
        if outcome {
            Ok(FixReport {
                description: format!("scripted fix at {level}"),
            })
        } else {
            Err(FixError::CommandFailed {
                command: format!("scripted fix at {level}"),
                status: "exit status: 1".to_owned(),
            })
        }
    }
}

/// Fix action that never returns, for exercising attempt timeouts.
pub struct HangingFixAction;

#[async_trait::async_trait]
impl FixAction for HangingFixAction {
    async fn apply(&self, _level: FixLevel, _event: &ErrorEvent) -> Result<FixReport, FixError> {
        std::future::pending().await
    }
}

/// What the recording tracker saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    Find { title: String },
    Create { title: String, body: String },
    Update { id: u64, state: IssueState },
}

/// In-memory tracker that records calls and serves canned lookups.
#[derive(Default)]
pub struct RecordingTracker {
    pub existing: Mutex<Vec<IssueRef>>,
    pub calls: Mutex<Vec<TrackerCall>>,
    /// When set, every call fails; for best-effort tests.
    pub failing: bool,
}

impl RecordingTracker {
    pub fn with_existing(issues: Vec<IssueRef>) -> Self {
        Self {
            existing: Mutex::new(issues),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.calls.lock().clone()
    }

    fn fail(&self) -> Result<(), TrackerError> {
        if self.failing {
            Err(TrackerError::Api {
                status: 503,
                body: "scripted outage".to_owned(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl IssueTracker for RecordingTracker {
    async fn find_issue_by_title(&self, title: &str) -> Result<Option<IssueRef>, TrackerError> {
        self.calls.lock().push(TrackerCall::Find {
            title: title.to_owned(),
        });
        self.fail()?;
        Ok(self
            .existing
            .lock()
            .iter()
            .find(|issue| issue.title == title)
            .cloned())
    }

    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        _labels: &[String],
    ) -> Result<IssueRef, TrackerError> {
        self.calls.lock().push(TrackerCall::Create {
            title: title.to_owned(),
            body: body.to_owned(),
        });
        self.fail()?;
        let issue = IssueRef {
            id: self.existing.lock().len() as u64 + 1,
            title: title.to_owned(),
            state: IssueState::Open,
        };
        self.existing.lock().push(issue.clone());
        Ok(issue)
    }

    async fn update_issue(
        &self,
        id: u64,
        _body: &str,
        state: IssueState,
    ) -> Result<(), TrackerError> {
        self.calls.lock().push(TrackerCall::Update { id, state });
        self.fail()?;
        if let Some(issue) = self.existing.lock().iter_mut().find(|i| i.id == id) {
            issue.state = state;
        }
        Ok(())
    }
}

/// Error source serving a fixed batch on every collect.
pub struct StaticErrorSource {
    lines: Vec<String>,
}

impl StaticErrorSource {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait::async_trait]
impl ErrorSource for StaticErrorSource {
    async fn collect(&self) -> Result<Vec<RawError>, SourceError> {
        Ok(self
            .lines
            .iter()
            .map(|line| RawError::new(line.as_str()))
            .collect())
    }
}
