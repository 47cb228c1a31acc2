use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for an error signature.
///
/// Pattern ids are human-chosen strings (`"db-connection-refused"`), not
/// random ids: they key the ledger file and derive tracker issue titles,
/// so they must survive restarts and redeployments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PatternId(String);

impl PatternId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Broad failure category an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    BuildFailure,
    TestFailure,
    Infrastructure,
    DatabaseConnection,
    DependencyAudit,
    Documentation,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::BuildFailure => "build-failure",
            ErrorCategory::TestFailure => "test-failure",
            ErrorCategory::Infrastructure => "infrastructure",
            ErrorCategory::DatabaseConnection => "database-connection",
            ErrorCategory::DependencyAudit => "dependency-audit",
            ErrorCategory::Documentation => "documentation",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four-tier severity scale. The numeric weight is the base of the
/// priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Base priority weight for this tier.
    pub fn weight(self) -> u32 {
        match self {
            Severity::Critical => 100,
            Severity::High => 75,
            Severity::Medium => 50,
            Severity::Low => 25,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic fix strategy attached to a pattern. The executor maps a
/// strategy plus an escalation level to a concrete action; the strategy
/// itself never encodes commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixStrategy {
    RetryBuild,
    RerunTests,
    CacheReset,
    ServiceRestart,
    DbReconnect,
    DependencyRefresh,
    DocsRegen,
}

impl FixStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            FixStrategy::RetryBuild => "retry-build",
            FixStrategy::RerunTests => "rerun-tests",
            FixStrategy::CacheReset => "cache-reset",
            FixStrategy::ServiceRestart => "service-restart",
            FixStrategy::DbReconnect => "db-reconnect",
            FixStrategy::DependencyRefresh => "dependency-refresh",
            FixStrategy::DocsRegen => "docs-regen",
        }
    }
}

impl fmt::Display for FixStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw, unclassified error line as collected from a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawError {
    pub message: String,
    pub observed_at: DateTime<Utc>,
}

impl RawError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            observed_at: Utc::now(),
        }
    }
}

/// One classified failure instance, consumed within the same cycle by the
/// priority engine and the executor. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub pattern: PatternId,
    pub category: ErrorCategory,
    pub severity: Severity,
    pub strategy: FixStrategy,
    /// First raw message observed for this pattern in the window.
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Occurrences observed in the current collection window.
    pub frequency: u32,
    /// Whether this error halts the pipeline outright.
    pub blocking: bool,
}
