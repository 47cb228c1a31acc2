//! The pattern store: an ordered rule table mapping error signatures to
//! category, severity, and fix strategy.
//!
//! Order matters. Rules are evaluated first-to-last and the first match
//! wins, so more specific signatures must be registered before broader
//! ones (the database rules precede the generic infrastructure rules for
//! exactly this reason).

use crate::error::PatternError;
use crate::types::{ErrorCategory, FixStrategy, PatternId, Severity};
use regex::Regex;
use std::collections::HashSet;

/// One entry in the rule table.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub id: PatternId,
    pub matcher: Regex,
    pub category: ErrorCategory,
    pub severity: Severity,
    pub strategy: FixStrategy,
    /// Whether a match of this rule stops the pipeline.
    pub blocking: bool,
}

/// Fixed-order collection of [`PatternRule`]s.
#[derive(Debug, Clone)]
pub struct PatternStore {
    rules: Vec<PatternRule>,
}

impl PatternStore {
    /// Build a store from explicit rules, rejecting duplicate ids.
    pub fn new(rules: Vec<PatternRule>) -> Result<Self, PatternError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str().to_owned()) {
                return Err(PatternError::DuplicateId(rule.id.as_str().to_owned()));
            }
        }
        Ok(Self { rules })
    }

    /// The built-in rule table for a Node/Postgres CI environment.
    pub fn builtin() -> Result<Self, PatternError> {
        let specs: &[(&str, &str, ErrorCategory, Severity, FixStrategy, bool)] = &[
            (
                "db-connection-refused",
                r"(?i)(ECONNREFUSED|connection refused).*(5432|postgres)",
                ErrorCategory::DatabaseConnection,
                Severity::Critical,
                FixStrategy::DbReconnect,
                true,
            ),
            (
                "db-pool-exhausted",
                r"(?i)(too many clients already|pool.*(exhausted|timed? ?out))",
                ErrorCategory::DatabaseConnection,
                Severity::Critical,
                FixStrategy::DbReconnect,
                true,
            ),
            (
                "db-auth-failed",
                r"(?i)password authentication failed for user",
                ErrorCategory::DatabaseConnection,
                Severity::Critical,
                FixStrategy::DbReconnect,
                true,
            ),
            (
                "build-module-not-found",
                r"(?i)(module not found|cannot find module)",
                ErrorCategory::BuildFailure,
                Severity::Critical,
                FixStrategy::CacheReset,
                true,
            ),
            (
                "build-type-error",
                r"(?i)type error:.*(is not assignable|does not exist on type)",
                ErrorCategory::BuildFailure,
                Severity::High,
                FixStrategy::RetryBuild,
                true,
            ),
            (
                "build-compile-failed",
                r"(?i)(build failed|compilation error|webpack.*(error|failed))",
                ErrorCategory::BuildFailure,
                Severity::Critical,
                FixStrategy::RetryBuild,
                true,
            ),
            (
                "test-timeout",
                r"(?i)(test|spec|jest).*\btimed? ?out\b",
                ErrorCategory::TestFailure,
                Severity::High,
                FixStrategy::RerunTests,
                false,
            ),
            (
                "test-assertion-failed",
                r"(?i)(assertion failed|expect\(.*\)\.|\b\d+ fail(ing|ed) tests?\b)",
                ErrorCategory::TestFailure,
                Severity::High,
                FixStrategy::RerunTests,
                false,
            ),
            (
                "infra-disk-full",
                r"(?i)(no space left on device|disk (quota exceeded|full))",
                ErrorCategory::Infrastructure,
                Severity::Critical,
                FixStrategy::ServiceRestart,
                true,
            ),
            (
                "infra-out-of-memory",
                r"(?i)(out of memory|heap limit|ENOMEM|OOMKilled)",
                ErrorCategory::Infrastructure,
                Severity::Critical,
                FixStrategy::ServiceRestart,
                true,
            ),
            (
                "infra-port-in-use",
                r"(?i)(EADDRINUSE|address already in use)",
                ErrorCategory::Infrastructure,
                Severity::High,
                FixStrategy::ServiceRestart,
                false,
            ),
            (
                "dependency-vulnerability",
                r"(?i)(\d+ vulnerabilit(y|ies)|npm audit|audit found)",
                ErrorCategory::DependencyAudit,
                Severity::Medium,
                FixStrategy::DependencyRefresh,
                false,
            ),
            (
                "dependency-deprecated",
                r"(?i)deprecated (package|dependency)",
                ErrorCategory::DependencyAudit,
                Severity::Low,
                FixStrategy::DependencyRefresh,
                false,
            ),
            (
                "docs-out-of-date",
                r"(?i)(documentation.*(outdated|out of date|missing)|missing jsdoc)",
                ErrorCategory::Documentation,
                Severity::Low,
                FixStrategy::DocsRegen,
                false,
            ),
        ];

        let mut rules = Vec::with_capacity(specs.len());
        for (id, pattern, category, severity, strategy, blocking) in specs {
            let matcher = Regex::new(pattern).map_err(|source| PatternError::InvalidMatcher {
                id: (*id).to_owned(),
                source,
            })?;
            rules.push(PatternRule {
                id: PatternId::new(*id),
                matcher,
                category: *category,
                severity: *severity,
                strategy: *strategy,
                blocking: *blocking,
            });
        }
        Self::new(rules)
    }

    /// Rules in registration order.
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
