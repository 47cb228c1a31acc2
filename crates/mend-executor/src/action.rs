//! The side-effecting seam: one trait, one production implementation.

use crate::state::FixLevel;
use mend_patterns::{ErrorEvent, FixStrategy};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// What a successful fix did, for the ledger and the tracker body.
#[derive(Debug, Clone)]
pub struct FixReport {
    pub description: String,
}

/// Why a fix attempt failed. Converted into a failed attempt record by
/// the executor, never propagated further.
#[derive(Debug, thiserror::Error)]
pub enum FixError {
    /// The fix process could not be spawned.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The fix process ran and exited non-zero.
    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    /// No action is defined for this strategy at this level.
    #[error("no {level} action for strategy {strategy}")]
    NoAction {
        level: FixLevel,
        strategy: FixStrategy,
    },
}

/// A pluggable fix action.
///
/// The executor owns timeouts, delays and escalation; implementations only
/// perform the level's side effect and say what they did.
#[async_trait::async_trait]
pub trait FixAction: Send + Sync {
    async fn apply(&self, level: FixLevel, event: &ErrorEvent) -> Result<FixReport, FixError>;
}

/// Production fix action: shells out per strategy and level.
///
/// The command table is illustrative of a Node/Postgres deployment; the
/// escalation shape is what matters. Level 1 is a targeted retry, Level 2
/// resets caches and dependencies, Level 3 restarts services.
#[derive(Debug, Clone, Default)]
pub struct ShellFixAction {
    /// Working directory for fix commands; defaults to the process cwd.
    pub workdir: Option<PathBuf>,
}

impl ShellFixAction {
    pub fn new() -> Self {
        Self::default()
    }

    fn command_for(strategy: FixStrategy, level: FixLevel) -> &'static [&'static str] {
        use FixLevel::{L1, L2, L3};
        use FixStrategy::{
            CacheReset, DbReconnect, DependencyRefresh, DocsRegen, RerunTests, RetryBuild,
            ServiceRestart,
        };
        match (strategy, level) {
            (RetryBuild, L1) => &["npm", "run", "build"],
            (RetryBuild | CacheReset, L2) => &["sh", "-c", "rm -rf .next node_modules/.cache && npm run build"],
            (RetryBuild | CacheReset | RerunTests, L3) => &["sh", "-c", "rm -rf node_modules && npm ci && npm run build"],
            (CacheReset, L1) => &["sh", "-c", "rm -rf .next && npm run build"],
            (RerunTests, L1) => &["npm", "test", "--", "--ci"],
            (RerunTests, L2) => &["sh", "-c", "npx jest --clearCache && npm test -- --ci"],
            (DbReconnect, L1) => &["pg_isready", "-t", "10"],
            (DbReconnect, L2) => &["sh", "-c", "systemctl restart pgbouncer || service pgbouncer restart"],
            (DbReconnect | ServiceRestart, L3) => &["sh", "-c", "systemctl restart postgresql && systemctl restart recipe-api"],
            (ServiceRestart, L1) => &["sh", "-c", "systemctl kill -s TERM recipe-api && systemctl start recipe-api"],
            (ServiceRestart, L2) => &["systemctl", "restart", "recipe-api"],
            (DependencyRefresh, L1) => &["npm", "audit", "fix"],
            (DependencyRefresh, L2) => &["sh", "-c", "npm update && npm audit fix"],
            (DependencyRefresh, L3) => &[],
            (DocsRegen, L1) => &["npm", "run", "docs:generate"],
            (DocsRegen, L2 | L3) => &[],
        }
    }
}

#[async_trait::async_trait]
impl FixAction for ShellFixAction {
    async fn apply(&self, level: FixLevel, event: &ErrorEvent) -> Result<FixReport, FixError> {
        let argv = Self::command_for(event.strategy, level);
        if argv.is_empty() {
            return Err(FixError::NoAction {
                level,
                strategy: event.strategy,
            });
        }
        let rendered = argv.join(" ");
        tracing::info!(
            pattern = %event.pattern,
            %level,
            command = %rendered,
            "applying fix"
        );

        let mut cmd = Command::new(argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|source| FixError::Spawn {
            command: rendered.clone(),
            source,
        })?;

        if output.status.success() {
            Ok(FixReport {
                description: format!("{} ({level})", rendered),
            })
        } else {
            Err(FixError::CommandFailed {
                command: rendered,
                status: output.status.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_strategy_has_a_level_one_action() {
        use FixStrategy::*;
        for strategy in [
            RetryBuild,
            RerunTests,
            CacheReset,
            ServiceRestart,
            DbReconnect,
            DependencyRefresh,
            DocsRegen,
        ] {
            assert!(
                !ShellFixAction::command_for(strategy, FixLevel::L1).is_empty(),
                "missing level 1 action for {strategy}"
            );
        }
    }

    #[test]
    fn escalation_gets_more_invasive_for_builds() {
        let l1 = ShellFixAction::command_for(FixStrategy::RetryBuild, FixLevel::L1).join(" ");
        let l3 = ShellFixAction::command_for(FixStrategy::RetryBuild, FixLevel::L3).join(" ");
        assert!(!l1.contains("rm -rf"));
        assert!(l3.contains("rm -rf node_modules"));
    }
}
