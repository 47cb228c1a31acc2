//! One execution cycle: classify → prioritize → remediate → record →
//! sync → report.

use crate::config::MendConfig;
use crate::error::CoordinatorError;
use crate::report::{ReportEmitter, RunReport};
use crate::source::ErrorSource;
use chrono::Utc;
use mend_executor::{Executor, FixAction, LevelPolicy, SafeMode, ShellFixAction};
use mend_ledger::{FixContext, Ledger};
use mend_patterns::{Classifier, PatternStore};
use mend_priority::PriorityBreakdown;
use mend_tracker::{GithubTracker, IssueSync};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Drives one cycle at a time over injected collaborators.
///
/// All state the coordinator owns is per-process; the ledger is the only
/// thing that survives a restart. Collaborators arrive by injection so
/// tests can swap in scripted sources, actions, and trackers.
pub struct Coordinator {
    classifier: Classifier,
    ledger: Arc<Ledger>,
    executor: Executor,
    sync: IssueSync,
    source: Arc<dyn ErrorSource>,
    emitter: ReportEmitter,
    max_fixes: usize,
    retry_threshold: f64,
    dry_run: bool,
    interval: chrono::Duration,
    /// Reentrancy guard: a cycle in flight rejects a second one.
    running: AtomicBool,
    cycle: AtomicU64,
}

/// Assembles a [`Coordinator`] from configuration plus injectable parts.
pub struct CoordinatorBuilder {
    config: MendConfig,
    classifier: Classifier,
    ledger: Arc<Ledger>,
    source: Arc<dyn ErrorSource>,
    action: Option<Arc<dyn FixAction>>,
    sync: Option<IssueSync>,
    emitter: Option<ReportEmitter>,
}

impl CoordinatorBuilder {
    pub fn new(
        config: MendConfig,
        classifier: Classifier,
        ledger: Arc<Ledger>,
        source: Arc<dyn ErrorSource>,
    ) -> Self {
        Self {
            config,
            classifier,
            ledger,
            source,
            action: None,
            sync: None,
            emitter: None,
        }
    }

    /// Build straight from config with production collaborators.
    pub fn from_config(config: MendConfig) -> Result<Self, CoordinatorError> {
        let classifier = Classifier::new(PatternStore::builtin()?);
        let ledger = Arc::new(Ledger::open(&config.ledger_path)?);
        let source: Arc<dyn ErrorSource> =
            Arc::new(crate::source::LogScanSource::new(&config.log_dir));
        Ok(Self::new(config, classifier, ledger, source))
    }

    pub fn with_action(mut self, action: Arc<dyn FixAction>) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_sync(mut self, sync: IssueSync) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn with_emitter(mut self, emitter: ReportEmitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn build(self) -> Coordinator {
        let config = self.config;
        let action = self
            .action
            .unwrap_or_else(|| Arc::new(ShellFixAction::new()));
        let sync = self.sync.unwrap_or_else(|| match &config.github {
            Some(settings) => IssueSync::new(
                Arc::new(GithubTracker::new(&settings.token, &settings.repo)),
                config.tracker_call_delay,
            ),
            None => IssueSync::disabled(),
        });
        let emitter = self.emitter.unwrap_or_else(|| match &config.report_dir {
            Some(dir) => ReportEmitter::new(dir),
            None => ReportEmitter::log_only(),
        });
        let executor = Executor::new(
            action,
            LevelPolicy {
                enabled: config.levels_enabled,
                attempt_timeout: config.attempt_timeout,
                base_delay: config.escalation_base_delay,
            },
            SafeMode::new(config.safe_mode),
        );

        Coordinator {
            classifier: self.classifier,
            ledger: self.ledger,
            executor,
            sync,
            source: self.source,
            emitter,
            max_fixes: config.max_fixes,
            retry_threshold: config.retry_threshold,
            dry_run: config.dry_run,
            interval: chrono::Duration::from_std(config.interval)
                .unwrap_or_else(|_| chrono::Duration::minutes(30)),
            running: AtomicBool::new(false),
            cycle: AtomicU64::new(0),
        }
    }
}

/// Clears the reentrancy guard even if a cycle errors out mid-flight.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Coordinator {
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn safe_mode(&self) -> &SafeMode {
        self.executor.safe_mode()
    }

    /// Execute one full cycle and return its report.
    ///
    /// Remediation is sequential on purpose: fix actions mutate shared
    /// filesystem and process state and are not safe to interleave.
    pub async fn run_cycle(&self) -> Result<RunReport, CoordinatorError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CoordinatorError::CycleInProgress);
        }
        let _guard = RunningGuard(&self.running);

        let cycle = self.cycle.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();
        let started_at = Utc::now();
        tracing::info!(cycle, "cycle starting");

        let raw = self.source.collect().await?;
        let batch = self.classifier.classify_batch(&raw);
        for miss in &batch.unmatched {
            tracing::info!(message = %miss.message, "unmatched error, not remediating");
        }

        let prioritized =
            mend_priority::prioritize(batch.events, &self.ledger, self.retry_threshold);
        let breakdown = PriorityBreakdown::tally(&prioritized);
        let detected = prioritized.len();
        tracing::info!(cycle, detected, unmatched = batch.unmatched.len(), "classified window");

        let mut fixed = 0usize;
        let mut failed = 0usize;
        let mut skipped = 0usize;
        let mut attempted = 0usize;

        if !self.dry_run {
            // Highest priority first, capped: graceful degradation under
            // overload, the queue's tail waits for the next cycle.
            for item in prioritized.iter().take(self.max_fixes) {
                if !item.should_retry {
                    tracing::info!(
                        pattern = %item.event.pattern,
                        "ledger votes against retrying, skipping"
                    );
                    skipped += 1;
                    continue;
                }

                attempted += 1;
                let record = self.executor.remediate(&item.event).await;
                for attempt in &record.attempts {
                    self.ledger.record_fix(
                        &attempt.pattern,
                        attempt.success,
                        FixContext {
                            duration_ms: attempt.duration_ms,
                            message: item.event.message.clone(),
                            fix_description: attempt.fix_applied.clone(),
                        },
                    )?;
                }
                if record.resolved() {
                    fixed += 1;
                } else if !record.safe_mode_skipped {
                    failed += 1;
                }

                // Best-effort mirror; failures are logged inside.
                self.sync.sync(&item.event, &record).await;
            }
        }

        let report = RunReport {
            timestamp: started_at,
            cycle,
            errors_detected: detected,
            errors_fixed: fixed,
            errors_failed: failed,
            errors_skipped: skipped,
            unmatched: batch.unmatched.len(),
            success_rate: if attempted == 0 {
                0.0
            } else {
                fixed as f64 / attempted as f64
            },
            duration_ms: started.elapsed().as_millis() as u64,
            priority_breakdown: breakdown,
            next_run_at: started_at + self.interval,
        };
        self.emitter.emit(&report)?;
        Ok(report)
    }
}
