//! Per-cycle audit records.

use crate::error::ReportError;
use chrono::{DateTime, Utc};
use mend_priority::PriorityBreakdown;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One structured record per cycle. Immutable once written: the emitter
/// refuses to overwrite an existing file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    /// Monotonic cycle counter within this process.
    pub cycle: u64,
    pub errors_detected: usize,
    pub errors_fixed: usize,
    pub errors_failed: usize,
    /// Events skipped because the ledger voted against retrying.
    pub errors_skipped: usize,
    /// Raw lines no pattern matched; reported, never remediated.
    pub unmatched: usize,
    /// Fixed over attempted this cycle; 0.0 when nothing was attempted.
    pub success_rate: f64,
    pub duration_ms: u64,
    pub priority_breakdown: PriorityBreakdown,
    pub next_run_at: DateTime<Utc>,
}

/// Writes one JSON file per cycle into a report directory.
#[derive(Debug, Clone)]
pub struct ReportEmitter {
    dir: Option<PathBuf>,
}

impl ReportEmitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// An emitter that only logs. Used in dry runs and tests.
    pub fn log_only() -> Self {
        Self { dir: None }
    }

    /// Serialize the report; returns the written path, if any.
    pub fn emit(&self, report: &RunReport) -> Result<Option<PathBuf>, ReportError> {
        tracing::info!(
            cycle = report.cycle,
            detected = report.errors_detected,
            fixed = report.errors_fixed,
            failed = report.errors_failed,
            skipped = report.errors_skipped,
            success_rate = report.success_rate,
            duration_ms = report.duration_ms,
            "cycle report"
        );

        let Some(dir) = &self.dir else {
            return Ok(None);
        };
        fs::create_dir_all(dir).map_err(|source| ReportError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = report_path(dir, report);
        let bytes = serde_json::to_vec_pretty(report)?;
        // create_new: a report is append-only history, never rewritten.
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        use std::io::Write as _;
        let mut file = options.open(&path).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        file.write_all(&bytes).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Some(path))
    }
}

fn report_path(dir: &Path, report: &RunReport) -> PathBuf {
    dir.join(format!(
        "mend-report-{}-cycle{}.json",
        report.timestamp.format("%Y%m%dT%H%M%S"),
        report.cycle
    ))
}
