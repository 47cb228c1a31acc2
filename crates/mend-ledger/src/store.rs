//! The ledger store: open → record → flush lifecycle over a JSON file.

use crate::error::LedgerError;
use crate::stats::{FixOutcome, LedgerSummary, PatternStats};
use crate::{HISTORY_CAP, MIN_ATTEMPTS_BEFORE_GIVING_UP};
use chrono::Utc;
use mend_patterns::PatternId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Context for one recorded attempt.
#[derive(Debug, Clone)]
pub struct FixContext {
    pub duration_ms: u64,
    pub message: String,
    pub fix_description: String,
}

/// On-disk shape of one pattern entry. Carries a computed `success_rate`
/// for humans reading the file; it is ignored on load and recomputed from
/// the counters.
#[derive(Debug, Serialize, Deserialize)]
struct StatsOnDisk {
    #[serde(flatten)]
    stats: PatternStats,
    #[serde(default)]
    success_rate: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    patterns: BTreeMap<String, StatsOnDisk>,
    #[serde(default)]
    history: Vec<FixOutcome>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    patterns: BTreeMap<String, PatternStats>,
    history: VecDeque<FixOutcome>,
}

/// Persisted per-pattern attempt/success store.
///
/// One cycle runs at a time, so the interior mutex only guards against
/// incidental cross-task reads (CLI stats while a cycle holds the store);
/// parallel fix attempts would need per-pattern appends merged under a
/// single writer before this could be shared harder.
#[derive(Debug)]
pub struct Ledger {
    path: Option<PathBuf>,
    inner: Mutex<LedgerInner>,
}

impl Ledger {
    /// Open the ledger at `path`. A missing file yields an empty ledger;
    /// a present-but-unparsable file is an error, not a silent reset.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let inner = match fs::read(&path) {
            Ok(bytes) => {
                let file: LedgerFile =
                    serde_json::from_slice(&bytes).map_err(|source| LedgerError::Corrupt {
                        path: path.clone(),
                        source,
                    })?;
                LedgerInner {
                    patterns: file
                        .patterns
                        .into_iter()
                        .map(|(id, on_disk)| (id, on_disk.stats))
                        .collect(),
                    history: file.history.into(),
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerInner::default(),
            Err(source) => {
                return Err(LedgerError::Io {
                    path,
                    source,
                })
            }
        };
        Ok(Self {
            path: Some(path),
            inner: Mutex::new(inner),
        })
    }

    /// A ledger with no backing file. Used by tests and dry runs; every
    /// persist is a no-op.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: Mutex::new(LedgerInner::default()),
        }
    }

    /// Record one remediation attempt and flush durably before returning.
    pub fn record_fix(
        &self,
        pattern: &PatternId,
        success: bool,
        ctx: FixContext,
    ) -> Result<(), LedgerError> {
        let now = Utc::now();
        let mut inner = self.inner.lock();
        inner
            .patterns
            .entry(pattern.as_str().to_owned())
            .or_insert_with(|| PatternStats::new(now))
            .record(success, ctx.duration_ms, now);
        if inner.history.len() == HISTORY_CAP {
            inner.history.pop_front();
        }
        inner.history.push_back(FixOutcome {
            timestamp: now,
            pattern: pattern.clone(),
            success,
            duration_ms: ctx.duration_ms,
            error_message: ctx.message,
            fix_applied: ctx.fix_description,
        });
        self.persist(&inner)
    }

    /// Learned success rate for a pattern; 0.0 if unseen.
    pub fn success_rate(&self, pattern: &PatternId) -> f64 {
        self.inner
            .lock()
            .patterns
            .get(pattern.as_str())
            .map(PatternStats::success_rate)
            .unwrap_or(0.0)
    }

    /// The sole giving-up gate.
    ///
    /// Unconditionally true below `MIN_ATTEMPTS_BEFORE_GIVING_UP` —
    /// insufficient evidence to write a strategy off — and afterwards
    /// true only while the learned rate clears `threshold`.
    pub fn should_retry(&self, pattern: &PatternId, threshold: f64) -> bool {
        let inner = self.inner.lock();
        match inner.patterns.get(pattern.as_str()) {
            None => true,
            Some(stats) if stats.attempts < MIN_ATTEMPTS_BEFORE_GIVING_UP => true,
            Some(stats) => stats.success_rate() >= threshold,
        }
    }

    /// Best-performing patterns by success rate, then by sample size.
    pub fn top_patterns(&self, n: usize) -> Vec<(PatternId, PatternStats)> {
        let mut ranked = self.all_patterns();
        ranked.sort_by(|(_, a), (_, b)| {
            b.success_rate()
                .partial_cmp(&a.success_rate())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.attempts.cmp(&a.attempts))
        });
        ranked.truncate(n);
        ranked
    }

    /// Worst-performing patterns, excluding those with too few samples to
    /// be a meaningful signal.
    pub fn worst_patterns(&self, n: usize, min_attempts: u64) -> Vec<(PatternId, PatternStats)> {
        let mut ranked: Vec<_> = self
            .all_patterns()
            .into_iter()
            .filter(|(_, stats)| stats.attempts >= min_attempts)
            .collect();
        ranked.sort_by(|(_, a), (_, b)| {
            a.success_rate()
                .partial_cmp(&b.success_rate())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.attempts.cmp(&a.attempts))
        });
        ranked.truncate(n);
        ranked
    }

    /// Most recent `n` outcomes, newest first.
    pub fn recent_history(&self, n: usize) -> Vec<FixOutcome> {
        self.inner
            .lock()
            .history
            .iter()
            .rev()
            .take(n)
            .cloned()
            .collect()
    }

    /// Whole-ledger aggregates.
    pub fn aggregate(&self) -> LedgerSummary {
        let inner = self.inner.lock();
        let total_attempts: u64 = inner.patterns.values().map(|s| s.attempts).sum();
        let total_successes: u64 = inner.patterns.values().map(|s| s.successes).sum();
        let total_failures: u64 = inner.patterns.values().map(|s| s.failures).sum();
        LedgerSummary {
            patterns: inner.patterns.len(),
            total_attempts,
            total_successes,
            total_failures,
            overall_success_rate: if total_attempts == 0 {
                0.0
            } else {
                total_successes as f64 / total_attempts as f64
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().patterns.is_empty()
    }

    /// Operator-only: drop all learned state and flush the empty ledger.
    pub fn clear(&self) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        inner.patterns.clear();
        inner.history.clear();
        self.persist(&inner)
    }

    /// Flush current state to the backing file, if there is one.
    pub fn flush(&self) -> Result<(), LedgerError> {
        let inner = self.inner.lock();
        self.persist(&inner)
    }

    fn all_patterns(&self) -> Vec<(PatternId, PatternStats)> {
        self.inner
            .lock()
            .patterns
            .iter()
            .map(|(id, stats)| (PatternId::new(id.clone()), stats.clone()))
            .collect()
    }

    fn persist(&self, inner: &LedgerInner) -> Result<(), LedgerError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = LedgerFile {
            patterns: inner
                .patterns
                .iter()
                .map(|(id, stats)| {
                    (
                        id.clone(),
                        StatsOnDisk {
                            success_rate: stats.success_rate(),
                            stats: stats.clone(),
                        },
                    )
                })
                .collect(),
            history: inner.history.iter().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;

        // Durable write: temp file in the same directory, then rename over
        // the target so readers never observe a half-written ledger.
        let tmp = tmp_path(path);
        fs::write(&tmp, &bytes).map_err(|source| LedgerError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| LedgerError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
