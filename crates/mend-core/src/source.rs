//! Where raw errors come from.
//!
//! The coordinator only sees the [`ErrorSource`] trait; production scans
//! log files incrementally, tests inject canned batches.

use crate::error::SourceError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;

pub use mend_patterns::RawError;

/// Case-insensitive needles that mark a log line as an error.
const ERROR_NEEDLES: &[&str] = &["error", "err!", "fatal", "failed", "exception"];

/// Produces the raw error window for one cycle.
#[async_trait::async_trait]
pub trait ErrorSource: Send + Sync {
    async fn collect(&self) -> Result<Vec<RawError>, SourceError>;
}

/// Incremental scanner over `*.log` files in a directory.
///
/// Remembers per-file byte offsets so each cycle only sees new lines; a
/// truncated file (rotation) is re-read from the start.
pub struct LogScanSource {
    dir: PathBuf,
    offsets: Mutex<HashMap<PathBuf, u64>>,
}

impl LogScanSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            offsets: Mutex::new(HashMap::new()),
        }
    }

    fn is_error_line(line: &str) -> bool {
        let lowered = line.to_ascii_lowercase();
        ERROR_NEEDLES.iter().any(|needle| lowered.contains(needle))
    }
}

#[async_trait::async_trait]
impl ErrorSource for LogScanSource {
    async fn collect(&self) -> Result<Vec<RawError>, SourceError> {
        let mut found = Vec::new();
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %self.dir.display(), "log directory absent, nothing to collect");
                return Ok(found);
            }
            Err(source) => {
                return Err(SourceError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        while let Some(entry) = dir.next_entry().await.map_err(|source| SourceError::Io {
            path: self.dir.clone(),
            source,
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("log") {
                continue;
            }

            let contents = fs::read_to_string(&path)
                .await
                .map_err(|source| SourceError::Io {
                    path: path.clone(),
                    source,
                })?;
            let total_len = contents.len() as u64;

            let start = {
                let mut offsets = self.offsets.lock();
                let prev = offsets.get(&path).copied().unwrap_or(0);
                // Rotation: the file shrank, start over.
                let start = if prev > total_len { 0 } else { prev };
                offsets.insert(path.clone(), total_len);
                start
            };

            // A rewrite (not append) can leave the offset off a char
            // boundary; fall back to rescanning from the start.
            let tail = contents.get(start as usize..).unwrap_or(&contents);
            for line in tail.lines() {
                if Self::is_error_line(line) {
                    found.push(RawError::new(line.trim()));
                }
            }
        }

        tracing::debug!(count = found.len(), "collected raw error lines");
        Ok(found)
    }
}
