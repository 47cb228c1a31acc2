use std::path::PathBuf;

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held a value that does not parse.
    #[error("invalid value `{value}` for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Error-source collection failures.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read error source at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Report emission failures.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Coordinator-level failures. These abort the current cycle only; the
/// scheduler logs them and retries on the short backoff.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// A cycle was requested while one is already running.
    #[error("a remediation cycle is already in progress")]
    CycleInProgress,

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Ledger(#[from] mend_ledger::LedgerError),

    #[error(transparent)]
    Pattern(#[from] mend_patterns::PatternError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
