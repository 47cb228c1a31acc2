use std::path::PathBuf;

/// Ledger I/O failures. These are surfaced to the caller, never swallowed:
/// a silently dropped write corrupts the learning signal.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Reading or writing the backing file failed.
    #[error("ledger I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but does not parse.
    #[error("ledger file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization of ledger state failed.
    #[error("ledger serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
