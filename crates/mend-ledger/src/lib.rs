//! Success-rate ledger.
//!
//! The ledger is the only state that crosses cycles: per-pattern attempt
//! counters, a rolling duration window, and a bounded history of recent
//! outcomes. It is an explicit store object — opened from a path, passed
//! into collaborators, flushed durably on every write — never a global.
//!
//! # Invariants
//!
//! - `successes + failures == attempts` for every pattern, always.
//! - The success rate is recomputed from the counters on demand; the value
//!   written to disk is informational and ignored on load, so the two can
//!   never drift.
//! - `record_fix` performs a durable write (temp file + rename) before
//!   returning, so a crash mid-cycle loses at most the in-flight attempt.

pub mod stats;
pub mod store;

mod error;

pub use error::LedgerError;
pub use stats::{FixOutcome, LedgerSummary, PatternStats};
pub use store::{FixContext, Ledger};

/// Patterns with fewer recorded attempts than this always retry; there is
/// not enough evidence to give up.
pub const MIN_ATTEMPTS_BEFORE_GIVING_UP: u64 = 3;

/// Rolling duration window size per pattern.
pub const DURATION_WINDOW_CAP: usize = 100;

/// Bounded history length across all patterns.
pub const HISTORY_CAP: usize = 100;
