//! The escalation state machine, as pure data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Escalation tier of a single fix attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FixLevel {
    L1,
    L2,
    L3,
}

impl FixLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            FixLevel::L1 => 1,
            FixLevel::L2 => 2,
            FixLevel::L3 => 3,
        }
    }

    /// Zero-based index into per-level configuration arrays.
    pub fn index(self) -> usize {
        usize::from(self.as_u8() - 1)
    }
}

impl fmt::Display for FixLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.as_u8())
    }
}

/// Outcome of one level attempt. A timeout is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
}

/// Per-event remediation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemediationState {
    New,
    Level1,
    Level2,
    Level3,
    Resolved,
    Exhausted,
}

impl RemediationState {
    /// The level this state attempts, if it attempts one.
    pub fn level(self) -> Option<FixLevel> {
        match self {
            RemediationState::Level1 => Some(FixLevel::L1),
            RemediationState::Level2 => Some(FixLevel::L2),
            RemediationState::Level3 => Some(FixLevel::L3),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RemediationState::Resolved | RemediationState::Exhausted)
    }
}

impl fmt::Display for RemediationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemediationState::New => "new",
            RemediationState::Level1 => "level1",
            RemediationState::Level2 => "level2",
            RemediationState::Level3 => "level3",
            RemediationState::Resolved => "resolved",
            RemediationState::Exhausted => "exhausted",
        };
        f.write_str(s)
    }
}

/// Pure transition function.
///
/// `New` arms the machine at Level 1 regardless of outcome; each level
/// resolves on success or escalates on failure; Level 3 failure exhausts.
/// Terminal states absorb.
pub fn next(state: RemediationState, outcome: AttemptOutcome) -> RemediationState {
    use AttemptOutcome::{Failure, Success};
    use RemediationState::{Exhausted, Level1, Level2, Level3, New, Resolved};

    match (state, outcome) {
        (New, _) => Level1,
        (Level1 | Level2 | Level3, Success) => Resolved,
        (Level1, Failure) => Level2,
        (Level2, Failure) => Level3,
        (Level3, Failure) => Exhausted,
        (terminal @ (Resolved | Exhausted), _) => terminal,
    }
}
