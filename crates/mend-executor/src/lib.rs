//! Leveled remediation executor.
//!
//! One error event at a time walks an escalating sequence of fix levels:
//! Level 1 (targeted retry / config tweak), Level 2 (dependency or cache
//! reset), Level 3 (service restart or restore). First success is
//! terminal; three failures exhaust the event for this cycle. The state
//! machine is a pure transition function, independent of how each level's
//! side effect is implemented — production shells out, tests script
//! outcomes.

pub mod action;
pub mod executor;
pub mod state;

pub use action::{FixAction, FixError, FixReport, ShellFixAction};
pub use executor::{
    Executor, LevelPolicy, RemediationAttempt, RemediationRecord, SafeMode,
};
pub use state::{next, AttemptOutcome, FixLevel, RemediationState};
