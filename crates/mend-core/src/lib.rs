//! Run coordinator and scheduler for the remediation loop.
//!
//! One cycle flows strictly one direction: raw errors → classified
//! events → prioritized queue → remediation attempts → ledger updates →
//! issue sync → report. The ledger is the only state that crosses
//! cycles; everything else is recomputed per run.

pub mod config;
pub mod coordinator;
pub mod report;
pub mod scheduler;
pub mod source;

mod error;

pub use config::{GithubSettings, MendConfig};
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::{ConfigError, CoordinatorError, ReportError, SourceError};
pub use report::{ReportEmitter, RunReport};
pub use scheduler::Scheduler;
pub use source::{ErrorSource, LogScanSource, RawError};
