//! Issue tracker mirroring.
//!
//! Each unresolved error pattern gets one ticket in the external tracker,
//! keyed by a deterministic title; its body is regenerated every cycle
//! and its open/closed state mirrors the latest remediation outcome.
//! The whole subsystem is best-effort: failures are logged and skipped,
//! never allowed to abort a cycle, and the tracker itself is optional —
//! with no credentials every sync call is a no-op.

pub mod client;
pub mod github;
pub mod sync;

pub use client::{IssueRef, IssueState, IssueTracker, TrackerError};
pub use github::GithubTracker;
pub use sync::{issue_title, IssueSync, SYNC_LABEL};
