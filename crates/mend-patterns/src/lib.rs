//! Pattern store and error classifier.
//!
//! The classifier is the first stage of the remediation loop: raw error
//! text goes in, typed [`ErrorEvent`]s come out. Matching is data-driven —
//! a fixed, deterministically ordered table of [`PatternRule`]s, first
//! match wins. Classification has no side effects; unmatched errors are
//! reported upstream but never remediated.

pub mod classifier;
pub mod store;
pub mod types;

mod error;

pub use classifier::{ClassifiedBatch, Classification, Classifier};
pub use error::PatternError;
pub use store::{PatternRule, PatternStore};
pub use types::{
    ErrorCategory, ErrorEvent, FixStrategy, PatternId, RawError, Severity,
};
