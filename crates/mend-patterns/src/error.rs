/// Pattern-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// A rule's matcher failed to compile.
    #[error("invalid matcher for pattern `{id}`: {source}")]
    InvalidMatcher {
        /// Pattern id whose matcher was rejected.
        id: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// A rule id was registered twice.
    #[error("duplicate pattern id `{0}`")]
    DuplicateId(String),
}
