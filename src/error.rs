//! Error taxonomy for the acquisition pipeline.
//!
//! Configuration and not-initialized failures get typed variants because
//! callers branch on them; everything else propagates as `anyhow::Error`
//! with context attached at the failure site.

/// Errors with a meaning of their own in the pipeline contract.
#[derive(thiserror::Error, Debug)]
pub enum LecternError {
    /// A required option was empty at construction. Raised before any I/O.
    #[error("missing required option: {0}")]
    MissingOption(&'static str),

    /// An operation was invoked before its prerequisite resource existed.
    /// Names the missing resource (e.g. "page").
    #[error("not initialized: {0}")]
    NotInitialized(&'static str),

    /// A session operation was invoked out of protocol order.
    #[error("invalid session state: expected {expected}, was {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
}
