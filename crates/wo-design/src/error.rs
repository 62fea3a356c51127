//! Error types for design searches.

use thiserror::Error;

pub type DesignResult<T> = Result<T, DesignError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DesignError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid sweep '{name}': {what}")]
    InvalidSweep { name: String, what: &'static str },

    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A sample failed under the marker failure policy.
    #[error("Design sample failed: {message}")]
    SampleFailed { message: String },

    #[error("Search failed: {what}")]
    Search { what: String },
}
