//! Errors raised by the shared numeric checks.

use thiserror::Error;

pub type WoResult<T> = Result<T, WoError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WoError {
    #[error("{what} is not finite: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("{what} must be positive, got {value}")]
    NotPositive { what: &'static str, value: f64 },
}
