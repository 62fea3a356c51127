//! Hydrodynamic data errors.

use thiserror::Error;
use wo_core::WoError;

/// Result type for hydrodynamic data operations.
pub type HydroResult<T> = Result<T, HydroError>;

#[derive(Error, Debug)]
pub enum HydroError {
    /// Array shapes disagree (DOF count, frequency count, direction count).
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// A requested wave frequency is not a multiple of the grid fundamental.
    #[error("Frequency {frequency_hz} Hz is not on the grid (f1 = {f1_hz} Hz, nfreq = {nfreq})")]
    FrequencyNotOnGrid {
        frequency_hz: f64,
        f1_hz: f64,
        nfreq: usize,
    },

    /// Wave direction has no matching excitation coefficients.
    #[error("Wave direction {direction_rad} rad not present in excitation data")]
    UnknownDirection { direction_rad: f64 },

    #[error("Unsupported dataset format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] WoError),
}
