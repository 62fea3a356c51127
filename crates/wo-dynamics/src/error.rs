//! Dynamics model errors.

use thiserror::Error;
use wo_core::WoError;
use wo_hydro::HydroError;

pub type DynamicsResult<T> = Result<T, DynamicsError>;

#[derive(Error, Debug)]
pub enum DynamicsError {
    /// Inconsistent DOF, frequency or state counts.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Negative radiation damping rejected by the damping policy.
    #[error(
        "Non-positive radiation damping: {count} entries below tolerance \
         (worst {value} at omega = {omega} rad/s, dof {dof})"
    )]
    NonPositiveDamping {
        count: usize,
        value: f64,
        omega: f64,
        dof: usize,
    },

    /// A force without a dual-number evaluation was asked for a derivative.
    #[error("Additional force '{name}' is not differentiable")]
    NonDifferentiableForce { name: String },

    #[error("Duplicate name: {name}")]
    DuplicateName { name: String },

    /// Raised by a user-supplied force, constraint or objective.
    #[error("Callable '{name}' failed: {message}")]
    Callable { name: String, message: String },

    #[error(transparent)]
    Hydro(#[from] HydroError),

    #[error(transparent)]
    Core(#[from] WoError),
}
