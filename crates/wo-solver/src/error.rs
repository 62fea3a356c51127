//! Error types for solver operations.

use thiserror::Error;
use wo_core::WoError;
use wo_dynamics::DynamicsError;
use wo_hydro::HydroError;

/// Errors that abort a solve.
///
/// Non-convergence is not an error: it is reported through
/// [`crate::ExitStatus`] with the last iterate retained.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    /// NaN or infinity in an objective, constraint or derivative value.
    #[error("Non-finite {what} at entry {index}: {value}")]
    NonFinite {
        what: &'static str,
        index: usize,
        value: f64,
    },

    #[error("QP subproblem setup failed: {what}")]
    QpSetup { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Dynamics error: {0}")]
    Dynamics(#[from] DynamicsError),

    #[error("Hydrodynamics error: {0}")]
    Hydro(#[from] HydroError),

    #[error(transparent)]
    Core(#[from] WoError),
}

pub type SolverResult<T> = Result<T, SolverError>;

/// Fails on the first non-finite entry.
pub(crate) fn ensure_finite<'a>(
    what: &'static str,
    values: impl IntoIterator<Item = &'a f64>,
) -> SolverResult<()> {
    match values.into_iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(SolverError::NonFinite { what, index, value }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_reports_index() {
        let err = ensure_finite("objective gradient", &[1.0, f64::NAN]).unwrap_err();
        match err {
            SolverError::NonFinite { what, index, .. } => {
                assert_eq!(what, "objective gradient");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(ensure_finite("ok", &[0.0, -1.0]).is_ok());
    }
}
