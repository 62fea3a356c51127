//! Error types for PTO construction and post-processing.

use thiserror::Error;
use wo_core::WoError;
use wo_dynamics::DynamicsError;
use wo_solver::SolverError;

pub type PtoResult<T> = Result<T, PtoError>;

#[derive(Error, Debug)]
pub enum PtoError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Kinematics must map onto every PTO DOF independently.
    #[error("Kinematics matrix is rank deficient: rank {rank} < {rows} PTO DOFs")]
    RankDeficient { rank: usize, rows: usize },

    #[error("Singular impedance block at frequency index {index}")]
    SingularImpedance { index: usize },

    #[error("Dynamics error: {0}")]
    Dynamics(#[from] DynamicsError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Core(#[from] WoError),
}
