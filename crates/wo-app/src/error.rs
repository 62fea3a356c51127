//! Error types for the wo-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors for front ends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read case file: {path}")]
    CaseFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write case file: {path}")]
    CaseFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Case parse error: {0}")]
    Parse(String),

    #[error("Case validation failed: {0}")]
    Validation(#[from] crate::validate::ValidationError),

    #[error("Model compilation failed: {0}")]
    Compile(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Design search error: {0}")]
    Design(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for wo-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from backend error types
impl From<wo_hydro::HydroError> for AppError {
    fn from(err: wo_hydro::HydroError) -> Self {
        AppError::Compile(err.to_string())
    }
}

impl From<wo_dynamics::DynamicsError> for AppError {
    fn from(err: wo_dynamics::DynamicsError) -> Self {
        AppError::Compile(err.to_string())
    }
}

impl From<wo_pto::PtoError> for AppError {
    fn from(err: wo_pto::PtoError) -> Self {
        AppError::Compile(err.to_string())
    }
}

impl From<wo_solver::SolverError> for AppError {
    fn from(err: wo_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<wo_design::DesignError> for AppError {
    fn from(err: wo_design::DesignError) -> Self {
        AppError::Design(err.to_string())
    }
}
