//! Shared application service layer for wave optimization cases.
//!
//! Front ends (the CLI today) go through this crate to load and validate case
//! files, compile them into solvable pipelines and run single solves or design
//! searches.

pub mod case_service;
pub mod compile;
pub mod error;
pub mod run_service;
pub mod schema;
pub mod validate;

pub use case_service::{load_case, save_case};
pub use compile::{Pipeline, apply_parameters, compile_case};
pub use error::{AppError, AppResult};
pub use run_service::{
    DesignReport, RunOptions, SignalReport, SolveReport, run_design, run_solve,
    run_solve_with_progress,
};
pub use schema::*;
pub use validate::{ValidationError, validate_case};
