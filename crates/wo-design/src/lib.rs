//! Outer design loop around the control solve.
//!
//! A design point is a vector of physical parameters. Each evaluation builds
//! and solves its own control problem, so samples share nothing mutable and
//! may run in parallel; a single inner solve stays single threaded.
//!
//! Search algorithms only see the [`DesignObjective`] contract
//! `evaluate(params) → scalar` and are interchangeable.

pub mod error;
pub mod objective;
pub mod space;
pub mod strategy;

pub use error::{DesignError, DesignResult};
pub use objective::{DesignObjective, FailurePolicy, InnerSolveObjective};
pub use space::{ParameterSpace, SweepDefinition, SweepKind};
pub use strategy::{Evaluation, GridSearch, NelderMeadSearch, SearchReport, SearchStrategy};
