//! The `evaluate(params) → scalar` contract of the design loop.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::warn;
use wo_solver::SolveResults;

use crate::error::{DesignError, DesignResult};

/// Black-box scalar objective of a design point; lower is better.
///
/// Implementations must not share mutable state between evaluations.
pub trait DesignObjective: Sync {
    fn evaluate(&self, params: &[f64]) -> DesignResult<f64>;
}

impl<F> DesignObjective for F
where
    F: Fn(&[f64]) -> DesignResult<f64> + Sync,
{
    fn evaluate(&self, params: &[f64]) -> DesignResult<f64> {
        self(params)
    }
}

/// What a failed or non-converged inner solve evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// A finite value worse than any expected optimum.
    Penalty(f64),
    /// [`DesignError::SampleFailed`], recorded by the search as a failed sample.
    Marker,
}

/// Zero, i.e. no absorbed power.
impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Penalty(0.0)
    }
}

impl FailurePolicy {
    fn apply(self, params: &[f64], message: String) -> DesignResult<f64> {
        match self {
            FailurePolicy::Penalty(value) => {
                warn!(?params, penalty = value, "{message}");
                Ok(value)
            }
            FailurePolicy::Marker => {
                warn!(?params, "{message}");
                Err(DesignError::SampleFailed { message })
            }
        }
    }
}

/// A per-sample pipeline (build the model for `params`, then solve) as a
/// design objective whose value is the optimal control objective.
pub struct InnerSolveObjective<F> {
    pipeline: F,
    policy: FailurePolicy,
}

impl<F, E> InnerSolveObjective<F>
where
    F: Fn(&[f64]) -> Result<SolveResults, E> + Sync,
    E: Display,
{
    pub fn new(pipeline: F, policy: FailurePolicy) -> Self {
        Self { pipeline, policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }
}

impl<F, E> DesignObjective for InnerSolveObjective<F>
where
    F: Fn(&[f64]) -> Result<SolveResults, E> + Sync,
    E: Display,
{
    fn evaluate(&self, params: &[f64]) -> DesignResult<f64> {
        match (self.pipeline)(params) {
            Ok(results) if results.is_success() && results.objective.is_finite() => {
                Ok(results.objective)
            }
            Ok(results) => self.policy.apply(
                params,
                format!(
                    "inner solve did not converge (exit {}): {}",
                    results.exit_code(),
                    results.message()
                ),
            ),
            Err(err) => self.policy.apply(params, format!("inner solve failed: {err}")),
        }
    }
}
