//! Smooth constrained NLP consumed by the SQP driver.

use nalgebra::{DMatrix, DVector};

use crate::error::SolverResult;

/// `min f(x)  s.t.  c_eq(x) = 0,  c_in(x) ≥ 0`.
pub trait Nlp {
    fn nvars(&self) -> usize;

    fn objective(&self, x: &DVector<f64>) -> SolverResult<f64>;

    /// Objective value and gradient.
    fn objective_gradient(&self, x: &DVector<f64>) -> SolverResult<(f64, DVector<f64>)>;

    /// `(c_eq, c_in)` values.
    fn constraints(&self, x: &DVector<f64>) -> SolverResult<(DVector<f64>, DVector<f64>)>;

    /// `(∂c_eq/∂x, ∂c_in/∂x)`.
    fn constraint_jacobians(&self, x: &DVector<f64>)
    -> SolverResult<(DMatrix<f64>, DMatrix<f64>)>;
}
