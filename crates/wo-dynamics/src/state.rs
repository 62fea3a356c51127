//! Arguments handed to every force, constraint and objective callable.

use nalgebra::DMatrix;
use wo_core::{Dual, Scalar};
use wo_hydro::{FrequencyGrid, Waves, fourier};

use crate::constraint::Constraint;
use crate::error::{DynamicsError, DynamicsResult};
use crate::force::AdditionalForce;
use crate::objective::Objective;
use crate::wec::Wec;

/// Time samples per DOF, indexed `[dof][sample]`.
pub type TimeSeries<D> = Vec<Vec<D>>;

/// Basis matrices for one time refinement.
#[derive(Clone, Debug)]
pub struct FourierOps {
    pub nsubsteps: usize,
    /// Samples from coefficients.
    pub time: DMatrix<f64>,
    /// First time derivative samples from coefficients.
    pub time_deriv: DMatrix<f64>,
    /// Second time derivative samples from coefficients.
    pub time_deriv2: DMatrix<f64>,
    /// Coefficients from samples.
    pub analysis: DMatrix<f64>,
}

impl FourierOps {
    pub fn new(grid: &FrequencyGrid, nsubsteps: usize) -> Self {
        let nsubsteps = nsubsteps.max(1);
        let time = fourier::time_mat(grid, nsubsteps);
        let deriv = fourier::derivative_mat(grid);
        let time_deriv = &time * &deriv;
        let time_deriv2 = &time_deriv * &deriv;
        Self {
            nsubsteps,
            analysis: fourier::analysis_mat(grid, nsubsteps),
            time,
            time_deriv,
            time_deriv2,
        }
    }

    pub fn nt(&self) -> usize {
        self.time.nrows()
    }
}

/// The `(state, x_wec, x_opt, waves)` tuple of the callable contract, at the
/// time resolution `nsubsteps` the callable is evaluated on.
pub struct StateArgs<'a, D> {
    pub wec: &'a Wec,
    pub x_wec: &'a [D],
    pub x_opt: &'a [D],
    pub waves: &'a Waves,
    pub nsubsteps: usize,
}

impl<D: Scalar> StateArgs<'_, D> {
    pub fn ndof(&self) -> usize {
        self.wec.ndof()
    }

    pub fn nt(&self) -> usize {
        self.wec.grid().nt(self.nsubsteps)
    }

    pub fn ops(&self) -> std::sync::Arc<FourierOps> {
        self.wec.ops(self.nsubsteps)
    }

    pub fn position(&self) -> TimeSeries<D> {
        fourier::apply_per_dof(&self.ops().time, self.x_wec, self.ndof())
    }

    pub fn velocity(&self) -> TimeSeries<D> {
        fourier::apply_per_dof(&self.ops().time_deriv, self.x_wec, self.ndof())
    }

    pub fn acceleration(&self) -> TimeSeries<D> {
        fourier::apply_per_dof(&self.ops().time_deriv2, self.x_wec, self.ndof())
    }

    /// Samples of one coefficient block `[a0, a1, b1, ...]` on this grid.
    pub fn synthesize(&self, coeffs: &[D]) -> Vec<D> {
        fourier::apply(&self.ops().time, coeffs)
    }

    /// Samples of the time derivative of one coefficient block.
    pub fn synthesize_derivative(&self, coeffs: &[D]) -> Vec<D> {
        fourier::apply(&self.ops().time_deriv, coeffs)
    }
}

/// Scalar lanes the dynamics machinery evaluates callables on.
///
/// `f64` yields values, [`Dual`] yields one directional derivative per pass.
pub trait Evaluable: Scalar {
    fn force(
        name: &str,
        force: &AdditionalForce,
        args: &StateArgs<'_, Self>,
    ) -> DynamicsResult<TimeSeries<Self>>;

    fn constraint(constraint: &Constraint, args: &StateArgs<'_, Self>)
    -> DynamicsResult<Vec<Self>>;

    fn objective(objective: &Objective, args: &StateArgs<'_, Self>) -> DynamicsResult<Self>;
}

impl Evaluable for f64 {
    fn force(
        _name: &str,
        force: &AdditionalForce,
        args: &StateArgs<'_, f64>,
    ) -> DynamicsResult<TimeSeries<f64>> {
        force.inner().eval_value(args)
    }

    fn constraint(constraint: &Constraint, args: &StateArgs<'_, f64>) -> DynamicsResult<Vec<f64>> {
        constraint.inner().eval_value(args)
    }

    fn objective(objective: &Objective, args: &StateArgs<'_, f64>) -> DynamicsResult<f64> {
        objective.inner().eval_value(args)
    }
}

impl Evaluable for Dual {
    fn force(
        name: &str,
        force: &AdditionalForce,
        args: &StateArgs<'_, Dual>,
    ) -> DynamicsResult<TimeSeries<Dual>> {
        force
            .inner()
            .eval_dual(args)
            .unwrap_or_else(|| {
                Err(DynamicsError::NonDifferentiableForce {
                    name: name.to_string(),
                })
            })
    }

    fn constraint(
        constraint: &Constraint,
        args: &StateArgs<'_, Dual>,
    ) -> DynamicsResult<Vec<Dual>> {
        constraint.inner().eval_dual(args)
    }

    fn objective(objective: &Objective, args: &StateArgs<'_, Dual>) -> DynamicsResult<Dual> {
        objective.inner().eval_dual(args)
    }
}
