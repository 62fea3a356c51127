//! NLP assembly for a WEC control problem.

use nalgebra::{DMatrix, DVector};
use wo_core::{Dual, ensure_positive};
use wo_dynamics::{
    Constraint, ConstraintKind, DynamicsResult, Evaluable, Objective, Wec, autodiff,
};
use wo_hydro::Waves;

use crate::error::{SolverError, SolverResult};
use crate::nlp::Nlp;

/// Positive conditioning factors; the solver sees `factor × value`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scaling {
    pub x_wec: f64,
    pub x_opt: f64,
    pub objective: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            x_wec: 1.0,
            x_opt: 1.0,
            objective: 1.0,
        }
    }
}

impl Scaling {
    pub fn validate(&self) -> SolverResult<()> {
        ensure_positive(self.x_wec, "x_wec scale")?;
        ensure_positive(self.x_opt, "x_opt scale")?;
        ensure_positive(self.objective, "objective scale")?;
        Ok(())
    }
}

/// Objective, dynamics equality and registered constraints of one solve,
/// expressed over the scaled vector `z = [s_wec·x_wec, s_opt·x_opt]`.
///
/// Constraint values are not scaled; only their Jacobians pick up the
/// chain-rule factors of the variable scaling.
pub struct WecProblem<'a> {
    wec: &'a Wec,
    waves: &'a Waves,
    objective: &'a Objective,
    nx_opt: usize,
    scaling: Scaling,
    n_eq: usize,
    n_in: usize,
}

impl<'a> WecProblem<'a> {
    pub fn new(
        wec: &'a Wec,
        waves: &'a Waves,
        objective: &'a Objective,
        nx_opt: usize,
        scaling: Scaling,
    ) -> SolverResult<Self> {
        scaling.validate()?;
        let mut problem = Self {
            wec,
            waves,
            objective,
            nx_opt,
            scaling,
            n_eq: wec.nstate(),
            n_in: 0,
        };
        // Constraint output sizes are only known after one evaluation.
        let zeros = vec![0.0_f64; wec.nstate()];
        let opt = vec![0.0_f64; nx_opt];
        for c in wec.constraints() {
            let n = problem.constraint_values(c, zeros.as_slice(), opt.as_slice())?.len();
            match c.kind() {
                ConstraintKind::Equality => problem.n_eq += n,
                ConstraintKind::Inequality => problem.n_in += n,
            }
        }
        Ok(problem)
    }

    pub fn wec(&self) -> &Wec {
        self.wec
    }

    pub fn nx_wec(&self) -> usize {
        self.wec.nstate()
    }

    pub fn nx_opt(&self) -> usize {
        self.nx_opt
    }

    pub fn n_eq(&self) -> usize {
        self.n_eq
    }

    pub fn n_in(&self) -> usize {
        self.n_in
    }

    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    /// `z` from unscaled states.
    pub fn scale(&self, x_wec: &[f64], x_opt: &[f64]) -> SolverResult<DVector<f64>> {
        check_len("x_wec length", self.nx_wec(), x_wec.len())?;
        check_len("x_opt length", self.nx_opt, x_opt.len())?;
        Ok(DVector::from_iterator(
            self.nvars(),
            x_wec
                .iter()
                .map(|v| v * self.scaling.x_wec)
                .chain(x_opt.iter().map(|v| v * self.scaling.x_opt)),
        ))
    }

    /// Unscaled `(x_wec, x_opt)` from `z`.
    pub fn unscale(&self, z: &DVector<f64>) -> (Vec<f64>, Vec<f64>) {
        let nw = self.nx_wec();
        let x_wec = z.iter().take(nw).map(|v| v / self.scaling.x_wec).collect();
        let x_opt = z.iter().skip(nw).map(|v| v / self.scaling.x_opt).collect();
        (x_wec, x_opt)
    }

    /// `∂x/∂z` per entry.
    fn inverse_scales(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::repeat_n(1.0 / self.scaling.x_wec, self.nx_wec())
            .chain(std::iter::repeat_n(1.0 / self.scaling.x_opt, self.nx_opt))
    }

    fn constraint_values<D: Evaluable>(
        &self,
        constraint: &Constraint,
        x_wec: &[D],
        x_opt: &[D],
    ) -> DynamicsResult<Vec<D>> {
        let args = self
            .wec
            .args(x_wec, x_opt, self.waves, constraint.nsubsteps());
        D::constraint(constraint, &args)
    }

    /// Registered constraints of one kind, concatenated in registration order.
    fn kind_values<D: Evaluable>(
        &self,
        kind: ConstraintKind,
        x_wec: &[D],
        x_opt: &[D],
    ) -> DynamicsResult<Vec<D>> {
        let mut out = Vec::new();
        for c in self.wec.constraints().iter().filter(|c| c.kind() == kind) {
            out.extend(self.constraint_values(c, x_wec, x_opt)?);
        }
        Ok(out)
    }

    fn kind_jacobian(
        &self,
        kind: ConstraintKind,
        x_wec: &[f64],
        x_opt: &[f64],
    ) -> SolverResult<DMatrix<f64>> {
        let count = match kind {
            ConstraintKind::Equality => self.n_eq - self.nx_wec(),
            ConstraintKind::Inequality => self.n_in,
        };
        if count == 0 {
            return Ok(DMatrix::zeros(0, self.nvars()));
        }
        let nw = self.nx_wec();
        let z: Vec<f64> = x_wec.iter().chain(x_opt).copied().collect();
        let (_, jac) = autodiff::jacobian(&z, |zd: &[Dual]| {
            let (xw, xo) = zd.split_at(nw);
            self.kind_values(kind, xw, xo)
        })?;
        Ok(self.scale_columns(jac))
    }

    fn scale_columns(&self, mut jac: DMatrix<f64>) -> DMatrix<f64> {
        for (j, s) in self.inverse_scales().enumerate() {
            jac.column_mut(j).scale_mut(s);
        }
        jac
    }

    fn objective_value<D: Evaluable>(&self, x_wec: &[D], x_opt: &[D]) -> DynamicsResult<D> {
        let args = self
            .wec
            .args(x_wec, x_opt, self.waves, self.objective.nsubsteps());
        D::objective(self.objective, &args)
    }

    /// Unscaled objective at unscaled states.
    pub fn unscaled_objective(&self, x_wec: &[f64], x_opt: &[f64]) -> SolverResult<f64> {
        Ok(self.objective_value(x_wec, x_opt)?)
    }
}

impl Nlp for WecProblem<'_> {
    fn nvars(&self) -> usize {
        self.nx_wec() + self.nx_opt
    }

    fn objective(&self, z: &DVector<f64>) -> SolverResult<f64> {
        let (x_wec, x_opt) = self.unscale(z);
        Ok(self.scaling.objective * self.objective_value(&x_wec[..], &x_opt[..])?)
    }

    fn objective_gradient(&self, z: &DVector<f64>) -> SolverResult<(f64, DVector<f64>)> {
        let (x_wec, x_opt) = self.unscale(z);
        let nw = x_wec.len();
        let x: Vec<f64> = x_wec.iter().chain(&x_opt).copied().collect();
        let (f, grad) = autodiff::gradient(&x, |xd: &[Dual]| {
            let (xw, xo) = xd.split_at(nw);
            self.objective_value(xw, xo)
        })?;
        let so = self.scaling.objective;
        let grad = DVector::from_iterator(
            grad.len(),
            grad.iter().zip(self.inverse_scales()).map(|(g, s)| so * g * s),
        );
        Ok((so * f, grad))
    }

    fn constraints(&self, z: &DVector<f64>) -> SolverResult<(DVector<f64>, DVector<f64>)> {
        let (x_wec, x_opt) = self.unscale(z);
        let mut eq = self.wec.residual(&x_wec, &x_opt, self.waves)?;
        eq.extend(self.kind_values(ConstraintKind::Equality, &x_wec[..], &x_opt[..])?);
        let ineq = self.kind_values(ConstraintKind::Inequality, &x_wec[..], &x_opt[..])?;
        check_len("equality constraint count", self.n_eq, eq.len())?;
        check_len("inequality constraint count", self.n_in, ineq.len())?;
        Ok((DVector::from_vec(eq), DVector::from_vec(ineq)))
    }

    fn constraint_jacobians(
        &self,
        z: &DVector<f64>,
    ) -> SolverResult<(DMatrix<f64>, DMatrix<f64>)> {
        let (x_wec, x_opt) = self.unscale(z);
        let dynamics = self
            .scale_columns(self.wec.residual_jacobian(&x_wec, &x_opt, self.waves)?);
        let extra = self.kind_jacobian(ConstraintKind::Equality, &x_wec[..], &x_opt[..])?;
        let mut j_eq = DMatrix::zeros(self.n_eq, self.nvars());
        j_eq.rows_mut(0, dynamics.nrows()).copy_from(&dynamics);
        j_eq.rows_mut(dynamics.nrows(), extra.nrows()).copy_from(&extra);
        let j_in = self.kind_jacobian(ConstraintKind::Inequality, &x_wec[..], &x_opt[..])?;
        Ok((j_eq, j_in))
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> SolverResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SolverError::ProblemSetup {
            what: format!("{what}: expected {expected}, got {actual}"),
        })
    }
}
