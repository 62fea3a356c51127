//! Sequential quadratic programming with a damped BFGS Hessian.
//!
//! Each iteration solves a QP built from the current objective gradient,
//! linearized constraints and a positive-definite quasi-Newton approximation
//! of the Lagrangian Hessian, then backtracks on an L1 exact-penalty merit
//! function.
//!
//! The solve succeeds only at a KKT point: feasible within the constraint
//! tolerance, with the Lagrangian gradient `∇f + J_eqᵀ z_eq − J_inᵀ z_in` and
//! the complementarity sum `Σ |z_in · c_in|` below `tolerance · (1 + |f|)`.
//! Small steps or a stalled line search are not taken as convergence.

use nalgebra::{DMatrix, DVector};

use crate::error::{SolverResult, ensure_finite};
use crate::nlp::Nlp;
use crate::qp::{QpData, QpOutcome, solve_qp};

/// SQP configuration.
#[derive(Clone, Debug)]
pub struct SqpConfig {
    /// Maximum major iterations
    pub max_iterations: usize,
    /// Optimality tolerance, relative to `1 + |f|`, on the infinity norm of
    /// the Lagrangian gradient and on complementarity
    pub tolerance: f64,
    /// Feasibility tolerance, relative to the largest initial constraint value
    pub constraint_tolerance: f64,
    /// Sufficient decrease factor of the merit line search
    pub armijo: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for SqpConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-6,
            constraint_tolerance: 1e-6,
            armijo: 1e-4,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
        }
    }
}

/// Termination reason; codes follow the SLSQP convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// The linearized constraints became inconsistent.
    InconsistentLinearization,
    /// The QP subproblem solver failed.
    QpFailed,
    /// No step length reduced the merit function.
    LineSearchFailed,
    IterationLimit,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::InconsistentLinearization => 4,
            ExitStatus::QpFailed => 6,
            ExitStatus::LineSearchFailed => 8,
            ExitStatus::IterationLimit => 9,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitStatus::Success
    }

    pub fn message(self) -> &'static str {
        match self {
            ExitStatus::Success => "Optimization terminated successfully",
            ExitStatus::InconsistentLinearization => "Inequality constraints incompatible",
            ExitStatus::QpFailed => "QP subproblem failed",
            ExitStatus::LineSearchFailed => "Positive directional derivative for linesearch",
            ExitStatus::IterationLimit => "Iteration limit reached",
        }
    }
}

/// One accepted major iteration.
#[derive(Clone, Debug)]
pub struct SqpIteration {
    pub iteration: usize,
    pub objective: f64,
    pub constraint_violation: f64,
    pub step_norm: f64,
    pub step_length: f64,
}

/// SQP result; `x` is the last accepted iterate whatever the status.
#[derive(Clone, Debug)]
pub struct SqpResult {
    pub x: DVector<f64>,
    pub objective: f64,
    pub status: ExitStatus,
    pub iterations: usize,
    /// Objective/constraint value evaluations
    pub nfev: usize,
    /// Gradient/Jacobian evaluations
    pub ngev: usize,
    /// Largest equality residual or inequality shortfall
    pub constraint_violation: f64,
    pub z_eq: DVector<f64>,
    pub z_in: DVector<f64>,
}

struct Point {
    x: DVector<f64>,
    f: f64,
    grad: DVector<f64>,
    c_eq: DVector<f64>,
    c_in: DVector<f64>,
    j_eq: DMatrix<f64>,
    j_in: DMatrix<f64>,
}

impl Point {
    fn violation_inf(&self) -> f64 {
        violation_inf(&self.c_eq, &self.c_in)
    }

    fn lagrangian_gradient(&self, z_eq: &DVector<f64>, z_in: &DVector<f64>) -> DVector<f64> {
        &self.grad + self.j_eq.transpose() * z_eq - self.j_in.transpose() * z_in
    }
}

fn inf_norm<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    values.into_iter().fold(0.0f64, |m, v| m.max(v.abs()))
}

fn violation_inf(c_eq: &DVector<f64>, c_in: &DVector<f64>) -> f64 {
    c_in.iter().fold(inf_norm(c_eq), |m, c| m.max(-c))
}

fn violation_l1(c_eq: &DVector<f64>, c_in: &DVector<f64>) -> f64 {
    c_eq.iter().map(|c| c.abs()).sum::<f64>() + c_in.iter().map(|c| (-c).max(0.0)).sum::<f64>()
}

fn evaluate_point<N: Nlp>(nlp: &N, x: DVector<f64>) -> SolverResult<Point> {
    let (f, grad) = nlp.objective_gradient(&x)?;
    let (c_eq, c_in) = nlp.constraints(&x)?;
    let (j_eq, j_in) = nlp.constraint_jacobians(&x)?;
    ensure_finite("objective", [&f])?;
    ensure_finite("objective gradient", &grad)?;
    ensure_finite("equality constraints", &c_eq)?;
    ensure_finite("inequality constraints", &c_in)?;
    ensure_finite("equality constraint Jacobian", &j_eq)?;
    ensure_finite("inequality constraint Jacobian", &j_in)?;
    Ok(Point {
        x,
        f,
        grad,
        c_eq,
        c_in,
        j_eq,
        j_in,
    })
}

/// Minimizes `nlp` from `x0`.
///
/// Returns `Err` only for evaluation failures and non-finite values; every
/// other termination yields an [`SqpResult`] whose status says why.
pub fn minimize<N, P>(
    nlp: &N,
    x0: DVector<f64>,
    config: &SqpConfig,
    mut on_iteration: P,
) -> SolverResult<SqpResult>
where
    N: Nlp,
    P: FnMut(&SqpIteration),
{
    let n = nlp.nvars();
    let mut point = evaluate_point(nlp, x0)?;
    let mut nfev = 1;
    let mut ngev = 1;

    let c_scale = point
        .c_eq
        .iter()
        .chain(point.c_in.iter())
        .fold(1.0f64, |m, c| m.max(c.abs()));
    let feas_tol = config.constraint_tolerance * c_scale;
    let scale_tol = config.constraint_tolerance.sqrt() * c_scale;

    let mut hessian = DMatrix::<f64>::identity(n, n);
    let mut hessian_scaled = false;
    let mut penalty = 0.0f64;
    let mut z_eq = DVector::zeros(point.c_eq.len());
    let mut z_in = DVector::zeros(point.c_in.len());

    let finish = |point: Point,
                  status: ExitStatus,
                  iterations: usize,
                  nfev: usize,
                  ngev: usize,
                  z_eq: DVector<f64>,
                  z_in: DVector<f64>| SqpResult {
        constraint_violation: point.violation_inf(),
        objective: point.f,
        x: point.x,
        status,
        iterations,
        nfev,
        ngev,
        z_eq,
        z_in,
    };

    for iteration in 1..=config.max_iterations {
        let outcome = solve_qp(&QpData {
            hessian: &hessian,
            gradient: &point.grad,
            c_eq: &point.c_eq,
            j_eq: &point.j_eq,
            c_in: &point.c_in,
            j_in: &point.j_in,
        })?;
        let qp = match outcome {
            QpOutcome::Solved(qp) => qp,
            QpOutcome::Infeasible => {
                tracing::debug!(iteration, "linearized constraints infeasible");
                let status = ExitStatus::InconsistentLinearization;
                return Ok(finish(point, status, iteration, nfev, ngev, z_eq, z_in));
            }
            QpOutcome::Failed { status } => {
                tracing::debug!(iteration, %status, "QP subproblem failed");
                return Ok(finish(point, ExitStatus::QpFailed, iteration, nfev, ngev, z_eq, z_in));
            }
        };
        ensure_finite("QP step", &qp.step)?;
        let d = qp.step;
        z_eq = qp.z_eq;
        z_in = qp.z_in;

        // First-order optimality of the current point under the QP multipliers.
        let stationarity = inf_norm(&point.lagrangian_gradient(&z_eq, &z_in));
        let complementarity: f64 = z_in
            .iter()
            .zip(point.c_in.iter())
            .map(|(z, c)| (z * c).abs())
            .sum();
        let violation = point.violation_inf();
        let kkt_tol = config.tolerance * (1.0 + point.f.abs());
        if violation <= feas_tol && stationarity <= kkt_tol && complementarity <= kkt_tol {
            tracing::debug!(iteration, stationarity, complementarity, violation, "KKT conditions met");
            return Ok(finish(point, ExitStatus::Success, iteration, nfev, ngev, z_eq, z_in));
        }

        let gd = point.grad.dot(&d);
        let z_max = inf_norm(z_eq.iter().chain(z_in.iter()));
        penalty = penalty.max(1.1 * z_max + 1e-8);
        let merit0 = point.f + penalty * violation_l1(&point.c_eq, &point.c_in);
        let slope = gd - penalty * violation_l1(&point.c_eq, &point.c_in);

        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..config.max_line_search_iters {
            let x_trial = &point.x + alpha * &d;
            let f_trial = nlp.objective(&x_trial)?;
            let (ce, ci) = nlp.constraints(&x_trial)?;
            nfev += 1;
            ensure_finite("objective", [&f_trial])?;
            ensure_finite("equality constraints", &ce)?;
            ensure_finite("inequality constraints", &ci)?;
            let merit = f_trial + penalty * violation_l1(&ce, &ci);
            if merit <= merit0 + config.armijo * alpha * slope.min(0.0) {
                accepted = Some(x_trial);
                break;
            }
            alpha *= config.line_search_beta;
        }

        let Some(x_new) = accepted else {
            tracing::debug!(iteration, stationarity, violation, "merit line search failed");
            let status = ExitStatus::LineSearchFailed;
            return Ok(finish(point, status, iteration, nfev, ngev, z_eq, z_in));
        };

        let next = evaluate_point(nlp, x_new)?;
        ngev += 1;

        let s = &next.x - &point.x;
        let mut y = next.lagrangian_gradient(&z_eq, &z_in) - point.lagrangian_gradient(&z_eq, &z_in);
        let sy = s.dot(&y);
        // Seed the curvature scale once, from a step taken along the
        // (nearly) linearized constraint surface: sᵀy/sᵀs is the curvature
        // the step actually saw.
        if !hessian_scaled && sy > 0.0 && violation <= scale_tol {
            hessian = DMatrix::identity(n, n) * (sy / s.dot(&s));
            hessian_scaled = true;
        }
        let bs = &hessian * &s;
        let sbs = s.dot(&bs);
        if sbs > f64::EPSILON * s.dot(&s).max(f64::MIN_POSITIVE) {
            // Powell damping keeps the update positive definite.
            if sy < 0.2 * sbs {
                let theta = 0.8 * sbs / (sbs - sy);
                y = theta * y + (1.0 - theta) * &bs;
            }
            let sy = s.dot(&y);
            hessian += (&y * y.transpose()) / sy - (&bs * bs.transpose()) / sbs;
        }

        let step_norm = inf_norm(&s);
        let record = SqpIteration {
            iteration,
            objective: next.f,
            constraint_violation: next.violation_inf(),
            step_norm,
            step_length: alpha,
        };
        tracing::debug!(
            iteration,
            objective = record.objective,
            violation = record.constraint_violation,
            step = step_norm,
            alpha,
            "SQP iteration"
        );
        on_iteration(&record);

        point = next;
    }

    let iterations = config.max_iterations;
    Ok(finish(point, ExitStatus::IterationLimit, iterations, nfev, ngev, z_eq, z_in))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;

    /// Rosenbrock with a disk constraint `r² − x0² − x1² ≥ 0` and an optional
    /// line `x0 − x1 = 0`.
    struct Rosenbrock {
        radius_sq: f64,
        with_line: bool,
    }

    impl Nlp for Rosenbrock {
        fn nvars(&self) -> usize {
            2
        }

        fn objective(&self, x: &DVector<f64>) -> SolverResult<f64> {
            Ok((1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2))
        }

        fn objective_gradient(&self, x: &DVector<f64>) -> SolverResult<(f64, DVector<f64>)> {
            let g0 = -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0] * x[0]);
            let g1 = 200.0 * (x[1] - x[0] * x[0]);
            Ok((self.objective(x)?, DVector::from_vec(vec![g0, g1])))
        }

        fn constraints(&self, x: &DVector<f64>) -> SolverResult<(DVector<f64>, DVector<f64>)> {
            let eq = if self.with_line {
                DVector::from_vec(vec![x[0] - x[1]])
            } else {
                DVector::zeros(0)
            };
            let ineq = DVector::from_vec(vec![self.radius_sq - x[0] * x[0] - x[1] * x[1]]);
            Ok((eq, ineq))
        }

        fn constraint_jacobians(
            &self,
            x: &DVector<f64>,
        ) -> SolverResult<(DMatrix<f64>, DMatrix<f64>)> {
            let eq = if self.with_line {
                DMatrix::from_row_slice(1, 2, &[1.0, -1.0])
            } else {
                DMatrix::zeros(0, 2)
            };
            let ineq = DMatrix::from_row_slice(1, 2, &[-2.0 * x[0], -2.0 * x[1]]);
            Ok((eq, ineq))
        }
    }

    #[test]
    fn inactive_disk_reaches_rosenbrock_minimum() {
        let nlp = Rosenbrock {
            radius_sq: 3.0,
            with_line: false,
        };
        let cfg = SqpConfig::default();
        let res = minimize(&nlp, DVector::from_vec(vec![-1.2, 1.0]), &cfg, |_| {}).unwrap();
        assert!(res.status.is_success(), "{:?}", res.status);
        assert!((res.x[0] - 1.0).abs() < 1e-3);
        assert!((res.x[1] - 1.0).abs() < 1e-3);
        assert!(res.ngev <= res.nfev);
    }

    #[test]
    fn active_disk_with_line() {
        // On x0 = x1 the disk gives x0 ≤ sqrt(0.75); the unconstrained
        // minimizer (1, 1) lies outside.
        let nlp = Rosenbrock {
            radius_sq: 1.5,
            with_line: true,
        };
        let cfg = SqpConfig::default();
        let res = minimize(&nlp, DVector::from_vec(vec![0.0, 0.0]), &cfg, |_| {}).unwrap();
        assert!(res.status.is_success(), "{:?}", res.status);
        let edge = 0.75f64.sqrt();
        assert!((res.x[0] - edge).abs() < 1e-4);
        assert!((res.x[1] - edge).abs() < 1e-4);
        assert!(res.constraint_violation < 1e-6);
        assert!(res.z_in[0] > 0.0);
    }

    #[test]
    fn iteration_cap_keeps_last_iterate() {
        let nlp = Rosenbrock {
            radius_sq: 3.0,
            with_line: false,
        };
        let cfg = SqpConfig {
            max_iterations: 2,
            ..SqpConfig::default()
        };
        let mut seen = 0;
        let res = minimize(&nlp, DVector::from_vec(vec![-1.2, 1.0]), &cfg, |_| seen += 1).unwrap();
        assert_eq!(res.status, ExitStatus::IterationLimit);
        assert_eq!(res.status.code(), 9);
        assert_eq!(seen, 2);
        assert!(res.objective < 24.2);
    }

    /// `min u·v` on the line `v = 1e-5·u + 1`: a bilinear objective whose
    /// reduced curvature `2e-5` is tiny next to the mixed second derivative.
    /// The minimizer is `u = −5e4`, `v = 0.5`, `f = −2.5e4`.
    struct WeakReducedCurvature;

    impl Nlp for WeakReducedCurvature {
        fn nvars(&self) -> usize {
            2
        }
        fn objective(&self, x: &DVector<f64>) -> SolverResult<f64> {
            Ok(x[0] * x[1])
        }
        fn objective_gradient(&self, x: &DVector<f64>) -> SolverResult<(f64, DVector<f64>)> {
            Ok((x[0] * x[1], DVector::from_vec(vec![x[1], x[0]])))
        }
        fn constraints(&self, x: &DVector<f64>) -> SolverResult<(DVector<f64>, DVector<f64>)> {
            Ok((DVector::from_vec(vec![x[1] - 1e-5 * x[0] - 1.0]), DVector::zeros(0)))
        }
        fn constraint_jacobians(
            &self,
            _x: &DVector<f64>,
        ) -> SolverResult<(DMatrix<f64>, DMatrix<f64>)> {
            Ok((DMatrix::from_row_slice(1, 2, &[-1e-5, 1.0]), DMatrix::zeros(0, 2)))
        }
    }

    #[test]
    fn weak_reduced_curvature_is_not_mistaken_for_convergence() {
        let res = minimize(&WeakReducedCurvature, DVector::zeros(2), &SqpConfig::default(), |_| {})
            .unwrap();
        assert!(res.status.is_success(), "{:?}", res.status);
        assert!((res.x[0] + 5e4).abs() < 1.5e3, "u = {}", res.x[0]);
        assert!((res.objective + 2.5e4).abs() < 2.5e4 * 1e-3, "f = {}", res.objective);
        // Stationarity of the returned point under the returned multiplier.
        let r0 = res.x[1] - 1e-5 * res.z_eq[0];
        let r1 = res.x[0] + res.z_eq[0];
        assert!(r0.abs().max(r1.abs()) <= 1e-6 * (1.0 + res.objective.abs()));
    }

    /// `x²` with a gradient that points the wrong way by a tiny amount.
    struct MisreportedGradient;

    impl Nlp for MisreportedGradient {
        fn nvars(&self) -> usize {
            1
        }
        fn objective(&self, x: &DVector<f64>) -> SolverResult<f64> {
            Ok(x[0] * x[0])
        }
        fn objective_gradient(&self, x: &DVector<f64>) -> SolverResult<(f64, DVector<f64>)> {
            Ok((x[0] * x[0], DVector::from_element(1, -1e-4)))
        }
        fn constraints(&self, _x: &DVector<f64>) -> SolverResult<(DVector<f64>, DVector<f64>)> {
            Ok((DVector::zeros(0), DVector::zeros(0)))
        }
        fn constraint_jacobians(
            &self,
            _x: &DVector<f64>,
        ) -> SolverResult<(DMatrix<f64>, DMatrix<f64>)> {
            Ok((DMatrix::zeros(0, 1), DMatrix::zeros(0, 1)))
        }
    }

    #[test]
    fn failed_line_search_is_not_success() {
        // The expected decrease is far below sqrt(tolerance) but the point is
        // not stationary, so the stall must be reported as such.
        let x0 = DVector::from_element(1, 1.0);
        let res = minimize(&MisreportedGradient, x0, &SqpConfig::default(), |_| {}).unwrap();
        assert_eq!(res.status, ExitStatus::LineSearchFailed);
        assert_eq!(res.status.code(), 8);
        assert_eq!(res.x[0], 1.0);
        assert_eq!(res.iterations, 1);
    }

    struct NanObjective;

    impl Nlp for NanObjective {
        fn nvars(&self) -> usize {
            1
        }
        fn objective(&self, _x: &DVector<f64>) -> SolverResult<f64> {
            Ok(f64::NAN)
        }
        fn objective_gradient(&self, _x: &DVector<f64>) -> SolverResult<(f64, DVector<f64>)> {
            Ok((f64::NAN, DVector::zeros(1)))
        }
        fn constraints(&self, _x: &DVector<f64>) -> SolverResult<(DVector<f64>, DVector<f64>)> {
            Ok((DVector::zeros(0), DVector::zeros(0)))
        }
        fn constraint_jacobians(
            &self,
            _x: &DVector<f64>,
        ) -> SolverResult<(DMatrix<f64>, DMatrix<f64>)> {
            Ok((DMatrix::zeros(0, 1), DMatrix::zeros(0, 1)))
        }
    }

    #[test]
    fn nan_aborts_the_solve() {
        let err = minimize(&NanObjective, DVector::zeros(1), &SqpConfig::default(), |_| {})
            .unwrap_err();
        assert!(matches!(err, SolverError::NonFinite { what: "objective", .. }));
    }
}
