//! Quadratic subproblem of the SQP iteration.
//!
//! ```text
//! min  ½ dᵀ B d + gᵀ d
//! s.t. c_eq + J_eq d = 0
//!      c_in + J_in d ≥ 0
//! ```
//!
//! solved with Clarabel in its conic form `A d + s = b, s ∈ K`: equality rows
//! go to the zero cone, inequality rows to the non-negative cone.

use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use nalgebra::{DMatrix, DVector};

use crate::error::{SolverError, SolverResult};

/// Step and multipliers of a solved subproblem.
///
/// Multipliers follow the conic sign convention: the QP stationarity
/// condition reads `B d + g + J_eqᵀ z_eq − J_inᵀ z_in = 0` with `z_in ≥ 0`.
#[derive(Clone, Debug)]
pub struct QpSolution {
    pub step: DVector<f64>,
    pub z_eq: DVector<f64>,
    pub z_in: DVector<f64>,
    pub iterations: u32,
}

#[derive(Clone, Debug)]
pub enum QpOutcome {
    Solved(QpSolution),
    /// The linearized constraints admit no step.
    Infeasible,
    Failed { status: String },
}

pub struct QpData<'a> {
    pub hessian: &'a DMatrix<f64>,
    pub gradient: &'a DVector<f64>,
    pub c_eq: &'a DVector<f64>,
    pub j_eq: &'a DMatrix<f64>,
    pub c_in: &'a DVector<f64>,
    pub j_in: &'a DMatrix<f64>,
}

pub fn solve_qp(data: &QpData<'_>) -> SolverResult<QpOutcome> {
    let n = data.gradient.len();
    let (me, mi) = (data.c_eq.len(), data.c_in.len());

    if me == 0 && mi == 0 {
        let step = data
            .hessian
            .clone()
            .cholesky()
            .ok_or_else(|| SolverError::Numeric {
                what: "QP Hessian is not positive definite".to_string(),
            })?
            .solve(&(-data.gradient));
        return Ok(QpOutcome::Solved(QpSolution {
            step,
            z_eq: DVector::zeros(0),
            z_in: DVector::zeros(0),
            iterations: 0,
        }));
    }

    let p_mat = upper_triangular_csc(data.hessian);
    let q: Vec<f64> = data.gradient.iter().copied().collect();

    let mut a_dense = DMatrix::zeros(me + mi, n);
    a_dense.rows_mut(0, me).copy_from(data.j_eq);
    a_dense.rows_mut(me, mi).copy_from(&(-data.j_in));
    let a_mat = dense_to_csc(&a_dense);
    let b: Vec<f64> = data
        .c_eq
        .iter()
        .map(|c| -c)
        .chain(data.c_in.iter().copied())
        .collect();

    let mut cones = Vec::new();
    if me > 0 {
        cones.push(SupportedConeT::ZeroConeT(me));
    }
    if mi > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(mi));
    }

    let settings = DefaultSettingsBuilder::default()
        .verbose(false)
        .max_iter(200)
        .tol_feas(1e-9)
        .tol_gap_abs(1e-9)
        .tol_gap_rel(1e-9)
        .build()
        .map_err(|e| SolverError::QpSetup {
            what: format!("Clarabel settings error: {e:?}"),
        })?;

    let mut solver = DefaultSolver::new(&p_mat, &q, &a_mat, &b, &cones, settings).map_err(|e| {
        SolverError::QpSetup {
            what: format!("Clarabel initialization failed: {e:?}"),
        }
    })?;
    solver.solve();

    let sol = solver.solution;
    match sol.status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => {
            let z = DVector::from_vec(sol.z);
            Ok(QpOutcome::Solved(QpSolution {
                step: DVector::from_vec(sol.x),
                z_eq: z.rows(0, me).into_owned(),
                z_in: z.rows(me, mi).into_owned(),
                iterations: sol.iterations,
            }))
        }
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            Ok(QpOutcome::Infeasible)
        }
        other => Ok(QpOutcome::Failed {
            status: format!("{other:?}"),
        }),
    }
}

/// Upper triangle of the symmetric part of `m`, as CSC.
fn upper_triangular_csc(m: &DMatrix<f64>) -> CscMatrix<f64> {
    let n = m.ncols();
    let mut colptr = Vec::with_capacity(n + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for j in 0..n {
        for i in 0..=j {
            let v = 0.5 * (m[(i, j)] + m[(j, i)]);
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(n, n, colptr, rowval, nzval)
}

fn dense_to_csc(m: &DMatrix<f64>) -> CscMatrix<f64> {
    let (rows, cols) = m.shape();
    let mut colptr = Vec::with_capacity(cols + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for j in 0..cols {
        for i in 0..rows {
            let v = m[(i, j)];
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(rows, cols, colptr, rowval, nzval)
}
