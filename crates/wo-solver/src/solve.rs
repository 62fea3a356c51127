//! Solve entry point for a WEC control problem.

use tracing::{debug, info, warn};
use wo_core::Verbosity;
use wo_dynamics::{Objective, Wec};
use wo_hydro::Waves;

use crate::error::{SolverError, SolverResult};
use crate::nlp::Nlp;
use crate::problem::{Scaling, WecProblem};
use crate::sqp::{ExitStatus, SqpConfig, minimize};

/// Options of one inner solve.
#[derive(Clone, Debug, Default)]
pub struct SolveOptions {
    /// Initial WEC state; rest when absent.
    pub x_wec_0: Option<Vec<f64>>,
    /// Initial controller state; zeros when absent.
    pub x_opt_0: Option<Vec<f64>>,
    pub scaling: Scaling,
    pub sqp: SqpConfig,
    pub verbosity: Verbosity,
}

/// Progress events emitted during a solve.
#[derive(Clone, Debug)]
pub enum SolveProgressEvent {
    Started {
        nvars: usize,
        n_eq: usize,
        n_in: usize,
    },
    Iteration {
        iteration: usize,
        /// Unscaled objective.
        objective: f64,
        constraint_violation: f64,
        step_norm: f64,
    },
    Finished {
        status: ExitStatus,
        iterations: usize,
    },
}

/// Terminal artifact of a solve, unscaled.
#[derive(Clone, Debug)]
pub struct SolveResults {
    pub x_wec: Vec<f64>,
    pub x_opt: Vec<f64>,
    pub objective: f64,
    pub status: ExitStatus,
    pub iterations: usize,
    pub nfev: usize,
    pub ngev: usize,
    pub constraint_violation: f64,
}

impl SolveResults {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn exit_code(&self) -> i32 {
        self.status.code()
    }

    pub fn message(&self) -> &'static str {
        self.status.message()
    }
}

/// Solves for the optimal WEC and controller states.
pub fn solve(
    wec: &Wec,
    waves: &Waves,
    objective: &Objective,
    nx_opt: usize,
    options: &SolveOptions,
) -> SolverResult<SolveResults> {
    solve_with_progress(wec, waves, objective, nx_opt, options, &mut |_| {})
}

pub fn solve_with_progress(
    wec: &Wec,
    waves: &Waves,
    objective: &Objective,
    nx_opt: usize,
    options: &SolveOptions,
    progress: &mut dyn FnMut(SolveProgressEvent),
) -> SolverResult<SolveResults> {
    let problem = WecProblem::new(wec, waves, objective, nx_opt, options.scaling)?;

    let x_wec_0 = initial_guess(options.x_wec_0.as_deref(), problem.nx_wec(), "x_wec_0")?;
    let x_opt_0 = initial_guess(options.x_opt_0.as_deref(), nx_opt, "x_opt_0")?;
    let z0 = problem.scale(&x_wec_0, &x_opt_0)?;

    progress(SolveProgressEvent::Started {
        nvars: problem.nvars(),
        n_eq: problem.n_eq(),
        n_in: problem.n_in(),
    });
    if options.verbosity.summary() {
        info!(
            objective = objective.name(),
            nvars = problem.nvars(),
            n_eq = problem.n_eq(),
            n_in = problem.n_in(),
            "Starting WEC control solve"
        );
    }

    let objective_scale = options.scaling.objective;
    let result = minimize(&problem, z0, &options.sqp, |it| {
        let unscaled = it.objective / objective_scale;
        if options.verbosity.iterations() {
            debug!(
                iteration = it.iteration,
                objective = unscaled,
                constraint_violation = it.constraint_violation,
                step_norm = it.step_norm,
                step_length = it.step_length,
                "SQP iteration"
            );
        }
        progress(SolveProgressEvent::Iteration {
            iteration: it.iteration,
            objective: unscaled,
            constraint_violation: it.constraint_violation,
            step_norm: it.step_norm,
        });
    })?;

    let (x_wec, x_opt) = problem.unscale(&result.x);
    let results = SolveResults {
        x_wec,
        x_opt,
        objective: result.objective / objective_scale,
        status: result.status,
        iterations: result.iterations,
        nfev: result.nfev,
        ngev: result.ngev,
        constraint_violation: result.constraint_violation,
    };

    progress(SolveProgressEvent::Finished {
        status: results.status,
        iterations: results.iterations,
    });
    if !results.is_success() {
        warn!(
            exit_code = results.exit_code(),
            iterations = results.iterations,
            constraint_violation = results.constraint_violation,
            "{}",
            results.message()
        );
    } else if options.verbosity.summary() {
        info!(
            objective = results.objective,
            iterations = results.iterations,
            nfev = results.nfev,
            ngev = results.ngev,
            "{}",
            results.message()
        );
    }
    Ok(results)
}

fn initial_guess(given: Option<&[f64]>, n: usize, what: &str) -> SolverResult<Vec<f64>> {
    match given {
        None => Ok(vec![0.0; n]),
        Some(x) if x.len() == n => Ok(x.to_vec()),
        Some(x) => Err(SolverError::ProblemSetup {
            what: format!("{what} has length {}, expected {n}", x.len()),
        }),
    }
}
