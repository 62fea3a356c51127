//! Solve and design-search execution.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;
use wo_design::{
    Evaluation, GridSearch, InnerSolveObjective, NelderMeadSearch, ParameterSpace, SearchStrategy,
};
use wo_pto::PtoSummary;
use wo_solver::{SolveProgressEvent, SolveResults, TimeSignals, postprocess, solve, solve_with_progress};

use crate::compile::{apply_parameters, compile_case};
use crate::error::{AppError, AppResult};
use crate::schema::{Case, StrategyDef};

/// Options for running a case.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the case's post-processing time refinement.
    pub postprocess_nsubsteps: Option<usize>,
}

/// One sampled quantity of the solved state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub unit: String,
    pub channels: Vec<Vec<f64>>,
}

/// Result of a single control solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub case: String,
    pub success: bool,
    pub exit_code: i32,
    pub message: String,
    /// Unscaled optimal objective, W.
    pub objective: f64,
    pub iterations: usize,
    pub constraint_violation: f64,
    pub solve_time_s: f64,
    pub pto: PtoSummary,
    pub x_wec: Vec<f64>,
    pub x_opt: Vec<f64>,
    pub time_s: Vec<f64>,
    /// WEC signals by name: position, velocity, forces.
    pub wec: BTreeMap<String, SignalReport>,
    /// PTO signals by name: force, power, current, voltage.
    pub pto_signals: BTreeMap<String, SignalReport>,
}

/// Result of a design search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignReport {
    pub case: String,
    pub strategy: String,
    pub parameters: Vec<String>,
    pub evaluations: Vec<Evaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best: Option<Evaluation>,
    pub failures: usize,
    pub search_time_s: f64,
}

fn signals(td: &TimeSignals) -> BTreeMap<String, SignalReport> {
    td.signals
        .iter()
        .map(|(name, signal)| {
            (
                name.clone(),
                SignalReport {
                    unit: signal.unit.to_string(),
                    channels: signal.channels.clone(),
                },
            )
        })
        .collect()
}

/// Compile, solve and post-process a case.
pub fn run_solve(case: &Case, base_dir: &Path, options: &RunOptions) -> AppResult<SolveReport> {
    run_solve_with_progress(case, base_dir, options, &mut |_| {})
}

pub fn run_solve_with_progress(
    case: &Case,
    base_dir: &Path,
    options: &RunOptions,
    progress: &mut dyn FnMut(SolveProgressEvent),
) -> AppResult<SolveReport> {
    let pipeline = compile_case(case, base_dir)?;
    let nsubsteps = options
        .postprocess_nsubsteps
        .unwrap_or(pipeline.postprocess_nsubsteps);
    if nsubsteps == 0 {
        return Err(AppError::InvalidInput(
            "post-processing nsubsteps must be at least 1".to_string(),
        ));
    }

    let started = Instant::now();
    let results = solve_with_progress(
        &pipeline.wec,
        &pipeline.waves,
        &pipeline.objective,
        pipeline.nx_opt,
        &pipeline.options,
        progress,
    )?;
    let solve_time_s = started.elapsed().as_secs_f64();

    let (_, wec_time) = postprocess(&pipeline.wec, &results, &pipeline.waves, nsubsteps)?;
    let pto_report = pipeline
        .pto
        .post_process(&pipeline.wec, &results, &pipeline.waves, nsubsteps)?;
    info!(
        case = %case.name,
        exit_code = results.exit_code(),
        objective = results.objective,
        solve_time_s,
        "solve finished"
    );

    Ok(SolveReport {
        case: case.name.clone(),
        success: results.is_success(),
        exit_code: results.exit_code(),
        message: results.message().to_string(),
        objective: results.objective,
        iterations: results.iterations,
        constraint_violation: results.constraint_violation,
        solve_time_s,
        pto: pto_report.summary,
        x_wec: results.x_wec,
        x_opt: results.x_opt,
        time_s: wec_time.time_s.clone(),
        wec: signals(&wec_time),
        pto_signals: signals(&pto_report.time),
    })
}

/// Runs the case's design search; every sample compiles and solves its own
/// model.
pub fn run_design(case: &Case, base_dir: &Path) -> AppResult<DesignReport> {
    let design = case
        .design
        .as_ref()
        .ok_or_else(|| AppError::InvalidInput(format!("case '{}' has no design section", case.name)))?;
    let names = design.strategy.parameter_names();

    let pipeline = |params: &[f64]| -> AppResult<SolveResults> {
        let sample = apply_parameters(case, &names, params)?;
        let p = compile_case(&sample, base_dir)?;
        Ok(solve(&p.wec, &p.waves, &p.objective, p.nx_opt, &p.options)?)
    };
    let objective = InnerSolveObjective::new(pipeline, design.failure);

    let started = Instant::now();
    let report = match &design.strategy {
        StrategyDef::Grid { sweeps, threads } => {
            let mut search = GridSearch::new(ParameterSpace::new(sweeps.clone())?);
            if let Some(n) = threads {
                search = search.with_threads(*n);
            }
            search.search(&objective)?
        }
        StrategyDef::NelderMead {
            initial,
            step,
            max_iterations,
            ..
        } => {
            let mut search = NelderMeadSearch::new(initial.clone(), step.clone());
            search.max_iterations = *max_iterations;
            search.search(&objective)?
        }
    };
    let search_time_s = started.elapsed().as_secs_f64();
    info!(
        case = %case.name,
        evaluations = report.evaluations.len(),
        failures = report.failures(),
        search_time_s,
        "design search finished"
    );

    Ok(DesignReport {
        case: case.name.clone(),
        strategy: report.strategy.clone(),
        parameters: names.iter().map(|n| n.to_string()).collect(),
        best: report.best().cloned(),
        failures: report.failures(),
        evaluations: report.evaluations,
        search_time_s,
    })
}
