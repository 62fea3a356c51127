//! Design searches over independent inner control solves.

use wo_core::{hz, m, rad};
use wo_design::{
    DesignError, DesignObjective, DesignResult, FailurePolicy, GridSearch, InnerSolveObjective,
    NelderMeadSearch, ParameterSpace, SearchStrategy, SweepDefinition, SweepKind,
};
use wo_dynamics::{DynamicsError, WecBuilder};
use wo_hydro::{FrequencyGrid, HeavingCylinder, Waves};
use wo_pto::{Controller, Kinematics, PowerKind, Pto};
use wo_solver::{Scaling, SolveOptions, SolveResults, SolverError, solve};

/// Builds and solves a force-limited cylinder of the given radius.
fn solve_radius(params: &[f64]) -> Result<SolveResults, SolverError> {
    let grid = FrequencyGrid::new(0.1, 5, false)?;
    let body = HeavingCylinder::new(m(params[0]), m(0.5))?;
    let pto = Pto::new(Kinematics::identity(1), Controller::Unstructured);
    let limit = pto.force_limit(400.0, 2).map_err(|e| SolverError::ProblemSetup {
        what: e.to_string(),
    })?;
    let wec = WecBuilder::from_coefficients(grid, body.coefficients(&grid)?, body.mass(), body.stiffness())
        .force("PTO", pto.force_on_wec_force())
        .constraint(limit)
        .build()?;
    let waves = Waves::regular(grid, hz(0.3), m(0.0625), rad(0.0), rad(0.0))?;
    let objective = pto.average_power_objective(PowerKind::Mechanical, 2);
    let options = SolveOptions {
        scaling: Scaling {
            x_wec: 1e1,
            x_opt: 1e-3,
            objective: 1e-2,
        },
        ..Default::default()
    };
    solve(&wec, &waves, &objective, pto.nstate(&grid), &options)
}

fn radius_space() -> ParameterSpace {
    ParameterSpace::new(vec![
        SweepDefinition::new("radius", 0.5, 0.9, 2, SweepKind::Linear).unwrap(),
    ])
    .unwrap()
}

#[test]
fn parallel_samples_match_sequential_solves() {
    let objective = InnerSolveObjective::new(solve_radius, FailurePolicy::Marker);
    let report = GridSearch::new(radius_space())
        .with_threads(2)
        .search(&objective)
        .unwrap();

    assert_eq!(report.evaluations.len(), 2);
    assert_eq!(report.failures(), 0);
    for evaluation in &report.evaluations {
        let alone = solve_radius(&evaluation.params).unwrap();
        assert!(alone.is_success());
        // Same inputs, same arithmetic: no state leaks between samples.
        assert_eq!(evaluation.value, Some(alone.objective));
    }
    let (small, large) = (&report.evaluations[0], &report.evaluations[1]);
    assert_ne!(small.value, large.value);
    assert!(report.best().is_some());
}

#[test]
fn failed_sample_maps_to_penalty() {
    // A non-positive radius fails at model construction.
    let objective = InnerSolveObjective::new(solve_radius, FailurePolicy::Penalty(1e6));
    assert_eq!(objective.evaluate(&[-1.0]).unwrap(), 1e6);

    let marker = InnerSolveObjective::new(solve_radius, FailurePolicy::Marker);
    assert!(matches!(
        marker.evaluate(&[-1.0]),
        Err(DesignError::SampleFailed { .. })
    ));
}

#[test]
fn non_converged_solve_is_a_failure() {
    let objective = InnerSolveObjective::new(
        |_: &[f64]| -> Result<SolveResults, DynamicsError> {
            Ok(SolveResults {
                x_wec: vec![],
                x_opt: vec![],
                objective: -5.0,
                status: wo_solver::ExitStatus::IterationLimit,
                iterations: 10,
                nfev: 10,
                ngev: 10,
                constraint_violation: 1.0,
            })
        },
        FailurePolicy::Penalty(0.0),
    );
    assert_eq!(objective.evaluate(&[1.0]).unwrap(), 0.0);
}

#[test]
fn grid_search_survives_failing_samples() {
    let space = ParameterSpace::new(vec![
        SweepDefinition::new("x", -1.0, 1.0, 5, SweepKind::Linear).unwrap(),
    ])
    .unwrap();
    let objective = |p: &[f64]| -> DesignResult<f64> {
        if p[0] < 0.0 {
            Err(DesignError::SampleFailed {
                message: "negative".to_string(),
            })
        } else {
            Ok((p[0] - 0.5).powi(2))
        }
    };
    let report = GridSearch::new(space).search(&objective).unwrap();
    assert_eq!(report.failures(), 2);
    assert_eq!(report.best().unwrap().params, vec![0.5]);
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("negative"));
}

#[test]
fn nelder_mead_finds_quadratic_minimum() {
    let objective = |p: &[f64]| -> DesignResult<f64> { Ok((p[0] - 1.0).powi(2) + 2.0 * (p[1] + 0.5).powi(2)) };
    let mut search = NelderMeadSearch::new(vec![0.0, 0.0], vec![0.5, 0.5]);
    search.max_iterations = 500;
    search.sd_tolerance = 1e-12;
    let report = search.search(&objective).unwrap();
    let best = report.best().unwrap();
    assert!((best.params[0] - 1.0).abs() < 1e-3, "{:?}", best.params);
    assert!((best.params[1] + 0.5).abs() < 1e-3, "{:?}", best.params);
    assert_eq!(report.strategy, "nelder_mead");
}

#[test]
fn nelder_mead_rejects_bad_simplex() {
    let objective = |p: &[f64]| -> DesignResult<f64> { Ok(p[0]) };
    let search = NelderMeadSearch::new(vec![0.0, 0.0], vec![0.5]);
    assert!(matches!(
        search.search(&objective),
        Err(DesignError::DimensionMismatch { .. })
    ));
}
