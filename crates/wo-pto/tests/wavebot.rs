//! WaveBot-like heaving buoy with force-limited PTOs.

use wo_core::{hz, m, rad};
use wo_dynamics::{Wec, WecBuilder};
use wo_hydro::{FrequencyGrid, HeavingCylinder, Waves};
use wo_pto::{Controller, GeneratorDrivetrain, Kinematics, PowerKind, Pto};
use wo_solver::{Scaling, SolveOptions, SolveResults, solve};

const NSUBSTEPS: usize = 2;
const WAVE_HZ: f64 = 0.3;
const WAVE_AMPLITUDE: f64 = 0.0625;

fn hull() -> HeavingCylinder {
    HeavingCylinder::new(m(0.88), m(0.53)).unwrap()
}

fn grid() -> FrequencyGrid {
    FrequencyGrid::new(0.05, 50, false).unwrap()
}

fn waves(grid: FrequencyGrid) -> Waves {
    Waves::regular(grid, hz(WAVE_HZ), m(WAVE_AMPLITUDE), rad(0.0), rad(0.0)).unwrap()
}

fn wec(grid: FrequencyGrid, pto: &Pto, fmax: Option<f64>) -> Wec {
    let body = hull();
    let mut builder = WecBuilder::from_coefficients(
        grid,
        body.coefficients(&grid).unwrap(),
        body.mass(),
        body.stiffness(),
    )
    .force("PTO", pto.force_on_wec_force());
    if let Some(fmax) = fmax {
        builder = builder.constraint(pto.force_limit(fmax, NSUBSTEPS).unwrap());
    }
    builder.build().unwrap()
}

fn options() -> SolveOptions {
    let mut options = SolveOptions {
        scaling: Scaling {
            x_wec: 1e1,
            x_opt: 1e-3,
            objective: 1e-2,
        },
        ..Default::default()
    };
    options.sqp.max_iterations = 300;
    options
}

fn run(pto: &Pto, fmax: Option<f64>, kind: PowerKind) -> (Wec, Waves, SolveResults) {
    let grid = grid();
    let wec = wec(grid, pto, fmax);
    let waves = waves(grid);
    let objective = pto.average_power_objective(kind, NSUBSTEPS);
    let results = solve(&wec, &waves, &objective, pto.nstate(&grid), &options()).unwrap();
    (wec, waves, results)
}

fn lossless_pto() -> Pto {
    Pto::new(Kinematics::identity(1), Controller::Unstructured)
}

fn generator_pto() -> Pto {
    let impedance = GeneratorDrivetrain::default().impedance(&grid()).unwrap();
    lossless_pto().with_impedance(impedance).unwrap()
}

#[test]
fn lossless_force_limited_solve_respects_bound() {
    let fmax = 2000.0;
    let pto = lossless_pto();
    let (wec, waves, results) = run(&pto, Some(fmax), PowerKind::Mechanical);

    assert!(results.is_success(), "{}", results.message());
    assert!(results.objective < 0.0, "absorbed power {}", results.objective);

    let report = pto.post_process(&wec, &results, &waves, NSUBSTEPS).unwrap();
    let peak = report.time.get("force").unwrap().peak();
    assert!(peak <= fmax * (1.0 + 1e-5), "peak force {peak}");
    assert_eq!(report.summary.peak_force_n, peak);
    assert!(
        (report.summary.average_mechanical_power_w - results.objective).abs()
            < 1e-9 * results.objective.abs()
    );
    // No impedance: both ports carry the same power.
    assert_eq!(
        report.summary.average_mechanical_power_w,
        report.summary.average_electrical_power_w
    );
}

#[test]
fn force_limited_solve_converges_without_scaling() {
    let fmax = 2000.0;
    let pto = lossless_pto();
    let (_, _, scaled) = run(&pto, Some(fmax), PowerKind::Mechanical);

    let grid = grid();
    let wec = wec(grid, &pto, Some(fmax));
    let waves = waves(grid);
    let objective = pto.average_power_objective(PowerKind::Mechanical, NSUBSTEPS);
    let mut options = SolveOptions::default();
    options.sqp.max_iterations = 300;
    let plain = solve(&wec, &waves, &objective, pto.nstate(&grid), &options).unwrap();

    assert!(plain.is_success(), "{}", plain.message());
    assert!(scaled.is_success(), "{}", scaled.message());
    assert!(
        (plain.objective - scaled.objective).abs() < 1e-3 * scaled.objective.abs(),
        "unscaled {} vs scaled {}",
        plain.objective,
        scaled.objective
    );
    let report = pto.post_process(&wec, &plain, &waves, NSUBSTEPS).unwrap();
    assert!(report.summary.peak_force_n <= fmax * (1.0 + 1e-5));
}

#[test]
fn generator_losses_reduce_delivered_power() {
    let fmax = 600.0;
    let (_, _, lossless) = run(&lossless_pto(), Some(fmax), PowerKind::Mechanical);
    let pto = generator_pto();
    let (wec, waves, electrical) = run(&pto, Some(fmax), PowerKind::Electrical);

    assert!(lossless.is_success(), "{}", lossless.message());
    assert!(electrical.is_success(), "{}", electrical.message());
    assert!(electrical.objective < 0.0);
    assert!(
        electrical.objective > lossless.objective,
        "electrical {} vs lossless mechanical {}",
        electrical.objective,
        lossless.objective
    );

    let report = pto.post_process(&wec, &electrical, &waves, NSUBSTEPS).unwrap();
    assert!(report.summary.peak_force_n <= fmax * (1.0 + 1e-5));
    // Conversion losses: mechanical input exceeds electrical output.
    assert!(report.summary.average_mechanical_power_w < report.summary.average_electrical_power_w);
    assert!(report.time.get("current").is_some());
    assert!(report.frequency.get("voltage").is_some());
}

#[test]
fn unconstrained_unstructured_optimum_matches_closed_form() {
    let grid = FrequencyGrid::new(0.1, 5, false).unwrap();
    let pto = lossless_pto();
    let wec = wec(grid, &pto, None);
    let waves = waves(grid);
    let objective = pto.average_power_objective(PowerKind::Mechanical, 1);
    let results = solve(&wec, &waves, &objective, pto.nstate(&grid), &options()).unwrap();

    let body = hull();
    let w = 2.0 * std::f64::consts::PI * WAVE_HZ;
    let fe = body.excitation(w).norm() * WAVE_AMPLITUDE;
    let expected = -fe * fe / (8.0 * body.radiation_damping(w));

    assert!(results.is_success(), "{}", results.message());
    assert!((results.objective - expected).abs() < 1e-3 * expected.abs());
}

#[test]
fn optimal_damping_controller_matches_closed_form() {
    let grid = FrequencyGrid::new(0.1, 5, false).unwrap();
    let pto = Pto::new(Kinematics::identity(1), Controller::Proportional);
    let wec = wec(grid, &pto, None);
    let waves = waves(grid);
    let objective = pto.average_power_objective(PowerKind::Mechanical, 1);
    let options = SolveOptions {
        x_opt_0: Some(vec![-1000.0]),
        ..options()
    };
    let results = solve(&wec, &waves, &objective, pto.nstate(&grid), &options).unwrap();

    let body = hull();
    let w = 2.0 * std::f64::consts::PI * WAVE_HZ;
    let fe = body.excitation(w).norm() * WAVE_AMPLITUDE;
    let z = num_complex::Complex64::new(
        body.radiation_damping(w),
        w * (body.mass()[(0, 0)] + body.added_mass()) - body.stiffness()[(0, 0)] / w,
    );
    let expected = -fe * fe / (4.0 * (z.norm() + z.re));

    assert!(results.is_success(), "{}", results.message());
    assert!((results.objective - expected).abs() < 1e-3 * expected.abs());
    assert!((results.x_opt[0] + z.norm()).abs() < 1e-2 * z.norm());
}
