//! PTO quantities evaluated on arbitrary states.

use nalgebra::DVector;
use wo_core::{hz, m, rad};
use wo_dynamics::{Wec, WecBuilder};
use wo_hydro::{FrequencyGrid, HeavingCylinder, Waves};
use wo_pto::{Controller, GeneratorDrivetrain, Kinematics, PowerKind, Pto};
use wo_solver::{Nlp, Scaling, WecProblem, check_gradients};

fn grid() -> FrequencyGrid {
    FrequencyGrid::new(0.1, 4, false).unwrap()
}

fn build(pto: &Pto) -> Wec {
    let body = HeavingCylinder::new(m(0.5), m(0.4)).unwrap();
    let grid = grid();
    WecBuilder::from_coefficients(grid, body.coefficients(&grid).unwrap(), body.mass(), body.stiffness())
        .force("PTO", pto.force_on_wec_force())
        .constraint(pto.force_limit(50.0, 3).unwrap())
        .build()
        .unwrap()
}

fn state(n: usize, phase: f64) -> Vec<f64> {
    (0..n).map(|i| 0.3 * (phase + 1.3 * i as f64).cos()).collect()
}

fn waves() -> Waves {
    Waves::regular(grid(), hz(0.2), m(0.05), rad(0.0), rad(0.0)).unwrap()
}

#[test]
fn lossless_generator_delivers_mechanical_power() {
    let impedance = GeneratorDrivetrain::default().lossless().impedance(&grid()).unwrap();
    let pto = Pto::new(Kinematics::identity(1), Controller::Unstructured)
        .with_impedance(impedance)
        .unwrap();
    let wec = build(&pto);
    let waves = waves();
    let x_wec = state(wec.nstate(), 0.2);
    let x_opt = state(pto.nstate(&grid()), 1.1);
    let args = wec.args(&x_wec[..], &x_opt[..], &waves, 2);

    let mech = pto.average_power(&args, PowerKind::Mechanical).unwrap();
    let elec = pto.average_power(&args, PowerKind::Electrical).unwrap();
    assert!((mech - elec).abs() < 1e-9 * mech.abs().max(1.0), "{mech} vs {elec}");
}

#[test]
fn lossy_generator_wastes_power() {
    let impedance = GeneratorDrivetrain::default().impedance(&grid()).unwrap();
    let pto = Pto::new(Kinematics::identity(1), Controller::Unstructured)
        .with_impedance(impedance)
        .unwrap();
    let wec = build(&pto);
    let waves = waves();
    let x_wec = state(wec.nstate(), 0.2);
    let x_opt = state(pto.nstate(&grid()), 1.1);
    let args = wec.args(&x_wec[..], &x_opt[..], &waves, 2);

    let mech = pto.average_power(&args, PowerKind::Mechanical).unwrap();
    let elec = pto.average_power(&args, PowerKind::Electrical).unwrap();
    assert!(elec > mech);
    let energy = pto.energy(&args, PowerKind::Electrical).unwrap();
    assert!((energy - elec * grid().period()).abs() < 1e-12 * energy.abs().max(1.0));
}

#[test]
fn force_on_wec_is_kinematics_transpose() {
    let pto = Pto::new(Kinematics::identity(1), Controller::Unstructured);
    let wec = build(&pto);
    let waves = waves();
    let x_wec = state(wec.nstate(), 0.0);
    let x_opt = state(pto.nstate(&grid()), 0.5);
    let args = wec.args(&x_wec[..], &x_opt[..], &waves, 3);
    assert_eq!(pto.force(&args).unwrap(), pto.force_on_wec(&args).unwrap());
    assert_eq!(pto.force(&args).unwrap()[0].len(), grid().nt(3));
}

#[test]
fn missing_impedance_is_reported_for_electrical_port() {
    let pto = Pto::new(Kinematics::identity(1), Controller::Unstructured);
    let wec = build(&pto);
    let waves = waves();
    let x_wec = state(wec.nstate(), 0.0);
    let x_opt = state(pto.nstate(&grid()), 0.5);
    let args = wec.args(&x_wec[..], &x_opt[..], &waves, 1);
    assert!(pto.current(&args).is_err());
}

#[test]
fn electrical_objective_gradients_are_exact() {
    for controller in [Controller::Unstructured, Controller::Pid] {
        let impedance = GeneratorDrivetrain::default().impedance(&grid()).unwrap();
        let pto = Pto::new(Kinematics::identity(1), controller)
            .with_impedance(impedance)
            .unwrap();
        let wec = build(&pto);
        let waves = waves();
        let objective = pto.average_power_objective(PowerKind::Electrical, 2);
        let problem =
            WecProblem::new(&wec, &waves, &objective, pto.nstate(&grid()), Scaling::default())
                .unwrap();
        let z = DVector::from_fn(problem.nvars(), |i, _| 0.05 * (0.9 * i as f64).sin());
        let check = check_gradients(&problem, &z, 1e-6).unwrap();
        assert!(check.passes(1e-5), "{controller:?}: {check:?}");
    }
}
