//! Case → solvable pipeline compilation.

use std::path::Path;

use nalgebra::DMatrix;
use tracing::debug;
use wo_core::{deg, hz, m};
use wo_dynamics::{
    AdditionalForce, DampingAction, DampingPolicy, LinearMooring, Objective, QuadraticDrag, Wec,
    WecBuilder,
};
use wo_hydro::{FrequencyGrid, HeavingCylinder, HydroDataset, Phases, Waves};
use wo_pto::{Kinematics, Pto};
use wo_solver::{Scaling, SolveOptions, SqpConfig};

use crate::error::{AppError, AppResult};
use crate::schema::{BodyDef, Case, DampingActionDef, ForceDef, PhasesDef, WavesDef};

/// Case fields a design search may vary.
pub const KNOWN_PARAMETERS: &[&str] = &[
    "body.radius_m",
    "body.draft_m",
    "constraints.force_limit_n",
    "pto.generator.gear_ratio",
    "pto.generator.winding_resistance",
];

/// Everything one inner solve needs, built from a case.
pub struct Pipeline {
    pub wec: Wec,
    pub pto: Pto,
    pub waves: Waves,
    pub objective: Objective,
    /// Length of the control state.
    pub nx_opt: usize,
    pub options: SolveOptions,
    pub postprocess_nsubsteps: usize,
}

/// Builds the model of a validated case; dataset paths resolve against `base_dir`.
pub fn compile_case(case: &Case, base_dir: &Path) -> AppResult<Pipeline> {
    let grid = FrequencyGrid::new(case.grid.f1_hz, case.grid.nfreq, case.grid.zero_frequency)?;

    let mut builder = match &case.body {
        BodyDef::Cylinder {
            radius_m,
            draft_m,
            friction,
        } => {
            let body = HeavingCylinder::new(m(*radius_m), m(*draft_m))?;
            let builder = WecBuilder::from_coefficients(
                grid,
                body.coefficients(&grid)?,
                body.mass(),
                body.stiffness(),
            );
            match friction {
                Some(f) => builder.friction(DMatrix::from_element(1, 1, *f)),
                None => builder,
            }
        }
        BodyDef::Dataset {
            path,
            mass,
            stiffness,
            friction,
            damping,
        } => {
            let dataset = HydroDataset::load(&base_dir.join(path))?;
            let action = match damping.action {
                DampingActionDef::Warn => DampingAction::Warn,
                DampingActionDef::Clip => DampingAction::Clip {
                    minimum: damping.minimum,
                },
                DampingActionDef::Reject => DampingAction::Reject,
            };
            let builder = WecBuilder::from_coefficients(
                grid,
                dataset.to_coefficients()?,
                matrix("body.mass", mass)?,
                matrix("body.stiffness", stiffness)?,
            )
            .damping_policy(DampingPolicy {
                tolerance: damping.tolerance,
                action,
            });
            match friction {
                Some(f) => builder.friction(matrix("body.friction", f)?),
                None => builder,
            }
        }
    };

    for force in &case.forces {
        let additional = match force {
            ForceDef::Mooring {
                stiffness, damping, ..
            } => AdditionalForce::new(LinearMooring {
                stiffness: matrix("mooring stiffness", stiffness)?,
                damping: matrix("mooring damping", damping)?,
            }),
            ForceDef::Drag { coefficients, .. } => AdditionalForce::new(QuadraticDrag {
                coefficients: coefficients.clone(),
            }),
        };
        builder = builder.force(force.name(), additional);
    }

    let pto = compile_pto(case, &grid, builder_ndof(&case.body))?;
    builder = builder.force("PTO", pto.force_on_wec_force());
    if let Some(limit) = case.constraints.force_limit_n {
        builder = builder.constraint(pto.force_limit(limit, case.constraints.nsubsteps)?);
    }
    let wec = builder.build()?;

    let waves = compile_waves(&case.waves, grid)?;
    let objective = pto.average_power_objective(case.objective.power, case.objective.nsubsteps);
    let nx_opt = pto.nstate(&grid);
    let solver = &case.solver;
    let options = SolveOptions {
        x_wec_0: None,
        x_opt_0: solver.x_opt_0.clone(),
        scaling: Scaling {
            x_wec: solver.scaling.x_wec,
            x_opt: solver.scaling.x_opt,
            objective: solver.scaling.objective,
        },
        sqp: SqpConfig {
            max_iterations: solver.max_iterations,
            tolerance: solver.tolerance,
            constraint_tolerance: solver.constraint_tolerance,
            ..SqpConfig::default()
        },
        verbosity: case.logging.verbosity,
    };
    debug!(
        case = %case.name,
        nstate = wec.nstate(),
        nx_opt,
        "compiled case"
    );

    Ok(Pipeline {
        wec,
        pto,
        waves,
        objective,
        nx_opt,
        options,
        postprocess_nsubsteps: solver.postprocess_nsubsteps,
    })
}

/// DOF count implied by the body definition.
fn builder_ndof(body: &BodyDef) -> usize {
    match body {
        BodyDef::Cylinder { .. } => 1,
        BodyDef::Dataset { mass, .. } => mass.len(),
    }
}

fn compile_pto(case: &Case, grid: &FrequencyGrid, ndof: usize) -> AppResult<Pto> {
    let kinematics = match &case.pto.kinematics {
        Some(rows) => Kinematics::new(matrix("pto.kinematics", rows)?)?,
        None => Kinematics::identity(ndof),
    };
    let mut pto = Pto::new(kinematics, case.pto.controller);
    if !case.pto.names.is_empty() {
        pto = pto.with_names(case.pto.names.clone())?;
    }
    if let Some(generator) = &case.pto.generator {
        pto = pto.with_impedance(generator.impedance(grid)?)?;
    }
    Ok(pto)
}

fn compile_waves(def: &WavesDef, grid: FrequencyGrid) -> AppResult<Waves> {
    Ok(match def {
        WavesDef::Still => Waves::still(grid),
        WavesDef::Regular {
            frequency_hz,
            amplitude_m,
            phase_deg,
            direction_deg,
        } => Waves::regular(
            grid,
            hz(*frequency_hz),
            m(*amplitude_m),
            deg(*phase_deg),
            deg(*direction_deg),
        )?,
        WavesDef::Irregular {
            spectral_density,
            direction_deg,
            phases,
        } => {
            let phases = match phases {
                PhasesDef::Random { seed } => Phases::Random { seed: *seed },
                PhasesDef::Specified(p) => Phases::Specified(p.iter().map(|d| d.to_radians()).collect()),
            };
            Waves::irregular(grid, spectral_density, deg(*direction_deg), phases)?
        }
    })
}

fn matrix(what: &str, rows: &[Vec<f64>]) -> AppResult<DMatrix<f64>> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);
    if nrows == 0 || ncols == 0 || rows.iter().any(|r| r.len() != ncols) {
        return Err(AppError::Compile(format!("{what}: rows must have equal, non-zero length")));
    }
    Ok(DMatrix::from_fn(nrows, ncols, |i, j| rows[i][j]))
}

/// Copy of `case` with the named fields set to `values`.
pub fn apply_parameters(case: &Case, names: &[&str], values: &[f64]) -> AppResult<Case> {
    if names.len() != values.len() {
        return Err(AppError::InvalidInput(format!(
            "{} design parameters but {} values",
            names.len(),
            values.len()
        )));
    }
    let mut case = case.clone();
    for (name, &value) in names.iter().zip(values) {
        let missing = || AppError::InvalidInput(format!("design parameter '{name}' does not apply to this case"));
        match *name {
            "body.radius_m" => match &mut case.body {
                BodyDef::Cylinder { radius_m, .. } => *radius_m = value,
                BodyDef::Dataset { .. } => return Err(missing()),
            },
            "body.draft_m" => match &mut case.body {
                BodyDef::Cylinder { draft_m, .. } => *draft_m = value,
                BodyDef::Dataset { .. } => return Err(missing()),
            },
            "constraints.force_limit_n" => case.constraints.force_limit_n = Some(value),
            "pto.generator.gear_ratio" => {
                case.pto.generator.as_mut().ok_or_else(missing)?.gear_ratio = value;
            }
            "pto.generator.winding_resistance" => {
                case.pto.generator.as_mut().ok_or_else(missing)?.winding_resistance = value;
            }
            other => {
                return Err(AppError::InvalidInput(format!("unknown design parameter '{other}'")));
            }
        }
    }
    Ok(case)
}
