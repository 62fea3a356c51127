//! Case validation, run before any model is built.

use std::collections::HashSet;

use crate::compile::KNOWN_PARAMETERS;
use crate::schema::{BodyDef, Case, ForceDef, PhasesDef, StrategyDef, WavesDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_case(case: &Case) -> Result<(), ValidationError> {
    if case.version == 0 || case.version > crate::schema::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: case.version,
        });
    }

    let grid = &case.grid;
    if !(grid.f1_hz.is_finite() && grid.f1_hz > 0.0) {
        return Err(invalid("grid.f1_hz", grid.f1_hz, "must be positive"));
    }
    if grid.nfreq == 0 {
        return Err(invalid("grid.nfreq", grid.nfreq, "must be at least 1"));
    }

    let ndof = validate_body(&case.body)?;
    validate_waves(case)?;

    let npto = match &case.pto.kinematics {
        Some(rows) => validate_matrix("pto.kinematics", rows, None, Some(ndof))?,
        None => ndof,
    };
    if !case.pto.names.is_empty() && case.pto.names.len() != npto {
        return Err(invalid(
            "pto.names",
            case.pto.names.len(),
            "need one name per PTO DOF",
        ));
    }
    if case.pto.generator.is_some() && npto != 1 {
        return Err(invalid(
            "pto.generator",
            npto,
            "a generator drivetrain drives exactly one PTO DOF",
        ));
    }

    let mut force_names = HashSet::new();
    for force in &case.forces {
        if !force_names.insert(force.name()) {
            return Err(ValidationError::DuplicateId {
                id: force.name().to_string(),
                context: "forces".to_string(),
            });
        }
        match force {
            ForceDef::Mooring {
                stiffness, damping, ..
            } => {
                validate_matrix("mooring stiffness", stiffness, Some(ndof), Some(ndof))?;
                validate_matrix("mooring damping", damping, Some(ndof), Some(ndof))?;
            }
            ForceDef::Drag { coefficients, .. } => {
                if coefficients.len() != ndof {
                    return Err(invalid(
                        "drag coefficients",
                        coefficients.len(),
                        "need one coefficient per DOF",
                    ));
                }
            }
        }
    }

    if let Some(limit) = case.constraints.force_limit_n {
        if !(limit.is_finite() && limit > 0.0) {
            return Err(invalid("constraints.force_limit_n", limit, "must be positive"));
        }
    }
    for (field, n) in [
        ("constraints.nsubsteps", case.constraints.nsubsteps),
        ("objective.nsubsteps", case.objective.nsubsteps),
        ("solver.postprocess_nsubsteps", case.solver.postprocess_nsubsteps),
    ] {
        if n == 0 {
            return Err(invalid(field, n, "must be at least 1"));
        }
    }
    let scaling = &case.solver.scaling;
    for (field, v) in [
        ("solver.scaling.x_wec", scaling.x_wec),
        ("solver.scaling.x_opt", scaling.x_opt),
        ("solver.scaling.objective", scaling.objective),
    ] {
        if !(v.is_finite() && v > 0.0) {
            return Err(invalid(field, v, "must be positive"));
        }
    }
    if case.solver.max_iterations == 0 {
        return Err(invalid("solver.max_iterations", 0, "must be at least 1"));
    }

    if let Some(design) = &case.design {
        validate_design(case, &design.strategy)?;
    }
    Ok(())
}

/// Returns the number of WEC DOFs, when it can be known without reading files.
fn validate_body(body: &BodyDef) -> Result<usize, ValidationError> {
    match body {
        BodyDef::Cylinder {
            radius_m,
            draft_m,
            friction,
        } => {
            if !(radius_m.is_finite() && *radius_m > 0.0) {
                return Err(invalid("body.radius_m", radius_m, "must be positive"));
            }
            if !(draft_m.is_finite() && *draft_m > 0.0) {
                return Err(invalid("body.draft_m", draft_m, "must be positive"));
            }
            if let Some(f) = friction {
                if !(f.is_finite() && *f >= 0.0) {
                    return Err(invalid("body.friction", f, "must be non-negative"));
                }
            }
            Ok(1)
        }
        BodyDef::Dataset {
            path,
            mass,
            stiffness,
            friction,
            damping,
        } => {
            if path.trim().is_empty() {
                return Err(ValidationError::MissingReference {
                    id: path.clone(),
                    context: "body.path".to_string(),
                });
            }
            let ndof = validate_matrix("body.mass", mass, None, None)?;
            validate_matrix("body.stiffness", stiffness, Some(ndof), Some(ndof))?;
            if let Some(friction) = friction {
                validate_matrix("body.friction", friction, Some(ndof), Some(ndof))?;
            }
            if !(damping.tolerance.is_finite() && damping.tolerance >= 0.0) {
                return Err(invalid(
                    "body.damping.tolerance",
                    damping.tolerance,
                    "must be non-negative",
                ));
            }
            Ok(ndof)
        }
    }
}

fn validate_waves(case: &Case) -> Result<(), ValidationError> {
    let nfreq = case.grid.nfreq;
    match &case.waves {
        WavesDef::Still => Ok(()),
        WavesDef::Regular {
            frequency_hz,
            amplitude_m,
            ..
        } => {
            let k = frequency_hz / case.grid.f1_hz;
            if !(k.is_finite() && (k - k.round()).abs() < 1e-6 && k.round() >= 1.0)
                || k.round() as usize > nfreq
            {
                return Err(invalid(
                    "waves.frequency_hz",
                    frequency_hz,
                    "must be a positive multiple of grid.f1_hz within the grid",
                ));
            }
            if !(amplitude_m.is_finite() && *amplitude_m >= 0.0) {
                return Err(invalid("waves.amplitude_m", amplitude_m, "must be non-negative"));
            }
            Ok(())
        }
        WavesDef::Irregular {
            spectral_density,
            phases,
            ..
        } => {
            if spectral_density.len() != nfreq {
                return Err(invalid(
                    "waves.spectral_density",
                    spectral_density.len(),
                    "need one value per grid frequency",
                ));
            }
            if let Some(s) = spectral_density.iter().find(|s| !(s.is_finite() && **s >= 0.0)) {
                return Err(invalid("waves.spectral_density", s, "must be non-negative"));
            }
            if let PhasesDef::Specified(p) = phases {
                if p.len() != nfreq {
                    return Err(invalid(
                        "waves.phases",
                        p.len(),
                        "need one phase per grid frequency",
                    ));
                }
            }
            Ok(())
        }
    }
}

fn validate_design(case: &Case, strategy: &StrategyDef) -> Result<(), ValidationError> {
    let names = strategy.parameter_names();
    if names.is_empty() {
        return Err(invalid("design", 0, "needs at least one parameter"));
    }
    let mut seen = HashSet::new();
    for name in &names {
        if !seen.insert(*name) {
            return Err(ValidationError::DuplicateId {
                id: name.to_string(),
                context: "design parameters".to_string(),
            });
        }
        if !KNOWN_PARAMETERS.contains(name) {
            return Err(ValidationError::MissingReference {
                id: name.to_string(),
                context: "design parameters".to_string(),
            });
        }
        let applies = match *name {
            "body.radius_m" | "body.draft_m" => matches!(case.body, BodyDef::Cylinder { .. }),
            "pto.generator.gear_ratio" | "pto.generator.winding_resistance" => {
                case.pto.generator.is_some()
            }
            _ => true,
        };
        if !applies {
            return Err(ValidationError::MissingReference {
                id: name.to_string(),
                context: "design parameters (field absent from this case)".to_string(),
            });
        }
    }
    match strategy {
        StrategyDef::Grid { sweeps, threads } => {
            for sweep in sweeps {
                sweep
                    .validate()
                    .map_err(|e| invalid(&format!("design sweep '{}'", sweep.name), &sweep, &e.to_string()))?;
            }
            if *threads == Some(0) {
                return Err(invalid("design.threads", 0, "must be at least 1"));
            }
        }
        StrategyDef::NelderMead {
            initial, step, ..
        } => {
            if initial.len() != names.len() || step.len() != names.len() {
                return Err(invalid(
                    "design.initial/step",
                    format!("{}/{}", initial.len(), step.len()),
                    "need one value per parameter",
                ));
            }
        }
    }
    Ok(())
}

/// Row count of a rectangular matrix given as rows.
fn validate_matrix(
    field: &str,
    rows: &[Vec<f64>],
    nrows: Option<usize>,
    ncols: Option<usize>,
) -> Result<usize, ValidationError> {
    if rows.is_empty() {
        return Err(invalid(field, "[]", "must not be empty"));
    }
    let width = rows[0].len();
    if width == 0 || rows.iter().any(|r| r.len() != width) {
        return Err(invalid(field, format!("{rows:?}"), "rows must have equal, non-zero length"));
    }
    if nrows.is_some_and(|n| n != rows.len()) || ncols.is_some_and(|n| n != width) {
        return Err(invalid(
            field,
            format!("{}x{}", rows.len(), width),
            "inconsistent with the number of DOFs",
        ));
    }
    if nrows.is_none() && ncols.is_none() && rows.len() != width {
        return Err(invalid(field, format!("{}x{}", rows.len(), width), "must be square"));
    }
    if rows.iter().flatten().any(|v| !v.is_finite()) {
        return Err(invalid(field, format!("{rows:?}"), "entries must be finite"));
    }
    Ok(rows.len())
}
