//! Invalid cases are rejected before any model is built.

use wo_app::{AppError, Case, ValidationError, validate_case};

const BASE: &str = r#"
version: 1
name: base
grid: { f1_hz: 0.1, nfreq: 5 }
body: { type: cylinder, radius_m: 0.88, draft_m: 0.53 }
waves: { type: regular, frequency_hz: 0.3, amplitude_m: 0.0625 }
"#;

fn case(extra: &str) -> Case {
    serde_yaml::from_str(&format!("{BASE}{extra}")).unwrap()
}

#[test]
fn minimal_case_is_valid_with_defaults() {
    let c = case("");
    validate_case(&c).unwrap();
    assert_eq!(c.constraints.nsubsteps, 4);
    assert_eq!(c.objective.nsubsteps, 1);
    assert_eq!(c.solver.max_iterations, 200);
}

#[test]
fn future_version_is_unsupported() {
    let mut c = case("");
    c.version = 99;
    assert_eq!(
        validate_case(&c),
        Err(ValidationError::UnsupportedVersion { version: 99 })
    );
}

#[test]
fn wave_frequency_must_be_on_grid() {
    let mut c = case("");
    c.waves = serde_yaml::from_str("{ type: regular, frequency_hz: 0.25, amplitude_m: 0.1 }").unwrap();
    assert!(matches!(
        validate_case(&c),
        Err(ValidationError::InvalidValue { field, .. }) if field == "waves.frequency_hz"
    ));
    c.waves = serde_yaml::from_str("{ type: regular, frequency_hz: 0.7, amplitude_m: 0.1 }").unwrap();
    assert!(validate_case(&c).is_err());
}

#[test]
fn irregular_spectrum_length_is_checked() {
    let mut c = case("");
    c.waves = serde_yaml::from_str("{ type: irregular, spectral_density: [0.1, 0.2] }").unwrap();
    assert!(matches!(
        validate_case(&c),
        Err(ValidationError::InvalidValue { field, .. }) if field == "waves.spectral_density"
    ));
}

#[test]
fn duplicate_force_names_are_rejected() {
    let c = case(
        r#"
forces:
  - { type: drag, name: drag, coefficients: [100.0] }
  - { type: drag, name: drag, coefficients: [200.0] }
"#,
    );
    assert!(matches!(
        validate_case(&c),
        Err(ValidationError::DuplicateId { id, .. }) if id == "drag"
    ));
}

#[test]
fn force_limit_must_be_positive() {
    let c = case("constraints: { force_limit_n: -5.0 }\n");
    assert!(validate_case(&c).is_err());
}

#[test]
fn generator_needs_single_pto_dof() {
    let c = case(
        r#"
pto:
  kinematics: [[1.0], [0.5]]
  generator: {}
"#,
    );
    assert!(matches!(
        validate_case(&c),
        Err(ValidationError::InvalidValue { field, .. }) if field == "pto.generator"
    ));
}

#[test]
fn unknown_design_parameter_is_a_missing_reference() {
    let c = case(
        r#"
design:
  strategy:
    type: grid
    sweeps: [{ name: body.mass, start: 1.0, end: 2.0, num_points: 2 }]
"#,
    );
    assert!(matches!(
        validate_case(&c),
        Err(ValidationError::MissingReference { id, .. }) if id == "body.mass"
    ));
}

#[test]
fn generator_parameter_needs_generator() {
    let c = case(
        r#"
design:
  strategy:
    type: nelder_mead
    parameters: [pto.generator.gear_ratio]
    initial: [12.0]
    step: [1.0]
"#,
    );
    assert!(matches!(
        validate_case(&c),
        Err(ValidationError::MissingReference { .. })
    ));
}

#[test]
fn validation_error_converts_to_app_error() {
    let mut c = case("");
    c.grid.nfreq = 0;
    let err: AppError = validate_case(&c).unwrap_err().into();
    assert!(err.to_string().contains("grid.nfreq"));
}
