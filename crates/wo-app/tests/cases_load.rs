//! Shipped case files load, validate and survive a save/load cycle.

use std::path::PathBuf;

use wo_app::{BodyDef, StrategyDef, load_case, save_case};

fn cases_dir() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates
    dir.pop(); // repo root
    dir.push("cases");
    dir
}

#[test]
fn shipped_cases_load_and_validate() {
    for name in [
        "wavebot_regular.yaml",
        "cylinder_dataset.yaml",
        "cylinder_radius_sweep.yaml",
    ] {
        let path = cases_dir().join(name);
        let case = load_case(&path).unwrap_or_else(|e| panic!("Failed to load {name}: {e}"));
        assert_eq!(case.version, 1);
    }
}

#[test]
fn sweep_case_reads_design_section() {
    let case = load_case(&cases_dir().join("cylinder_radius_sweep.yaml")).unwrap();
    let design = case.design.expect("design section");
    match design.strategy {
        StrategyDef::Grid { sweeps, threads } => {
            assert_eq!(sweeps[0].name, "body.radius_m");
            assert_eq!(threads, Some(2));
        }
        other => panic!("unexpected strategy {other:?}"),
    }
    assert_eq!(design.failure, wo_design::FailurePolicy::Marker);
}

#[test]
fn case_round_trips_through_json_and_yaml() {
    let case = load_case(&cases_dir().join("wavebot_regular.yaml")).unwrap();
    let dir = std::env::temp_dir().join(format!("wo_app_roundtrip_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    for name in ["case.json", "case.yaml"] {
        let path = dir.join(name);
        save_case(&path, &case).unwrap();
        let back = load_case(&path).unwrap();
        assert_eq!(back, case);
    }
    assert!(matches!(case.body, BodyDef::Cylinder { .. }));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_case_file_reports_path() {
    let path = cases_dir().join("does_not_exist.yaml");
    let err = load_case(&path).unwrap_err();
    assert!(err.to_string().contains("does_not_exist.yaml"));
}
