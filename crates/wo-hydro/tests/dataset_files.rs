//! Dataset save/load through the filesystem.

use wo_core::m;
use wo_hydro::{FrequencyGrid, HeavingCylinder, HydroDataset};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("wo_hydro_{}_{name}", std::process::id()))
}

#[test]
fn cylinder_coefficients_survive_yaml_and_json_files() {
    let grid = FrequencyGrid::new(0.1, 8, false).unwrap();
    let coeffs = HeavingCylinder::new(m(0.88), m(0.53))
        .unwrap()
        .coefficients(&grid)
        .unwrap();
    let ds = HydroDataset::from_coefficients(&coeffs);

    for name in ["cyl.yaml", "cyl.json"] {
        let path = temp_path(name);
        ds.save(&path).unwrap();
        let loaded = HydroDataset::load(&path).unwrap().to_coefficients().unwrap();
        std::fs::remove_file(&path).ok();

        loaded.check_grid(&grid).unwrap();
        for k in 0..grid.nfreq() {
            let db = loaded.radiation_damping[k][(0, 0)] - coeffs.radiation_damping[k][(0, 0)];
            let dx = loaded.excitation[k][(0, 0)] - coeffs.excitation[k][(0, 0)];
            assert!(db.abs() < 1e-9, "{name}: damping at {k}");
            assert!(dx.norm() < 1e-9, "{name}: excitation at {k}");
        }
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let err = HydroDataset::load(&temp_path("missing.yaml")).unwrap_err();
    assert!(matches!(err, wo_hydro::HydroError::Io(_)));
}
