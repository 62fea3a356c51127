//! Self-describing hydrodynamic coefficient files.
//!
//! Arrays are nested lists indexed `[frequency][dof][dof]` for radiation
//! terms and `[frequency][dof][direction]` for excitation, with the
//! coordinate values stored alongside:
//!
//! ```yaml
//! omega: [0.314, 0.628]
//! dofs: [Heave]
//! directions: [0.0]
//! added_mass: [[[2200.0]], [[2150.0]]]
//! radiation_damping: [[[5.0]], [[40.0]]]
//! excitation:
//!   magnitude: [[[24000.0]], [[23500.0]]]
//!   phase: [[[0.0]], [[-0.01]]]
//! ```

use std::path::Path;

use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HydroError, HydroResult};
use crate::HydrodynamicCoefficients;

type Array3 = Vec<Vec<Vec<f64>>>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HydroDataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Angular frequencies, rad/s.
    pub omega: Vec<f64>,
    pub dofs: Vec<String>,
    /// Wave headings, rad.
    pub directions: Vec<f64>,
    pub added_mass: Array3,
    pub radiation_damping: Array3,
    pub excitation: ExcitationData,
}

/// Excitation coefficients, either Cartesian or polar.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ExcitationData {
    Complex { re: Array3, im: Array3 },
    Polar { magnitude: Array3, phase: Array3 },
}

impl HydroDataset {
    pub fn load(path: &Path) -> HydroResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let dataset: Self = match extension(path).as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            other => {
                return Err(HydroError::UnsupportedFormat {
                    extension: other.to_string(),
                });
            }
        };
        debug!(
            path = %path.display(),
            nfreq = dataset.omega.len(),
            ndof = dataset.dofs.len(),
            "loaded hydrodynamic dataset"
        );
        Ok(dataset)
    }

    pub fn save(&self, path: &Path) -> HydroResult<()> {
        let content = match extension(path).as_str() {
            "yaml" | "yml" => serde_yaml::to_string(self)?,
            "json" => serde_json::to_string_pretty(self)?,
            other => {
                return Err(HydroError::UnsupportedFormat {
                    extension: other.to_string(),
                });
            }
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts nested arrays into validated coefficient matrices.
    pub fn to_coefficients(&self) -> HydroResult<HydrodynamicCoefficients> {
        let (ndof, ndir) = (self.dofs.len(), self.directions.len());
        let added_mass = to_matrices("added mass", &self.added_mass, ndof, ndof)?;
        let radiation_damping =
            to_matrices("radiation damping", &self.radiation_damping, ndof, ndof)?;
        let excitation = match &self.excitation {
            ExcitationData::Complex { re, im } => {
                let re = to_matrices("excitation (re)", re, ndof, ndir)?;
                let im = to_matrices("excitation (im)", im, ndof, ndir)?;
                check_len("excitation (im)", re.len(), im.len())?;
                re.iter()
                    .zip(&im)
                    .map(|(r, i)| r.zip_map(i, Complex64::new))
                    .collect()
            }
            ExcitationData::Polar { magnitude, phase } => {
                let mag = to_matrices("excitation (magnitude)", magnitude, ndof, ndir)?;
                let ph = to_matrices("excitation (phase)", phase, ndof, ndir)?;
                check_len("excitation (phase)", mag.len(), ph.len())?;
                mag.iter()
                    .zip(&ph)
                    .map(|(m, p)| m.zip_map(p, Complex64::from_polar))
                    .collect()
            }
        };
        HydrodynamicCoefficients::new(
            self.dofs.clone(),
            self.directions.clone(),
            self.omega.clone(),
            added_mass,
            radiation_damping,
            excitation,
        )
    }

    pub fn from_coefficients(coeffs: &HydrodynamicCoefficients) -> Self {
        let nested = |ms: &[DMatrix<f64>]| -> Array3 { ms.iter().map(to_nested).collect() };
        let re: Vec<DMatrix<f64>> = coeffs.excitation.iter().map(|m| m.map(|c| c.re)).collect();
        let im: Vec<DMatrix<f64>> = coeffs.excitation.iter().map(|m| m.map(|c| c.im)).collect();
        Self {
            description: None,
            omega: coeffs.omega.clone(),
            dofs: coeffs.dof_names.clone(),
            directions: coeffs.directions.clone(),
            added_mass: nested(&coeffs.added_mass),
            radiation_damping: nested(&coeffs.radiation_damping),
            excitation: ExcitationData::Complex {
                re: nested(&re),
                im: nested(&im),
            },
        }
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> HydroResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(HydroError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}

fn to_matrices(
    what: &'static str,
    data: &Array3,
    rows: usize,
    cols: usize,
) -> HydroResult<Vec<DMatrix<f64>>> {
    data.iter()
        .map(|m| {
            check_len(what, rows, m.len())?;
            for row in m {
                check_len(what, cols, row.len())?;
            }
            Ok(DMatrix::from_fn(rows, cols, |r, c| m[r][c]))
        })
        .collect()
}

fn to_nested(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    (0..m.nrows())
        .map(|r| (0..m.ncols()).map(|c| m[(r, c)]).collect())
        .collect()
}
