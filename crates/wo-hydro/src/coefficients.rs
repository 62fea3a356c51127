//! In-memory hydrodynamic coefficients.

use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::error::{HydroError, HydroResult};
use crate::FrequencyGrid;

/// Added mass, radiation damping and excitation per tabulated frequency.
///
/// Radiation matrices are `ndof × ndof`; excitation matrices are
/// `ndof × ndirections`. Frequencies are in rad/s.
#[derive(Clone, Debug)]
pub struct HydrodynamicCoefficients {
    pub dof_names: Vec<String>,
    pub directions: Vec<f64>,
    pub omega: Vec<f64>,
    pub added_mass: Vec<DMatrix<f64>>,
    pub radiation_damping: Vec<DMatrix<f64>>,
    pub excitation: Vec<DMatrix<Complex64>>,
}

/// A radiation damping entry below the allowed tolerance.
#[derive(Clone, Debug, PartialEq)]
pub struct DampingViolation {
    pub frequency_index: usize,
    pub omega: f64,
    pub dof: usize,
    pub value: f64,
}

impl HydrodynamicCoefficients {
    pub fn new(
        dof_names: Vec<String>,
        directions: Vec<f64>,
        omega: Vec<f64>,
        added_mass: Vec<DMatrix<f64>>,
        radiation_damping: Vec<DMatrix<f64>>,
        excitation: Vec<DMatrix<Complex64>>,
    ) -> HydroResult<Self> {
        let coeffs = Self {
            dof_names,
            directions,
            omega,
            added_mass,
            radiation_damping,
            excitation,
        };
        coeffs.validate()?;
        Ok(coeffs)
    }

    pub fn ndof(&self) -> usize {
        self.dof_names.len()
    }

    pub fn nfreq(&self) -> usize {
        self.omega.len()
    }

    pub fn ndir(&self) -> usize {
        self.directions.len()
    }

    /// Checks every array against the DOF, frequency and direction counts.
    pub fn validate(&self) -> HydroResult<()> {
        let (ndof, nf, ndir) = (self.ndof(), self.nfreq(), self.ndir());
        if ndof == 0 {
            return Err(HydroError::InvalidArg {
                what: "at least one degree of freedom is required",
            });
        }
        if ndir == 0 {
            return Err(HydroError::InvalidArg {
                what: "at least one wave direction is required",
            });
        }
        for (what, len) in [
            ("added mass frequency count", self.added_mass.len()),
            ("radiation damping frequency count", self.radiation_damping.len()),
            ("excitation frequency count", self.excitation.len()),
        ] {
            if len != nf {
                return Err(HydroError::DimensionMismatch {
                    what,
                    expected: nf,
                    actual: len,
                });
            }
        }
        for k in 0..nf {
            check_shape("added mass", &self.added_mass[k], ndof, ndof)?;
            check_shape("radiation damping", &self.radiation_damping[k], ndof, ndof)?;
            check_shape("excitation", &self.excitation[k], ndof, ndir)?;
        }
        if self.omega.windows(2).any(|w| w[1] <= w[0]) {
            return Err(HydroError::InvalidArg {
                what: "frequencies must be strictly increasing",
            });
        }
        Ok(())
    }

    /// Confirms the tabulated frequencies match `grid`.
    pub fn check_grid(&self, grid: &FrequencyGrid) -> HydroResult<()> {
        let expected = grid.omega();
        if expected.len() != self.nfreq() {
            return Err(HydroError::DimensionMismatch {
                what: "tabulated frequencies vs grid",
                expected: expected.len(),
                actual: self.nfreq(),
            });
        }
        let tol = 1e-6 * grid.delta_omega();
        if expected
            .iter()
            .zip(&self.omega)
            .any(|(a, b)| (a - b).abs() > tol)
        {
            return Err(HydroError::InvalidArg {
                what: "tabulated frequencies do not match the frequency grid",
            });
        }
        Ok(())
    }

    /// Index of `direction` (rad) in the excitation data.
    pub fn direction_index(&self, direction: f64) -> HydroResult<usize> {
        self.directions
            .iter()
            .position(|d| angle_distance(*d, direction) < 1e-6)
            .ok_or(HydroError::UnknownDirection {
                direction_rad: direction,
            })
    }

    /// Diagonal radiation damping entries below `-tolerance`.
    ///
    /// Off-diagonal coupling terms may legitimately be negative and are not
    /// inspected.
    pub fn damping_violations(&self, tolerance: f64) -> Vec<DampingViolation> {
        let mut out = Vec::new();
        for (k, b) in self.radiation_damping.iter().enumerate() {
            for dof in 0..self.ndof() {
                let value = b[(dof, dof)];
                if value < -tolerance {
                    out.push(DampingViolation {
                        frequency_index: k,
                        omega: self.omega[k],
                        dof,
                        value,
                    });
                }
            }
        }
        out
    }

    /// Raises every diagonal damping entry below `minimum` to `minimum`.
    pub fn clip_damping(&mut self, minimum: f64) -> usize {
        let mut clipped = 0;
        let ndof = self.ndof();
        for b in &mut self.radiation_damping {
            for dof in 0..ndof {
                if b[(dof, dof)] < minimum {
                    b[(dof, dof)] = minimum;
                    clipped += 1;
                }
            }
        }
        clipped
    }
}

fn check_shape<T>(
    what: &'static str,
    m: &DMatrix<T>,
    rows: usize,
    cols: usize,
) -> HydroResult<()> {
    if m.nrows() != rows {
        return Err(HydroError::DimensionMismatch {
            what,
            expected: rows,
            actual: m.nrows(),
        });
    }
    if m.ncols() != cols {
        return Err(HydroError::DimensionMismatch {
            what,
            expected: cols,
            actual: m.ncols(),
        });
    }
    Ok(())
}

fn angle_distance(a: f64, b: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let d = (a - b).rem_euclid(two_pi);
    d.min(two_pi - d)
}
