//! Analytic heaving cylinder.
//!
//! Long-wave approximations for a floating vertical cylinder in deep water:
//! hydrostatic stiffness from the waterplane area, Froude–Krylov excitation
//! with exponential depth decay, a constant (hemisphere) added mass and
//! radiation damping tied to the excitation through the Haskind relation.
//! Useful wherever a geometry parameter must map to coefficients without a
//! boundary-element run.

use std::f64::consts::PI;

use nalgebra::DMatrix;
use num_complex::Complex64;
use uom::si::acceleration::meter_per_second_squared;
use uom::si::length::meter;
use uom::si::mass_density::kilogram_per_cubic_meter;
use wo_core::units::constants;
use wo_core::{Density, Length, ensure_positive};

use crate::error::HydroResult;
use crate::{FrequencyGrid, HydrodynamicCoefficients};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeavingCylinder {
    radius: f64,
    draft: f64,
    density: f64,
    gravity: f64,
}

impl HeavingCylinder {
    pub fn new(radius: Length, draft: Length) -> HydroResult<Self> {
        Ok(Self {
            radius: ensure_positive(radius.get::<meter>(), "cylinder radius")?,
            draft: ensure_positive(draft.get::<meter>(), "cylinder draft")?,
            density: constants::SEAWATER_DENSITY_KGPM3,
            gravity: constants::g0().get::<meter_per_second_squared>(),
        })
    }

    pub fn with_density(mut self, density: Density) -> HydroResult<Self> {
        self.density = ensure_positive(density.get::<kilogram_per_cubic_meter>(), "water density")?;
        Ok(self)
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn draft(&self) -> f64 {
        self.draft
    }

    pub fn waterplane_area(&self) -> f64 {
        PI * self.radius * self.radius
    }

    /// Displaced mass, kg (freely floating).
    pub fn mass(&self) -> DMatrix<f64> {
        DMatrix::from_element(1, 1, self.density * self.waterplane_area() * self.draft)
    }

    /// Hydrostatic heave stiffness, N/m.
    pub fn stiffness(&self) -> DMatrix<f64> {
        DMatrix::from_element(1, 1, self.density * self.gravity * self.waterplane_area())
    }

    pub fn added_mass(&self) -> f64 {
        PI * self.density * self.radius.powi(3) / 3.0
    }

    /// Heave excitation coefficient per unit wave amplitude, N/m.
    pub fn excitation(&self, omega: f64) -> Complex64 {
        let k = omega * omega / self.gravity;
        Complex64::new(
            self.density * self.gravity * self.waterplane_area() * (-k * self.draft).exp(),
            0.0,
        )
    }

    /// Heave radiation damping, N·s/m.
    pub fn radiation_damping(&self, omega: f64) -> f64 {
        let x = self.excitation(omega).norm();
        omega.powi(3) * x * x / (2.0 * self.density * self.gravity.powi(3))
    }

    /// Coefficients tabulated on `grid`, single heave DOF, heading 0.
    pub fn coefficients(&self, grid: &FrequencyGrid) -> HydroResult<HydrodynamicCoefficients> {
        let omega = grid.omega();
        let one = |v: f64| DMatrix::from_element(1, 1, v);
        HydrodynamicCoefficients::new(
            vec!["Heave".to_string()],
            vec![0.0],
            omega.clone(),
            omega.iter().map(|_| one(self.added_mass())).collect(),
            omega.iter().map(|w| one(self.radiation_damping(*w))).collect(),
            omega
                .iter()
                .map(|w| DMatrix::from_element(1, 1, self.excitation(*w)))
                .collect(),
        )
    }
}
