//! Two-port impedance models of the energy conversion chain.
//!
//! Per frequency the port relation is
//!
//! ```text
//! ⎡ f ⎤   ⎡ Z11  Z12 ⎤ ⎡ v ⎤
//! ⎣ V ⎦ = ⎣ Z21  Z22 ⎦ ⎣ i ⎦
//! ```
//!
//! with mechanical force `f` and velocity `v` on the PTO DOFs, and
//! electrical voltage `V` and current `i`. It is stored in transmission
//! form, which gives the electrical port from the mechanical one.

use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use wo_hydro::FrequencyGrid;

use crate::error::{PtoError, PtoResult};

/// Transmission matrices for one frequency.
#[derive(Clone, Debug)]
pub(crate) struct Transmission {
    pub current_from_velocity: DMatrix<Complex64>,
    pub current_from_force: DMatrix<Complex64>,
    pub voltage_from_velocity: DMatrix<Complex64>,
    pub voltage_from_force: DMatrix<Complex64>,
}

/// Per-frequency `2npto × 2npto` impedance matrices on the positive
/// frequencies of a grid, plus the static relation at zero frequency.
#[derive(Clone, Debug)]
pub struct TwoPortImpedance {
    npto: usize,
    matrices: Vec<DMatrix<Complex64>>,
    transmission: Vec<Transmission>,
    /// Static `(i, V)` from force; velocity has no mean.
    dc_current_from_force: DMatrix<f64>,
    dc_voltage_from_force: DMatrix<f64>,
}

impl TwoPortImpedance {
    /// `dc` is the real `2npto × 2npto` static relation; when absent the real
    /// part of the first frequency's matrix is used.
    pub fn new(
        npto: usize,
        matrices: Vec<DMatrix<Complex64>>,
        dc: Option<DMatrix<f64>>,
    ) -> PtoResult<Self> {
        if npto == 0 || matrices.is_empty() {
            return Err(PtoError::InvalidArg {
                what: "impedance needs at least one PTO DOF and one frequency",
            });
        }
        let mut transmission = Vec::with_capacity(matrices.len());
        for (index, z) in matrices.iter().enumerate() {
            if z.shape() != (2 * npto, 2 * npto) {
                return Err(PtoError::DimensionMismatch {
                    what: "impedance matrix size",
                    expected: 2 * npto,
                    actual: z.nrows(),
                });
            }
            transmission.push(transmission_of(z, npto, index)?);
        }

        let dc = dc.unwrap_or_else(|| matrices[0].map(|z| z.re));
        if dc.shape() != (2 * npto, 2 * npto) {
            return Err(PtoError::DimensionMismatch {
                what: "static impedance matrix size",
                expected: 2 * npto,
                actual: dc.nrows(),
            });
        }
        let z12 = dc.view((0, npto), (npto, npto)).into_owned();
        let z22 = dc.view((npto, npto), (npto, npto)).into_owned();
        let dc_current_from_force = z12
            .try_inverse()
            .ok_or(PtoError::SingularImpedance { index: 0 })?;
        let dc_voltage_from_force = &z22 * &dc_current_from_force;

        Ok(Self {
            npto,
            matrices,
            transmission,
            dc_current_from_force,
            dc_voltage_from_force,
        })
    }

    pub fn npto(&self) -> usize {
        self.npto
    }

    pub fn nfreq(&self) -> usize {
        self.matrices.len()
    }

    pub fn matrices(&self) -> &[DMatrix<Complex64>] {
        &self.matrices
    }

    pub(crate) fn transmission(&self) -> &[Transmission] {
        &self.transmission
    }

    pub(crate) fn dc_current_from_force(&self) -> &DMatrix<f64> {
        &self.dc_current_from_force
    }

    pub(crate) fn dc_voltage_from_force(&self) -> &DMatrix<f64> {
        &self.dc_voltage_from_force
    }
}

fn transmission_of(z: &DMatrix<Complex64>, n: usize, index: usize) -> PtoResult<Transmission> {
    let z11 = z.view((0, 0), (n, n)).into_owned();
    let z12 = z.view((0, n), (n, n)).into_owned();
    let z21 = z.view((n, 0), (n, n)).into_owned();
    let z22 = z.view((n, n), (n, n)).into_owned();
    let z12_inv = z12
        .try_inverse()
        .ok_or(PtoError::SingularImpedance { index })?;
    // i = Z12⁻¹ (f − Z11 v),  V = Z21 v + Z22 i
    let current_from_velocity = -(&z12_inv * &z11);
    let voltage_from_velocity = &z21 + &z22 * &current_from_velocity;
    let voltage_from_force = &z22 * &z12_inv;
    Ok(Transmission {
        current_from_velocity,
        current_from_force: z12_inv,
        voltage_from_velocity,
        voltage_from_force,
    })
}

/// Rotary generator behind a gearbox driving a linear PTO DOF.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorDrivetrain {
    /// rad/m
    pub gear_ratio: f64,
    /// N·m/A
    pub torque_constant: f64,
    /// Ω
    pub winding_resistance: f64,
    /// H
    pub winding_inductance: f64,
    /// kg·m²
    pub drivetrain_inertia: f64,
    /// N·m·s/rad
    pub drivetrain_friction: f64,
    /// N·m/rad
    pub drivetrain_stiffness: f64,
}

impl Default for GeneratorDrivetrain {
    fn default() -> Self {
        Self {
            gear_ratio: 12.0,
            torque_constant: 6.7,
            winding_resistance: 0.5,
            winding_inductance: 0.0,
            drivetrain_inertia: 2.0,
            drivetrain_friction: 1.0,
            drivetrain_stiffness: 0.0,
        }
    }
}

impl GeneratorDrivetrain {
    /// Ideal lossless, massless conversion with the same electromechanical
    /// coupling.
    pub fn lossless(self) -> Self {
        Self {
            winding_resistance: 0.0,
            winding_inductance: 0.0,
            drivetrain_inertia: 0.0,
            drivetrain_friction: 0.0,
            drivetrain_stiffness: 0.0,
            ..self
        }
    }

    fn coupling(&self) -> f64 {
        -(1.5_f64).sqrt() * self.torque_constant * self.gear_ratio
    }

    /// 1-DOF two-port on the positive frequencies of `grid`.
    pub fn impedance(&self, grid: &FrequencyGrid) -> PtoResult<TwoPortImpedance> {
        if self.gear_ratio == 0.0 || self.torque_constant == 0.0 {
            return Err(PtoError::InvalidArg {
                what: "gear ratio and torque constant must be non-zero",
            });
        }
        let n2 = self.gear_ratio * self.gear_ratio;
        let coupling = Complex64::new(self.coupling(), 0.0);
        let matrices = grid
            .omega_positive()
            .into_iter()
            .map(|w| {
                let iw = Complex64::new(0.0, w);
                let drivetrain = iw * self.drivetrain_inertia
                    + self.drivetrain_friction
                    + self.drivetrain_stiffness / iw;
                let winding = Complex64::new(self.winding_resistance, w * self.winding_inductance);
                DMatrix::from_row_slice(2, 2, &[-drivetrain * n2, coupling, coupling, winding])
            })
            .collect();
        let dc = DMatrix::from_row_slice(
            2,
            2,
            &[
                -n2 * self.drivetrain_friction,
                self.coupling(),
                self.coupling(),
                self.winding_resistance,
            ],
        );
        TwoPortImpedance::new(1, matrices, Some(dc))
    }
}
