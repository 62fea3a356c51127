//! Intrinsic impedance and the real-valued linear operator on the basis.

use nalgebra::DMatrix;
use num_complex::Complex64;
use wo_hydro::{DampingViolation, FrequencyGrid, HydrodynamicCoefficients};

use crate::error::{DynamicsError, DynamicsResult};

/// What to do with diagonal radiation damping entries below `-tolerance`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DampingAction {
    /// Log a warning and keep the data as given.
    Warn,
    /// Log a warning and raise offending entries to `minimum`.
    Clip { minimum: f64 },
    /// Fail construction with `NonPositiveDamping`.
    Reject,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DampingPolicy {
    pub tolerance: f64,
    pub action: DampingAction,
}

impl Default for DampingPolicy {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            action: DampingAction::Warn,
        }
    }
}

impl DampingPolicy {
    pub fn clip(minimum: f64) -> Self {
        Self {
            action: DampingAction::Clip { minimum },
            ..Self::default()
        }
    }

    pub fn reject() -> Self {
        Self {
            action: DampingAction::Reject,
            ..Self::default()
        }
    }
}

/// Outcome of the damping check recorded on a model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DampingReport {
    pub violations: Vec<DampingViolation>,
    /// Entries raised by clipping (zero unless the policy clips).
    pub clipped: usize,
}

impl DampingReport {
    /// True when the residual uses negative damping values.
    pub fn propagated(&self) -> bool {
        !self.violations.is_empty() && self.clipped == 0
    }
}

/// Applies `policy` to `coeffs` in place.
pub fn apply_damping_policy(
    coeffs: &mut HydrodynamicCoefficients,
    policy: &DampingPolicy,
) -> DynamicsResult<DampingReport> {
    let violations = coeffs.damping_violations(policy.tolerance);
    if violations.is_empty() {
        return Ok(DampingReport::default());
    }
    let worst = violations
        .iter()
        .min_by(|a, b| a.value.total_cmp(&b.value))
        .cloned()
        .unwrap_or_else(|| violations[0].clone());
    match policy.action {
        DampingAction::Reject => Err(DynamicsError::NonPositiveDamping {
            count: violations.len(),
            value: worst.value,
            omega: worst.omega,
            dof: worst.dof,
        }),
        DampingAction::Warn => {
            tracing::warn!(
                count = violations.len(),
                worst = worst.value,
                omega = worst.omega,
                dof = worst.dof,
                "negative radiation damping kept in model"
            );
            Ok(DampingReport {
                violations,
                clipped: 0,
            })
        }
        DampingAction::Clip { minimum } => {
            let clipped = coeffs.clip_damping(minimum);
            tracing::warn!(
                count = violations.len(),
                worst = worst.value,
                minimum,
                clipped,
                "negative radiation damping clipped"
            );
            Ok(DampingReport {
                violations,
                clipped,
            })
        }
    }
}

/// `Z(ω) = iω(M + A) + B + C_f + K/(iω)` at one positive frequency.
///
/// Friction enters as a linear damping force `−C_f v`.
pub fn intrinsic_impedance(
    omega: f64,
    mass: &DMatrix<f64>,
    added_mass: &DMatrix<f64>,
    radiation_damping: &DMatrix<f64>,
    stiffness: &DMatrix<f64>,
    friction: &DMatrix<f64>,
) -> DMatrix<Complex64> {
    let n = mass.nrows();
    DMatrix::from_fn(n, n, |i, j| {
        let inertia = mass[(i, j)] + added_mass[(i, j)];
        let resistance = radiation_damping[(i, j)] + friction[(i, j)];
        Complex64::new(resistance, omega * inertia - stiffness[(i, j)] / omega)
    })
}

/// Real operator acting on DOF-major coefficient vectors.
///
/// Position amplitudes map to force amplitudes through `G(ω) = iω Z(ω)`; with
/// `X = a − i b` each frequency contributes the 2×2 block
/// `[[Re G, Im G], [−Im G, Re G]]`. The mean component sees the stiffness.
pub fn linear_operator(
    grid: &FrequencyGrid,
    impedance: &[DMatrix<Complex64>],
    stiffness: &DMatrix<f64>,
) -> DMatrix<f64> {
    let ndof = stiffness.nrows();
    let nc = grid.ncomponents();
    let omega = grid.omega_positive();
    let mut op = DMatrix::zeros(ndof * nc, ndof * nc);
    for i in 0..ndof {
        for j in 0..ndof {
            op[(i * nc, j * nc)] = stiffness[(i, j)];
            for (k, (&w, z)) in omega.iter().zip(impedance).enumerate() {
                let g = Complex64::new(0.0, w) * z[(i, j)];
                let (ra, ca) = (i * nc + 1 + 2 * k, j * nc + 1 + 2 * k);
                op[(ra, ca)] = g.re;
                op[(ra, ca + 1)] = g.im;
                op[(ra + 1, ca)] = -g.im;
                op[(ra + 1, ca + 1)] = g.re;
            }
        }
    }
    op
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(v: f64) -> DMatrix<f64> {
        DMatrix::from_element(1, 1, v)
    }

    #[test]
    fn impedance_of_mass_spring_damper() {
        let z = intrinsic_impedance(2.0, &scalar(3.0), &scalar(1.0), &scalar(0.5), &scalar(8.0), &scalar(0.25));
        assert!((z[(0, 0)].re - 0.75).abs() < 1e-15);
        // 2·4 − 8/2
        assert!((z[(0, 0)].im - 4.0).abs() < 1e-15);
    }

    #[test]
    fn operator_blocks_match_complex_product() {
        let grid = FrequencyGrid::new(0.1, 2, false).unwrap();
        let w = grid.omega_positive();
        let imp: Vec<_> = w
            .iter()
            .map(|&wk| intrinsic_impedance(wk, &scalar(2.0), &scalar(0.5), &scalar(0.3), &scalar(5.0), &scalar(0.0)))
            .collect();
        let op = linear_operator(&grid, &imp, &scalar(5.0));
        let x = Complex64::new(0.7, -0.2); // a = 0.7, b = 0.2
        let f = Complex64::new(0.0, w[1]) * imp[1][(0, 0)] * x;
        let coeffs = nalgebra::DVector::from_vec(vec![0.0, 0.0, 0.0, 0.7, 0.2]);
        let out = &op * coeffs;
        assert!((out[3] - f.re).abs() < 1e-12);
        assert!((out[4] + f.im).abs() < 1e-12);
        assert_eq!(op[(0, 0)], 5.0);
    }
}
