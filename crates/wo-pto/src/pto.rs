//! PTO quantities and the force, constraint and objective capabilities they
//! provide to a control problem.
//!
//! Every quantity is generic over [`Scalar`], so the same code yields values
//! for post-processing and exact derivatives inside the solver. Time series
//! are sampled on the grid of the [`StateArgs`] they are evaluated with.

use std::sync::Arc;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use wo_core::Scalar;
use wo_dynamics::{
    AdditionalForce, Constraint, ConstraintFn, DynamicsError, DynamicsResult, ForceFn, Objective,
    ObjectiveFn, StateArgs, TimeSeries,
};
use wo_hydro::FrequencyGrid;

use crate::controller::{Controller, PtoMotion};
use crate::error::{PtoError, PtoResult};
use crate::impedance::TwoPortImpedance;
use crate::kinematics::Kinematics;

/// Which port an average power objective is measured on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerKind {
    Mechanical,
    #[default]
    Electrical,
}

#[derive(Clone, Debug)]
pub struct Pto {
    names: Vec<String>,
    kinematics: Kinematics,
    controller: Controller,
    impedance: Option<TwoPortImpedance>,
}

impl Pto {
    pub fn new(kinematics: Kinematics, controller: Controller) -> Self {
        let names = (0..kinematics.npto()).map(|p| format!("PTO_{p}")).collect();
        Self {
            names,
            kinematics,
            controller,
            impedance: None,
        }
    }

    pub fn with_names(mut self, names: Vec<String>) -> PtoResult<Self> {
        if names.len() != self.npto() {
            return Err(PtoError::DimensionMismatch {
                what: "PTO names",
                expected: self.npto(),
                actual: names.len(),
            });
        }
        self.names = names;
        Ok(self)
    }

    pub fn with_impedance(mut self, impedance: TwoPortImpedance) -> PtoResult<Self> {
        if impedance.npto() != self.npto() {
            return Err(PtoError::DimensionMismatch {
                what: "impedance PTO DOFs",
                expected: self.npto(),
                actual: impedance.npto(),
            });
        }
        self.impedance = Some(impedance);
        Ok(self)
    }

    pub fn npto(&self) -> usize {
        self.kinematics.npto()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn controller(&self) -> Controller {
        self.controller
    }

    pub fn impedance(&self) -> Option<&TwoPortImpedance> {
        self.impedance.as_ref()
    }

    /// Length of the control state `x_opt` on `grid`.
    pub fn nstate(&self, grid: &FrequencyGrid) -> usize {
        self.controller.nstate(self.npto(), grid.ncomponents())
    }

    fn check<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<()> {
        if self.kinematics.ndof() != args.ndof() {
            return Err(DynamicsError::DimensionMismatch {
                what: "PTO kinematics WEC DOFs",
                expected: args.ndof(),
                actual: self.kinematics.ndof(),
            });
        }
        if let Some(z) = &self.impedance {
            let nfreq = args.wec.grid().nfreq();
            if z.nfreq() != nfreq {
                return Err(DynamicsError::DimensionMismatch {
                    what: "PTO impedance frequencies",
                    expected: nfreq,
                    actual: z.nfreq(),
                });
            }
        }
        Ok(())
    }

    // Coefficient space: blocks `[pto][component]`.

    pub fn position_coefficients<D: Scalar>(
        &self,
        args: &StateArgs<'_, D>,
    ) -> DynamicsResult<Vec<Vec<D>>> {
        self.check(args)?;
        Ok(self.kinematics.to_pto(args.x_wec, args.wec.ncomponents()))
    }

    pub fn velocity_coefficients<D: Scalar>(
        &self,
        args: &StateArgs<'_, D>,
    ) -> DynamicsResult<Vec<Vec<D>>> {
        let grid = args.wec.grid();
        Ok(self
            .position_coefficients(args)?
            .iter()
            .map(|x| derivative(grid, x))
            .collect())
    }

    pub fn acceleration_coefficients<D: Scalar>(
        &self,
        args: &StateArgs<'_, D>,
    ) -> DynamicsResult<Vec<Vec<D>>> {
        let grid = args.wec.grid();
        Ok(self
            .velocity_coefficients(args)?
            .iter()
            .map(|v| derivative(grid, v))
            .collect())
    }

    pub fn force_coefficients<D: Scalar>(
        &self,
        args: &StateArgs<'_, D>,
    ) -> DynamicsResult<Vec<Vec<D>>> {
        let position = self.position_coefficients(args)?;
        let grid = args.wec.grid();
        let velocity: Vec<Vec<D>> = position.iter().map(|x| derivative(grid, x)).collect();
        let acceleration: Vec<Vec<D>> = velocity.iter().map(|v| derivative(grid, v)).collect();
        self.controller.force_coefficients(
            &PtoMotion {
                position: &position,
                velocity: &velocity,
                acceleration: &acceleration,
            },
            args.x_opt,
        )
    }

    /// Electrical `(current, voltage)` coefficient blocks.
    pub fn electrical_coefficients<D: Scalar>(
        &self,
        args: &StateArgs<'_, D>,
    ) -> DynamicsResult<(Vec<Vec<D>>, Vec<Vec<D>>)> {
        let z = self.impedance.as_ref().ok_or(DynamicsError::InvalidArg {
            what: "PTO has no impedance model",
        })?;
        let velocity = self.velocity_coefficients(args)?;
        let force = self.force_coefficients(args)?;
        let npto = self.npto();
        let nc = args.wec.ncomponents();
        let mut current = vec![vec![D::from(0.0); nc]; npto];
        let mut voltage = vec![vec![D::from(0.0); nc]; npto];

        for q in 0..npto {
            for p in 0..npto {
                current[q][0] += force[p][0] * z.dc_current_from_force()[(q, p)];
                voltage[q][0] += force[p][0] * z.dc_voltage_from_force()[(q, p)];
            }
        }
        for (k, t) in z.transmission().iter().enumerate() {
            for q in 0..npto {
                let mut i = (D::from(0.0), D::from(0.0));
                let mut u = (D::from(0.0), D::from(0.0));
                for p in 0..npto {
                    let v = amplitude(&velocity[p], k);
                    let f = amplitude(&force[p], k);
                    accumulate(&mut i, t.current_from_velocity[(q, p)], v);
                    accumulate(&mut i, t.current_from_force[(q, p)], f);
                    accumulate(&mut u, t.voltage_from_velocity[(q, p)], v);
                    accumulate(&mut u, t.voltage_from_force[(q, p)], f);
                }
                set_amplitude(&mut current[q], k, i);
                set_amplitude(&mut voltage[q], k, u);
            }
        }
        Ok((current, voltage))
    }

    // Time domain on the grid of `args`.

    fn synthesize<D: Scalar>(args: &StateArgs<'_, D>, blocks: &[Vec<D>]) -> TimeSeries<D> {
        blocks.iter().map(|b| args.synthesize(b)).collect()
    }

    pub fn position<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<TimeSeries<D>> {
        Ok(Self::synthesize(args, &self.position_coefficients(args)?))
    }

    pub fn velocity<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<TimeSeries<D>> {
        Ok(Self::synthesize(args, &self.velocity_coefficients(args)?))
    }

    pub fn acceleration<D: Scalar>(
        &self,
        args: &StateArgs<'_, D>,
    ) -> DynamicsResult<TimeSeries<D>> {
        Ok(Self::synthesize(args, &self.acceleration_coefficients(args)?))
    }

    /// Force on the PTO DOFs.
    pub fn force<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<TimeSeries<D>> {
        Ok(Self::synthesize(args, &self.force_coefficients(args)?))
    }

    /// Force on the WEC DOFs.
    pub fn force_on_wec<D: Scalar>(
        &self,
        args: &StateArgs<'_, D>,
    ) -> DynamicsResult<TimeSeries<D>> {
        Ok(self.kinematics.to_wec(&self.force(args)?))
    }

    pub fn current<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<TimeSeries<D>> {
        let (current, _) = self.electrical_coefficients(args)?;
        Ok(Self::synthesize(args, &current))
    }

    pub fn voltage<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<TimeSeries<D>> {
        let (_, voltage) = self.electrical_coefficients(args)?;
        Ok(Self::synthesize(args, &voltage))
    }

    /// Instantaneous `f · v` per PTO DOF.
    pub fn mechanical_power<D: Scalar>(
        &self,
        args: &StateArgs<'_, D>,
    ) -> DynamicsResult<TimeSeries<D>> {
        Ok(product(&self.force(args)?, &self.velocity(args)?))
    }

    /// Instantaneous `i · V` per PTO DOF; equal to the mechanical power when
    /// no impedance model is attached.
    pub fn electrical_power<D: Scalar>(
        &self,
        args: &StateArgs<'_, D>,
    ) -> DynamicsResult<TimeSeries<D>> {
        if self.impedance.is_none() {
            return self.mechanical_power(args);
        }
        let (current, voltage) = self.electrical_coefficients(args)?;
        Ok(product(
            &Self::synthesize(args, &current),
            &Self::synthesize(args, &voltage),
        ))
    }

    pub fn power<D: Scalar>(
        &self,
        args: &StateArgs<'_, D>,
        kind: PowerKind,
    ) -> DynamicsResult<TimeSeries<D>> {
        match kind {
            PowerKind::Mechanical => self.mechanical_power(args),
            PowerKind::Electrical => self.electrical_power(args),
        }
    }

    /// Time-averaged power summed over PTO DOFs.
    pub fn average_power<D: Scalar>(
        &self,
        args: &StateArgs<'_, D>,
        kind: PowerKind,
    ) -> DynamicsResult<D> {
        let mut total = D::from(0.0);
        for series in self.power(args, kind)? {
            let n = series.len().max(1) as f64;
            let mut sum = D::from(0.0);
            for p in series {
                sum += p;
            }
            total += sum / n;
        }
        Ok(total)
    }

    /// Energy over one repeat period.
    pub fn energy<D: Scalar>(&self, args: &StateArgs<'_, D>, kind: PowerKind) -> DynamicsResult<D> {
        Ok(self.average_power(args, kind)? * args.wec.grid().period())
    }

    // Capabilities.

    /// The PTO force as an additional force on the WEC.
    pub fn force_on_wec_force(&self) -> AdditionalForce {
        AdditionalForce::new(PtoForce {
            pto: Arc::new(self.clone()),
        })
    }

    /// `|f| ≤ max` on every PTO DOF, sampled at `nsubsteps`.
    pub fn force_limit(&self, max: f64, nsubsteps: usize) -> PtoResult<Constraint> {
        if !(max.is_finite() && max > 0.0) {
            return Err(PtoError::InvalidArg {
                what: "force limit must be positive",
            });
        }
        Ok(Constraint::inequality(
            "pto force limit",
            nsubsteps,
            ForceLimit {
                pto: Arc::new(self.clone()),
                max,
            },
        ))
    }

    /// Average power to minimize, evaluated at `nsubsteps`.
    pub fn average_power_objective(&self, kind: PowerKind, nsubsteps: usize) -> Objective {
        let name = match kind {
            PowerKind::Mechanical => "average mechanical power",
            PowerKind::Electrical => "average electrical power",
        };
        Objective::new(
            name,
            AveragePower {
                pto: Arc::new(self.clone()),
                kind,
            },
        )
        .with_nsubsteps(nsubsteps)
    }
}

/// [`Pto::force_on_wec`] as a registered force.
pub struct PtoForce {
    pub pto: Arc<Pto>,
}

impl ForceFn for PtoForce {
    fn force<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<TimeSeries<D>> {
        self.pto.force_on_wec(args)
    }
}

/// `[max − f, max + f]` over every PTO DOF and sample.
pub struct ForceLimit {
    pub pto: Arc<Pto>,
    pub max: f64,
}

impl ConstraintFn for ForceLimit {
    fn constraint<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<Vec<D>> {
        let force = self.pto.force(args)?;
        let upper = force.iter().flatten().map(|&f| D::from(self.max) - f);
        let lower = force.iter().flatten().map(|&f| D::from(self.max) + f);
        Ok(upper.chain(lower).collect())
    }
}

pub struct AveragePower {
    pub pto: Arc<Pto>,
    pub kind: PowerKind,
}

impl ObjectiveFn for AveragePower {
    fn objective<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<D> {
        self.pto.average_power(args, self.kind)
    }
}

/// Time derivative of `[a0, a1, b1, …]`: `a'_k = kω₁ b_k`, `b'_k = −kω₁ a_k`.
fn derivative<D: Scalar>(grid: &FrequencyGrid, x: &[D]) -> Vec<D> {
    let mut out = vec![D::from(0.0); x.len()];
    for (k, w) in grid.omega_positive().into_iter().enumerate() {
        let (a, b) = (x[1 + 2 * k], x[2 + 2 * k]);
        out[1 + 2 * k] = b * w;
        out[2 + 2 * k] = -(a * w);
    }
    out
}

/// Complex amplitude `X = a − ib` of harmonic `k + 1` as `(re, im)`.
fn amplitude<D: Scalar>(block: &[D], k: usize) -> (D, D) {
    (block[1 + 2 * k], -block[2 + 2 * k])
}

fn set_amplitude<D: Scalar>(block: &mut [D], k: usize, (re, im): (D, D)) {
    block[1 + 2 * k] = re;
    block[2 + 2 * k] = -im;
}

/// `acc += c · x` in complex arithmetic.
fn accumulate<D: Scalar>(acc: &mut (D, D), c: Complex64, (re, im): (D, D)) {
    acc.0 += re * c.re - im * c.im;
    acc.1 += re * c.im + im * c.re;
}

fn product<D: Scalar>(a: &TimeSeries<D>, b: &TimeSeries<D>) -> TimeSeries<D> {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.iter().zip(y).map(|(&p, &q)| p * q).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivative_of_single_harmonic() {
        let grid = FrequencyGrid::new(0.5, 2, false).unwrap();
        let w1 = grid.omega_positive()[0];
        let x = [7.0, 1.0, 0.0, 0.0, 2.0];
        let d = derivative(&grid, &x);
        assert_eq!(d[0], 0.0);
        assert!((d[1] - 0.0).abs() < 1e-15);
        assert!((d[2] + w1).abs() < 1e-12);
        assert!((d[3] - 2.0 * 2.0 * w1).abs() < 1e-12);
        assert!(d[4].abs() < 1e-15);
    }

    #[test]
    fn complex_accumulate_multiplies() {
        let mut acc = (0.0, 0.0);
        accumulate(&mut acc, Complex64::new(1.0, 2.0), (3.0, -1.0));
        let expected = Complex64::new(1.0, 2.0) * Complex64::new(3.0, -1.0);
        assert_eq!(acc, (expected.re, expected.im));
    }

    #[test]
    fn force_limit_must_be_positive() {
        let pto = Pto::new(Kinematics::identity(1), Controller::Unstructured);
        assert!(pto.force_limit(0.0, 2).is_err());
        assert!(pto.force_limit(f64::NAN, 2).is_err());
        assert_eq!(pto.force_limit(10.0, 3).unwrap().nsubsteps(), 3);
    }

    #[test]
    fn default_names_follow_kinematics() {
        let pto = Pto::new(Kinematics::identity(2), Controller::Pid);
        assert_eq!(pto.names(), ["PTO_0", "PTO_1"]);
        assert!(pto.clone().with_names(vec!["a".into()]).is_err());
    }
}
