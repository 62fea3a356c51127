//! WEC dynamics model: construction, residual and exact Jacobian.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use wo_core::{Dual, Scalar};
use wo_hydro::{FrequencyGrid, HydrodynamicCoefficients, Waves, fourier};

use crate::autodiff;
use crate::constraint::Constraint;
use crate::error::{DynamicsError, DynamicsResult};
use crate::force::AdditionalForce;
use crate::impedance::{
    DampingPolicy, DampingReport, apply_damping_policy, intrinsic_impedance, linear_operator,
};
use crate::state::{Evaluable, FourierOps, StateArgs, TimeSeries};

/// Linear hydrodynamic model plus registered forces and constraints.
///
/// Immutable after [`WecBuilder::build`]; the only interior state is a cache
/// of basis matrices keyed by time refinement.
pub struct Wec {
    grid: FrequencyGrid,
    dof_names: Vec<String>,
    directions: Vec<f64>,
    /// Excitation per positive frequency, `ndof × ndir`.
    excitation: Vec<DMatrix<Complex64>>,
    /// Intrinsic impedance per positive frequency.
    impedance: Vec<DMatrix<Complex64>>,
    stiffness: DMatrix<f64>,
    linear: DMatrix<f64>,
    forces: BTreeMap<String, AdditionalForce>,
    constraints: Vec<Constraint>,
    damping: DampingReport,
    ops: RwLock<BTreeMap<usize, Arc<FourierOps>>>,
}

enum Source {
    Coefficients {
        coeffs: HydrodynamicCoefficients,
        mass: DMatrix<f64>,
    },
    Impedance {
        dof_names: Vec<String>,
        directions: Vec<f64>,
        impedance: Vec<DMatrix<Complex64>>,
        excitation: Vec<DMatrix<Complex64>>,
    },
}

pub struct WecBuilder {
    grid: FrequencyGrid,
    source: Source,
    stiffness: DMatrix<f64>,
    friction: Option<DMatrix<f64>>,
    damping_policy: DampingPolicy,
    forces: Vec<(String, AdditionalForce)>,
    constraints: Vec<Constraint>,
}

impl WecBuilder {
    /// Model from boundary-element style coefficients, rigid-body inertia and
    /// hydrostatic stiffness.
    pub fn from_coefficients(
        grid: FrequencyGrid,
        coeffs: HydrodynamicCoefficients,
        mass: DMatrix<f64>,
        stiffness: DMatrix<f64>,
    ) -> Self {
        Self {
            grid,
            source: Source::Coefficients { coeffs, mass },
            stiffness,
            friction: None,
            damping_policy: DampingPolicy::default(),
            forces: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Model from an identified intrinsic impedance per positive frequency.
    ///
    /// `stiffness` defines the response of the mean component.
    pub fn from_impedance(
        grid: FrequencyGrid,
        dof_names: Vec<String>,
        directions: Vec<f64>,
        impedance: Vec<DMatrix<Complex64>>,
        excitation: Vec<DMatrix<Complex64>>,
        stiffness: DMatrix<f64>,
    ) -> Self {
        Self {
            grid,
            source: Source::Impedance {
                dof_names,
                directions,
                impedance,
                excitation,
            },
            stiffness,
            friction: None,
            damping_policy: DampingPolicy::default(),
            forces: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn friction(mut self, friction: DMatrix<f64>) -> Self {
        self.friction = Some(friction);
        self
    }

    pub fn damping_policy(mut self, policy: DampingPolicy) -> Self {
        self.damping_policy = policy;
        self
    }

    pub fn force(mut self, name: impl Into<String>, force: AdditionalForce) -> Self {
        self.forces.push((name.into(), force));
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn build(self) -> DynamicsResult<Wec> {
        let grid = self.grid;
        let nfreq = grid.nfreq();
        let (dof_names, directions, impedance, excitation, damping) = match self.source {
            Source::Coefficients { mut coeffs, mass } => {
                coeffs.validate()?;
                coeffs.check_grid(&grid)?;
                let ndof = coeffs.ndof();
                check_square("mass", &mass, ndof)?;
                check_square("stiffness", &self.stiffness, ndof)?;
                check_symmetric("mass matrix must be symmetric", &mass)?;
                check_symmetric("stiffness matrix must be symmetric", &self.stiffness)?;
                if mass.clone().symmetric_eigenvalues().min() <= 0.0 {
                    return Err(DynamicsError::InvalidArg {
                        what: "mass matrix must be positive definite",
                    });
                }
                if self.stiffness.clone().symmetric_eigenvalues().min()
                    < -1e-9 * self.stiffness.amax().max(1.0)
                {
                    return Err(DynamicsError::InvalidArg {
                        what: "stiffness matrix must be positive semi-definite",
                    });
                }
                let friction = self
                    .friction
                    .clone()
                    .unwrap_or_else(|| DMatrix::zeros(ndof, ndof));
                check_square("friction", &friction, ndof)?;

                let damping = apply_damping_policy(&mut coeffs, &self.damping_policy)?;
                let offset = usize::from(grid.zero_frequency());
                let omega = grid.omega_positive();
                let impedance = omega
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| {
                        intrinsic_impedance(
                            w,
                            &mass,
                            &coeffs.added_mass[k + offset],
                            &coeffs.radiation_damping[k + offset],
                            &self.stiffness,
                            &friction,
                        )
                    })
                    .collect();
                let excitation = coeffs.excitation[offset..].to_vec();
                (coeffs.dof_names, coeffs.directions, impedance, excitation, damping)
            }
            Source::Impedance {
                dof_names,
                directions,
                mut impedance,
                excitation,
            } => {
                let ndof = dof_names.len();
                if ndof == 0 {
                    return Err(DynamicsError::InvalidArg {
                        what: "at least one degree of freedom is required",
                    });
                }
                check_square("stiffness", &self.stiffness, ndof)?;
                check_len("impedance frequency count", nfreq, impedance.len())?;
                check_len("excitation frequency count", nfreq, excitation.len())?;
                for z in &impedance {
                    check_square("impedance", z, ndof)?;
                }
                for x in &excitation {
                    check_len("excitation DOF count", ndof, x.nrows())?;
                    check_len("excitation direction count", directions.len(), x.ncols())?;
                }
                if let Some(friction) = &self.friction {
                    check_square("friction", friction, ndof)?;
                    for z in &mut impedance {
                        *z += friction.map(|c| Complex64::new(c, 0.0));
                    }
                }
                let damping = impedance_damping_check(&grid, &mut impedance, &self.damping_policy)?;
                (dof_names, directions, impedance, excitation, damping)
            }
        };

        let mut forces = BTreeMap::new();
        for (name, force) in self.forces {
            if forces.contains_key(&name) {
                return Err(DynamicsError::DuplicateName { name });
            }
            forces.insert(name, force);
        }
        let mut seen = std::collections::BTreeSet::new();
        for c in &self.constraints {
            if !seen.insert(c.name().to_string()) {
                return Err(DynamicsError::DuplicateName {
                    name: c.name().to_string(),
                });
            }
        }

        let linear = linear_operator(&grid, &impedance, &self.stiffness);
        let mut ops = BTreeMap::new();
        for nsub in std::iter::once(1).chain(self.constraints.iter().map(Constraint::nsubsteps)) {
            ops.entry(nsub)
                .or_insert_with(|| Arc::new(FourierOps::new(&grid, nsub)));
        }

        tracing::debug!(
            ndof = dof_names.len(),
            nfreq,
            forces = forces.len(),
            constraints = self.constraints.len(),
            "built WEC model"
        );

        Ok(Wec {
            grid,
            dof_names,
            directions,
            excitation,
            impedance,
            stiffness: self.stiffness,
            linear,
            forces,
            constraints: self.constraints,
            damping,
            ops: RwLock::new(ops),
        })
    }
}

impl Wec {
    pub fn grid(&self) -> &FrequencyGrid {
        &self.grid
    }

    pub fn ndof(&self) -> usize {
        self.dof_names.len()
    }

    pub fn dof_names(&self) -> &[String] {
        &self.dof_names
    }

    pub fn ncomponents(&self) -> usize {
        self.grid.ncomponents()
    }

    /// Length of `x_wec`.
    pub fn nstate(&self) -> usize {
        self.ndof() * self.ncomponents()
    }

    pub fn forces(&self) -> &BTreeMap<String, AdditionalForce> {
        &self.forces
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn damping_report(&self) -> &DampingReport {
        &self.damping
    }

    /// Intrinsic impedance per positive grid frequency.
    pub fn intrinsic_impedance(&self) -> &[DMatrix<Complex64>] {
        &self.impedance
    }

    pub fn stiffness(&self) -> &DMatrix<f64> {
        &self.stiffness
    }

    /// Real linear operator on `x_wec` (`nstate × nstate`).
    pub fn linear_operator(&self) -> &DMatrix<f64> {
        &self.linear
    }

    /// Basis matrices for `nsubsteps`, computed once and cached.
    pub fn ops(&self, nsubsteps: usize) -> Arc<FourierOps> {
        let nsubsteps = nsubsteps.max(1);
        if let Some(ops) = self
            .ops
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&nsubsteps)
        {
            return Arc::clone(ops);
        }
        let fresh = Arc::new(FourierOps::new(&self.grid, nsubsteps));
        let mut cache = self.ops.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(nsubsteps).or_insert(fresh))
    }

    pub fn args<'a, D: Scalar>(
        &'a self,
        x_wec: &'a [D],
        x_opt: &'a [D],
        waves: &'a Waves,
        nsubsteps: usize,
    ) -> StateArgs<'a, D> {
        StateArgs {
            wec: self,
            x_wec,
            x_opt,
            waves,
            nsubsteps: nsubsteps.max(1),
        }
    }

    /// Complex excitation force per positive frequency, `nfreq × ndof`.
    pub fn excitation_force(&self, waves: &Waves) -> DynamicsResult<DMatrix<Complex64>> {
        self.check_waves(waves)?;
        let dir_index = waves
            .directions()
            .iter()
            .map(|&d| self.direction_index(d))
            .collect::<DynamicsResult<Vec<_>>>()?;
        let amp = waves.amplitude();
        Ok(DMatrix::from_fn(self.grid.nfreq(), self.ndof(), |k, dof| {
            dir_index
                .iter()
                .enumerate()
                .map(|(w, &d)| self.excitation[k][(dof, d)] * amp[(k, w)])
                .sum()
        }))
    }

    /// Excitation force as a DOF-major coefficient vector.
    pub fn excitation_coefficients(&self, waves: &Waves) -> DynamicsResult<Vec<f64>> {
        let fe = self.excitation_force(waves)?;
        Ok((0..self.ndof())
            .flat_map(|dof| {
                let col: Vec<Complex64> = fe.column(dof).iter().copied().collect();
                fourier::real_from_complex(0.0, &col)
            })
            .collect())
    }

    /// Closed-form response with no additional forces: `X = G⁻¹ F_e` per frequency.
    pub fn linear_response(&self, waves: &Waves) -> DynamicsResult<Vec<f64>> {
        let fe = self.excitation_force(waves)?;
        let nc = self.ncomponents();
        let mut x = vec![0.0; self.nstate()];
        for (k, w) in self.grid.omega_positive().into_iter().enumerate() {
            let g = self.impedance[k].map(|z| Complex64::new(0.0, w) * z);
            let rhs: DVector<Complex64> = fe.row(k).transpose();
            let sol = g.lu().solve(&rhs).ok_or(DynamicsError::InvalidArg {
                what: "singular impedance in linear response",
            })?;
            for dof in 0..self.ndof() {
                x[dof * nc + 1 + 2 * k] = sol[dof].re;
                x[dof * nc + 2 + 2 * k] = -sol[dof].im;
            }
        }
        Ok(x)
    }

    /// Dynamics residual `L x_wec − E − Σ F_add`, DOF-major, length `nstate`.
    pub fn residual(&self, x_wec: &[f64], x_opt: &[f64], waves: &Waves) -> DynamicsResult<Vec<f64>> {
        self.check_state(x_wec)?;
        let excitation = self.excitation_coefficients(waves)?;
        let forces = self.force_coefficients(x_wec, x_opt, waves)?;
        let linear = &self.linear * DVector::from_column_slice(x_wec);
        Ok(linear
            .iter()
            .zip(&excitation)
            .zip(&forces)
            .map(|((l, e), f)| l - e - f)
            .collect())
    }

    /// Exact Jacobian of [`Wec::residual`] with respect to `[x_wec, x_opt]`.
    ///
    /// The linear block is copied from the operator; additional-force
    /// derivatives come from forward-mode dual numbers.
    pub fn residual_jacobian(
        &self,
        x_wec: &[f64],
        x_opt: &[f64],
        waves: &Waves,
    ) -> DynamicsResult<DMatrix<f64>> {
        self.check_state(x_wec)?;
        self.check_waves(waves)?;
        if let Some((name, _)) = self.forces.iter().find(|(_, f)| !f.is_differentiable()) {
            return Err(DynamicsError::NonDifferentiableForce { name: name.clone() });
        }
        let nw = x_wec.len();
        let mut jac = DMatrix::zeros(nw, nw + x_opt.len());
        jac.view_mut((0, 0), (nw, nw)).copy_from(&self.linear);
        if self.forces.is_empty() {
            return Ok(jac);
        }
        let z: Vec<f64> = x_wec.iter().chain(x_opt).copied().collect();
        let (_, dforce) = autodiff::jacobian(&z, |zd: &[Dual]| {
            let (xw, xo) = zd.split_at(nw);
            self.force_coefficients(xw, xo, waves)
        })?;
        jac -= dforce;
        Ok(jac)
    }

    /// Sum of all additional forces projected onto the basis.
    pub fn force_coefficients<D: Evaluable>(
        &self,
        x_wec: &[D],
        x_opt: &[D],
        waves: &Waves,
    ) -> DynamicsResult<Vec<D>> {
        let ndof = self.ndof();
        let nc = self.ncomponents();
        if self.forces.is_empty() {
            return Ok(vec![D::from(0.0); ndof * nc]);
        }
        let args = self.args(x_wec, x_opt, waves, 1);
        let nt = args.nt();
        let mut total: TimeSeries<D> = vec![vec![D::from(0.0); nt]; ndof];
        for (name, force) in &self.forces {
            let series = D::force(name, force, &args)?;
            check_series(&series, ndof, nt)?;
            for (acc, s) in total.iter_mut().zip(series) {
                for (a, v) in acc.iter_mut().zip(s) {
                    *a += v;
                }
            }
        }
        let ops = self.ops(1);
        Ok(total
            .iter()
            .flat_map(|series| fourier::apply(&ops.analysis, series))
            .collect())
    }

    /// One named force sampled at `nsubsteps`.
    pub fn force_time_series(
        &self,
        name: &str,
        x_wec: &[f64],
        x_opt: &[f64],
        waves: &Waves,
        nsubsteps: usize,
    ) -> DynamicsResult<TimeSeries<f64>> {
        let force = self.forces.get(name).ok_or(DynamicsError::InvalidArg {
            what: "unknown additional force",
        })?;
        let args = self.args(x_wec, x_opt, waves, nsubsteps);
        let series = f64::force(name, force, &args)?;
        check_series(&series, self.ndof(), args.nt())?;
        Ok(series)
    }

    fn check_state<D>(&self, x_wec: &[D]) -> DynamicsResult<()> {
        check_len("x_wec length", self.nstate(), x_wec.len())
    }

    fn check_waves(&self, waves: &Waves) -> DynamicsResult<()> {
        let wg = waves.grid();
        check_len("wave frequency count", self.grid.nfreq(), wg.nfreq())?;
        if (wg.f1() - self.grid.f1()).abs() > 1e-9 * self.grid.f1() {
            return Err(DynamicsError::InvalidArg {
                what: "waves are defined on a different frequency grid",
            });
        }
        Ok(())
    }

    fn direction_index(&self, direction: f64) -> DynamicsResult<usize> {
        let two_pi = 2.0 * std::f64::consts::PI;
        self.directions
            .iter()
            .position(|d| {
                let diff = (d - direction).rem_euclid(two_pi);
                diff.min(two_pi - diff) < 1e-6
            })
            .ok_or_else(|| {
                wo_hydro::HydroError::UnknownDirection {
                    direction_rad: direction,
                }
                .into()
            })
    }
}

impl std::fmt::Debug for Wec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wec")
            .field("grid", &self.grid)
            .field("dof_names", &self.dof_names)
            .field("forces", &self.forces.keys().collect::<Vec<_>>())
            .field("constraints", &self.constraints)
            .finish()
    }
}

fn impedance_damping_check(
    grid: &FrequencyGrid,
    impedance: &mut [DMatrix<Complex64>],
    policy: &DampingPolicy,
) -> DynamicsResult<DampingReport> {
    // Resistance (Re Z) plays the role of damping for identified models.
    let ndof = impedance.first().map_or(0, |z| z.nrows());
    let omega = grid.omega_positive();
    let mut coeffs = HydrodynamicCoefficients {
        dof_names: (0..ndof).map(|i| format!("dof{i}")).collect(),
        directions: vec![0.0],
        omega: omega.clone(),
        added_mass: vec![DMatrix::zeros(ndof, ndof); omega.len()],
        radiation_damping: impedance.iter().map(|z| z.map(|c| c.re)).collect(),
        excitation: vec![DMatrix::zeros(ndof, 1); omega.len()],
    };
    let report = apply_damping_policy(&mut coeffs, policy)?;
    if report.clipped > 0 {
        for (z, b) in impedance.iter_mut().zip(&coeffs.radiation_damping) {
            for i in 0..ndof {
                z[(i, i)].re = b[(i, i)];
            }
        }
    }
    Ok(report)
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> DynamicsResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DynamicsError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}

fn check_square<T>(what: &'static str, m: &DMatrix<T>, n: usize) -> DynamicsResult<()> {
    check_len(what, n, m.nrows())?;
    check_len(what, n, m.ncols())
}

fn check_symmetric(what: &'static str, m: &DMatrix<f64>) -> DynamicsResult<()> {
    let tol = 1e-9 * m.amax().max(1.0);
    if (m - m.transpose()).amax() > tol {
        return Err(DynamicsError::InvalidArg { what });
    }
    Ok(())
}

fn check_series<D>(series: &TimeSeries<D>, ndof: usize, nt: usize) -> DynamicsResult<()> {
    check_len("additional force DOF count", ndof, series.len())?;
    for s in series {
        check_len("additional force samples", nt, s.len())?;
    }
    Ok(())
}
