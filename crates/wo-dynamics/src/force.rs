//! Additional forces summed into the dynamics residual.

use std::sync::Arc;

use nalgebra::DMatrix;
use wo_core::{Dual, Scalar};

use crate::error::{DynamicsError, DynamicsResult};
use crate::state::{StateArgs, TimeSeries};

/// A force written once over any [`Scalar`].
///
/// Returns one time series per WEC DOF (`ndof × nt`), sampled on the grid of
/// `args.nsubsteps`.
pub trait ForceFn: Send + Sync {
    fn force<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<TimeSeries<D>>;
}

pub(crate) trait ErasedForce: Send + Sync {
    fn eval_value(&self, args: &StateArgs<'_, f64>) -> DynamicsResult<TimeSeries<f64>>;

    /// `None` when the force has no dual-number evaluation.
    fn eval_dual(&self, args: &StateArgs<'_, Dual>) -> Option<DynamicsResult<TimeSeries<Dual>>>;
}

struct Differentiable<F>(F);

impl<F: ForceFn> ErasedForce for Differentiable<F> {
    fn eval_value(&self, args: &StateArgs<'_, f64>) -> DynamicsResult<TimeSeries<f64>> {
        self.0.force(args)
    }

    fn eval_dual(&self, args: &StateArgs<'_, Dual>) -> Option<DynamicsResult<TimeSeries<Dual>>> {
        Some(self.0.force(args))
    }
}

struct NumericOnly<F>(F);

impl<F> ErasedForce for NumericOnly<F>
where
    F: Fn(&StateArgs<'_, f64>) -> DynamicsResult<TimeSeries<f64>> + Send + Sync,
{
    fn eval_value(&self, args: &StateArgs<'_, f64>) -> DynamicsResult<TimeSeries<f64>> {
        (self.0)(args)
    }

    fn eval_dual(&self, _args: &StateArgs<'_, Dual>) -> Option<DynamicsResult<TimeSeries<Dual>>> {
        None
    }
}

/// Type-erased handle registered on a WEC under a name.
#[derive(Clone)]
pub struct AdditionalForce {
    inner: Arc<dyn ErasedForce>,
    differentiable: bool,
}

impl AdditionalForce {
    pub fn new<F: ForceFn + 'static>(force: F) -> Self {
        Self {
            inner: Arc::new(Differentiable(force)),
            differentiable: true,
        }
    }

    /// A force evaluated on plain values only.
    ///
    /// Residual evaluation works; any derivative request fails with
    /// `NonDifferentiableForce`.
    pub fn numeric<F>(force: F) -> Self
    where
        F: Fn(&StateArgs<'_, f64>) -> DynamicsResult<TimeSeries<f64>> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(NumericOnly(force)),
            differentiable: false,
        }
    }

    pub fn is_differentiable(&self) -> bool {
        self.differentiable
    }

    pub(crate) fn inner(&self) -> &dyn ErasedForce {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for AdditionalForce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdditionalForce")
            .field("differentiable", &self.differentiable)
            .finish()
    }
}

/// Linear spring-damper `F = −K x − C v` between DOFs and ground.
#[derive(Clone, Debug)]
pub struct LinearMooring {
    pub stiffness: DMatrix<f64>,
    pub damping: DMatrix<f64>,
}

impl ForceFn for LinearMooring {
    fn force<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<TimeSeries<D>> {
        let ndof = args.ndof();
        check_square("mooring stiffness", &self.stiffness, ndof)?;
        check_square("mooring damping", &self.damping, ndof)?;
        let pos = args.position();
        let vel = args.velocity();
        let nt = args.nt();
        Ok((0..ndof)
            .map(|i| {
                (0..nt)
                    .map(|t| {
                        let mut f = D::from(0.0);
                        for j in 0..ndof {
                            f -= pos[j][t] * self.stiffness[(i, j)] + vel[j][t] * self.damping[(i, j)];
                        }
                        f
                    })
                    .collect()
            })
            .collect())
    }
}

/// Quadratic viscous drag `F_i = −c_i |v_i| v_i` per DOF.
///
/// `c_i = ½ ρ C_d A` for a translational DOF.
#[derive(Clone, Debug)]
pub struct QuadraticDrag {
    pub coefficients: Vec<f64>,
}

impl ForceFn for QuadraticDrag {
    fn force<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<TimeSeries<D>> {
        if self.coefficients.len() != args.ndof() {
            return Err(DynamicsError::DimensionMismatch {
                what: "drag coefficients",
                expected: args.ndof(),
                actual: self.coefficients.len(),
            });
        }
        Ok(args
            .velocity()
            .into_iter()
            .zip(&self.coefficients)
            .map(|(v, &c)| v.into_iter().map(|vt| -(vt.abs() * vt) * c).collect())
            .collect())
    }
}

fn check_square(what: &'static str, m: &DMatrix<f64>, n: usize) -> DynamicsResult<()> {
    if m.nrows() != n || m.ncols() != n {
        return Err(DynamicsError::DimensionMismatch {
            what,
            expected: n,
            actual: if m.nrows() != n { m.nrows() } else { m.ncols() },
        });
    }
    Ok(())
}
