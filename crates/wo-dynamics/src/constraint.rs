//! Constraint capabilities.

use std::sync::Arc;

use wo_core::{Dual, Scalar};

use crate::error::DynamicsResult;
use crate::state::StateArgs;

/// A constraint written once over any [`Scalar`].
pub trait ConstraintFn: Send + Sync {
    fn constraint<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<Vec<D>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Every entry must be `≥ 0`.
    Inequality,
    /// Every entry must be `= 0`.
    Equality,
}

pub(crate) trait ErasedConstraint: Send + Sync {
    fn eval_value(&self, args: &StateArgs<'_, f64>) -> DynamicsResult<Vec<f64>>;
    fn eval_dual(&self, args: &StateArgs<'_, Dual>) -> DynamicsResult<Vec<Dual>>;
}

struct Erased<F>(F);

impl<F: ConstraintFn> ErasedConstraint for Erased<F> {
    fn eval_value(&self, args: &StateArgs<'_, f64>) -> DynamicsResult<Vec<f64>> {
        self.0.constraint(args)
    }

    fn eval_dual(&self, args: &StateArgs<'_, Dual>) -> DynamicsResult<Vec<Dual>> {
        self.0.constraint(args)
    }
}

/// A named constraint evaluated at its own time refinement.
#[derive(Clone)]
pub struct Constraint {
    name: String,
    kind: ConstraintKind,
    nsubsteps: usize,
    inner: Arc<dyn ErasedConstraint>,
}

impl Constraint {
    /// Constraint `g(x) ≥ 0` sampled at `nsubsteps` points per base time step.
    ///
    /// Finer sampling catches peaks that fall between samples. Only a nested
    /// refinement (`n` to `m·n`) keeps the previous sample times, so only then
    /// is the enforced peak guaranteed not to decrease; `2` to `3`, for
    /// example, may miss a sample that `2` had.
    pub fn inequality<F: ConstraintFn + 'static>(
        name: impl Into<String>,
        nsubsteps: usize,
        f: F,
    ) -> Self {
        Self::new(name, ConstraintKind::Inequality, nsubsteps, f)
    }

    pub fn equality<F: ConstraintFn + 'static>(
        name: impl Into<String>,
        nsubsteps: usize,
        f: F,
    ) -> Self {
        Self::new(name, ConstraintKind::Equality, nsubsteps, f)
    }

    fn new<F: ConstraintFn + 'static>(
        name: impl Into<String>,
        kind: ConstraintKind,
        nsubsteps: usize,
        f: F,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            nsubsteps: nsubsteps.max(1),
            inner: Arc::new(Erased(f)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn nsubsteps(&self) -> usize {
        self.nsubsteps
    }

    pub(crate) fn inner(&self) -> &dyn ErasedConstraint {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constraint")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("nsubsteps", &self.nsubsteps)
            .finish()
    }
}
