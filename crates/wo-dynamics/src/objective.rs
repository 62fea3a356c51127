//! Scalar objective capabilities.

use std::sync::Arc;

use wo_core::{Dual, Scalar};

use crate::error::DynamicsResult;
use crate::state::StateArgs;

/// An objective written once over any [`Scalar`]; the solver minimizes it.
pub trait ObjectiveFn: Send + Sync {
    fn objective<D: Scalar>(&self, args: &StateArgs<'_, D>) -> DynamicsResult<D>;
}

pub(crate) trait ErasedObjective: Send + Sync {
    fn eval_value(&self, args: &StateArgs<'_, f64>) -> DynamicsResult<f64>;
    fn eval_dual(&self, args: &StateArgs<'_, Dual>) -> DynamicsResult<Dual>;
}

struct Erased<F>(F);

impl<F: ObjectiveFn> ErasedObjective for Erased<F> {
    fn eval_value(&self, args: &StateArgs<'_, f64>) -> DynamicsResult<f64> {
        self.0.objective(args)
    }

    fn eval_dual(&self, args: &StateArgs<'_, Dual>) -> DynamicsResult<Dual> {
        self.0.objective(args)
    }
}

#[derive(Clone)]
pub struct Objective {
    name: String,
    nsubsteps: usize,
    inner: Arc<dyn ErasedObjective>,
}

impl Objective {
    pub fn new<F: ObjectiveFn + 'static>(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            nsubsteps: 1,
            inner: Arc::new(Erased(f)),
        }
    }

    /// Evaluate on a refined time grid instead of the base grid.
    pub fn with_nsubsteps(mut self, nsubsteps: usize) -> Self {
        self.nsubsteps = nsubsteps.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nsubsteps(&self) -> usize {
        self.nsubsteps
    }

    pub(crate) fn inner(&self) -> &dyn ErasedObjective {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Objective")
            .field("name", &self.name)
            .field("nsubsteps", &self.nsubsteps)
            .finish()
    }
}
