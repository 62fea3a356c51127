//! Search strategies over design parameters.

use std::sync::Mutex;

use argmin::core::{CostFunction, Executor, State};
use argmin::solver::neldermead::NelderMead;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DesignError, DesignResult};
use crate::objective::DesignObjective;
use crate::space::ParameterSpace;

/// One evaluated design point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub params: Vec<f64>,
    /// `None` when the sample failed.
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Evaluation {
    fn from_result(params: Vec<f64>, result: DesignResult<f64>) -> Self {
        match result {
            Ok(value) => Self {
                params,
                value: Some(value),
                error: None,
            },
            Err(err) => Self {
                params,
                value: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Every evaluation of a search, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub strategy: String,
    pub evaluations: Vec<Evaluation>,
}

impl SearchReport {
    /// Lowest successful evaluation.
    pub fn best(&self) -> Option<&Evaluation> {
        self.evaluations
            .iter()
            .filter(|e| e.value.is_some_and(f64::is_finite))
            .min_by(|a, b| {
                let (a, b) = (a.value.unwrap_or(f64::INFINITY), b.value.unwrap_or(f64::INFINITY));
                a.total_cmp(&b)
            })
    }

    pub fn failures(&self) -> usize {
        self.evaluations.iter().filter(|e| e.value.is_none()).count()
    }
}

/// Pluggable search algorithm; it only sees the objective contract.
pub trait SearchStrategy {
    fn search(&self, objective: &dyn DesignObjective) -> DesignResult<SearchReport>;
}

/// Exhaustive evaluation of a [`ParameterSpace`], samples in parallel.
#[derive(Debug, Clone)]
pub struct GridSearch {
    pub space: ParameterSpace,
    /// Worker threads; `None` uses the global pool.
    pub threads: Option<usize>,
}

impl GridSearch {
    pub fn new(space: ParameterSpace) -> Self {
        Self {
            space,
            threads: None,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

impl SearchStrategy for GridSearch {
    fn search(&self, objective: &dyn DesignObjective) -> DesignResult<SearchReport> {
        let samples = self.space.samples();
        let run = || -> Vec<Evaluation> {
            samples
                .par_iter()
                .map(|params| Evaluation::from_result(params.clone(), objective.evaluate(params)))
                .collect()
        };
        let evaluations = match self.threads {
            Some(n) => ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| DesignError::Search {
                    what: format!("building thread pool: {e}"),
                })?
                .install(run),
            None => run(),
        };

        let report = SearchReport {
            strategy: "grid".to_string(),
            evaluations,
        };
        if report.failures() > 0 {
            warn!(failed = report.failures(), total = samples.len(), "grid search samples failed");
        }
        info!(samples = samples.len(), best = ?report.best().and_then(|b| b.value), "grid search finished");
        Ok(report)
    }
}

/// Gradient-free local search from an initial design.
#[derive(Debug, Clone)]
pub struct NelderMeadSearch {
    pub initial: Vec<f64>,
    /// Initial simplex edge per parameter.
    pub step: Vec<f64>,
    pub max_iterations: u64,
    /// Stop when the standard deviation of simplex values falls below this.
    pub sd_tolerance: f64,
}

impl NelderMeadSearch {
    pub fn new(initial: Vec<f64>, step: Vec<f64>) -> Self {
        Self {
            initial,
            step,
            max_iterations: 100,
            sd_tolerance: 1e-6,
        }
    }

    fn simplex(&self) -> DesignResult<Vec<Vec<f64>>> {
        if self.initial.is_empty() {
            return Err(DesignError::InvalidArg {
                what: "initial design must be non-empty",
            });
        }
        if self.step.len() != self.initial.len() {
            return Err(DesignError::DimensionMismatch {
                what: "simplex steps",
                expected: self.initial.len(),
                actual: self.step.len(),
            });
        }
        if self.step.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(DesignError::InvalidArg {
                what: "simplex steps must be finite and non-zero",
            });
        }
        let mut simplex = vec![self.initial.clone()];
        for (i, s) in self.step.iter().enumerate() {
            let mut vertex = self.initial.clone();
            vertex[i] += s;
            simplex.push(vertex);
        }
        Ok(simplex)
    }
}

/// Adapter recording every evaluation argmin requests.
struct Recorded<'a> {
    objective: &'a dyn DesignObjective,
    evaluations: &'a Mutex<Vec<Evaluation>>,
}

impl CostFunction for Recorded<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let result = self.objective.evaluate(params);
        // Failed samples rank last instead of aborting the search.
        let value = match &result {
            Ok(v) if v.is_finite() => *v,
            _ => f64::INFINITY,
        };
        self.evaluations
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(Evaluation::from_result(params.clone(), result));
        Ok(value)
    }
}

impl SearchStrategy for NelderMeadSearch {
    fn search(&self, objective: &dyn DesignObjective) -> DesignResult<SearchReport> {
        let solver = NelderMead::new(self.simplex()?)
            .with_sd_tolerance(self.sd_tolerance)
            .map_err(|e| DesignError::Search {
                what: e.to_string(),
            })?;
        let evaluations = Mutex::new(Vec::new());
        let problem = Recorded {
            objective,
            evaluations: &evaluations,
        };
        let max_iterations = self.max_iterations;
        let result = Executor::new(problem, solver)
            .configure(|state| state.max_iters(max_iterations))
            .run()
            .map_err(|e| DesignError::Search {
                what: e.to_string(),
            })?;
        info!(
            iterations = result.state().get_iter(),
            best = result.state().get_best_cost(),
            "Nelder-Mead search finished"
        );
        drop(result);

        let evaluations = evaluations
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(SearchReport {
            strategy: "nelder_mead".to_string(),
            evaluations,
        })
    }
}
