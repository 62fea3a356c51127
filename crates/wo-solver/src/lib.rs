//! Constrained optimal-control solver for pseudo-spectral WEC models.
//!
//! The control problem is posed as an NLP over the scaled Fourier
//! coefficients `z = [s_wec·x_wec, s_opt·x_opt]`:
//!
//! - objective: a user [`wo_dynamics::Objective`], scaled by `s_obj`
//! - equalities: the dynamics residual plus registered equality constraints
//! - inequalities: registered inequality constraints, each on its own grid
//!
//! and solved with a sequential quadratic programming method whose QP
//! subproblems go to an interior-point conic solver.

pub mod error;
pub mod jacobian;
pub mod nlp;
pub mod postprocess;
pub mod problem;
pub mod qp;
pub mod solve;
pub mod sqp;

pub use error::{SolverError, SolverResult};
pub use jacobian::{GradientCheck, check_gradients};
pub use nlp::Nlp;
pub use postprocess::{FrequencySignals, Signal, TimeSignals, postprocess};
pub use problem::{Scaling, WecProblem};
pub use solve::{SolveOptions, SolveProgressEvent, SolveResults, solve, solve_with_progress};
pub use sqp::{ExitStatus, SqpConfig, SqpIteration, SqpResult, minimize};
