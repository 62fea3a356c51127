//! wo-dynamics: pseudo-spectral WEC dynamics.
//!
//! The equation of motion of a floating body is written on a truncated
//! Fourier basis. The linear hydrodynamic part is exactly block diagonal in
//! frequency; additional forces (actuators, moorings, nonlinear hydrodynamics)
//! are evaluated in the time domain and projected back onto the basis. The
//! resulting residual and its exact Jacobian are the equality constraint of
//! the control optimization.
//!
//! Callables (forces, constraints, objectives) are written once over
//! [`wo_core::Scalar`] and evaluated on plain values and on dual numbers.

pub mod autodiff;
pub mod constraint;
pub mod error;
pub mod force;
pub mod impedance;
pub mod objective;
pub mod state;
pub mod wec;

pub use constraint::{Constraint, ConstraintFn, ConstraintKind};
pub use error::{DynamicsError, DynamicsResult};
pub use force::{AdditionalForce, ForceFn, LinearMooring, QuadraticDrag};
pub use impedance::{DampingAction, DampingPolicy, DampingReport};
pub use objective::{Objective, ObjectiveFn};
pub use state::{Evaluable, FourierOps, StateArgs, TimeSeries};
pub use wec::{Wec, WecBuilder};
