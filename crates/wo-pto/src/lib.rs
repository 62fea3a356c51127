//! Power take-off models for WEC control problems.
//!
//! A [`Pto`] maps WEC motion to actuator motion through fixed
//! [`Kinematics`], derives the actuator force from the control state through
//! a [`Controller`], and optionally converts mechanical to electrical power
//! through a [`TwoPortImpedance`].
//!
//! # Sign conventions
//!
//! - Actuator force is the force the PTO applies to the WEC, expressed on the
//!   PTO degrees of freedom; the force on the WEC is `Kᵀ f`.
//! - Power is `f · v` (mechanical) or `i · V` (electrical): negative values
//!   are absorbed power, so maximizing absorption means minimizing
//!   [`Pto::average_power`].

pub mod controller;
pub mod error;
pub mod impedance;
pub mod kinematics;
pub mod postprocess;
pub mod pto;

pub use controller::Controller;
pub use error::{PtoError, PtoResult};
pub use impedance::{GeneratorDrivetrain, TwoPortImpedance};
pub use kinematics::Kinematics;
pub use postprocess::{PtoReport, PtoSummary};
pub use pto::{AveragePower, ForceLimit, PowerKind, Pto, PtoForce};
