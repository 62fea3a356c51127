//! wo-core: shared foundation for the wave optimization workspace.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - scalar (the `Scalar` bound shared by value and dual-number evaluation)
//! - logging (explicit verbosity configuration passed to entry points)
//! - error (shared error types)

pub mod error;
pub mod logging;
pub mod numeric;
pub mod scalar;
pub mod units;

pub use error::{WoError, WoResult};
pub use logging::{LogConfig, LogLevel, Verbosity};
pub use numeric::*;
pub use scalar::{Dual, Scalar, derivative, seed_vector, seeded, value};
pub use units::*;
