//! wo-hydro: frequency-domain building blocks for wave energy converter models.
//!
//! Provides:
//! - `FrequencyGrid`: the uniform frequency set of the pseudo-spectral basis
//! - `fourier`: synthesis/analysis matrices and coefficient conversions
//! - `HydrodynamicCoefficients`: added mass, radiation damping, excitation
//! - `dataset`: self-describing coefficient files (JSON/YAML)
//! - `Waves`: regular and irregular wave environments
//! - `HeavingCylinder`: analytic stand-in for boundary-element data
//!
//! Boundary-element computation itself is out of scope; coefficients arrive
//! either in memory or through a dataset file.

pub mod analytic;
pub mod coefficients;
pub mod dataset;
pub mod error;
pub mod fourier;
pub mod grid;
pub mod waves;

pub use analytic::HeavingCylinder;
pub use coefficients::{DampingViolation, HydrodynamicCoefficients};
pub use dataset::HydroDataset;
pub use error::{HydroError, HydroResult};
pub use grid::FrequencyGrid;
pub use waves::{Phases, Waves};
