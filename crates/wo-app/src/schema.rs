//! Case file schema definitions.
//!
//! A case describes one control problem (and optionally a design search over
//! it) in YAML or JSON. Angles are in degrees, frequencies in hertz and every
//! other quantity in SI units.

use serde::{Deserialize, Serialize};
use wo_core::LogConfig;
use wo_design::{FailurePolicy, SweepDefinition};
use wo_pto::{Controller, GeneratorDrivetrain, PowerKind};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Case {
    pub version: u32,
    pub name: String,
    pub grid: GridDef,
    pub body: BodyDef,
    pub waves: WavesDef,
    #[serde(default)]
    pub pto: PtoDef,
    #[serde(default)]
    pub forces: Vec<ForceDef>,
    #[serde(default)]
    pub constraints: ConstraintsDef,
    #[serde(default)]
    pub objective: ObjectiveDef,
    #[serde(default)]
    pub solver: SolverDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<DesignDef>,
    #[serde(default)]
    pub logging: LogConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GridDef {
    pub f1_hz: f64,
    pub nfreq: usize,
    #[serde(default)]
    pub zero_frequency: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyDef {
    /// Analytic heaving cylinder, one heave DOF.
    Cylinder {
        radius_m: f64,
        draft_m: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        friction: Option<f64>,
    },
    /// Hydrodynamic coefficients from a dataset file, relative to the case file.
    Dataset {
        path: String,
        mass: Vec<Vec<f64>>,
        stiffness: Vec<Vec<f64>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        friction: Option<Vec<Vec<f64>>>,
        #[serde(default)]
        damping: DampingDef,
    },
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DampingActionDef {
    #[default]
    Warn,
    Clip,
    Reject,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DampingDef {
    pub action: DampingActionDef,
    pub tolerance: f64,
    /// Value clipped entries are raised to.
    pub minimum: f64,
}

impl Default for DampingDef {
    fn default() -> Self {
        Self {
            action: DampingActionDef::Warn,
            tolerance: 1e-6,
            minimum: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WavesDef {
    Still,
    Regular {
        frequency_hz: f64,
        amplitude_m: f64,
        #[serde(default)]
        phase_deg: f64,
        #[serde(default)]
        direction_deg: f64,
    },
    /// One spectral density value (m²/Hz) per grid frequency.
    Irregular {
        spectral_density: Vec<f64>,
        #[serde(default)]
        direction_deg: f64,
        #[serde(default)]
        phases: PhasesDef,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PhasesDef {
    Random { seed: u64 },
    /// One phase per grid frequency, degrees.
    Specified(Vec<f64>),
}

impl Default for PhasesDef {
    fn default() -> Self {
        PhasesDef::Random { seed: 0 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PtoDef {
    /// Rows map WEC DOFs to PTO DOFs; identity when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinematics: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(default)]
    pub controller: Controller,
    /// Rotary generator drivetrain; an ideal force actuator when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorDrivetrain>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForceDef {
    Mooring {
        name: String,
        stiffness: Vec<Vec<f64>>,
        damping: Vec<Vec<f64>>,
    },
    Drag {
        name: String,
        /// `½ ρ C_d A` per DOF.
        coefficients: Vec<f64>,
    },
}

impl ForceDef {
    pub fn name(&self) -> &str {
        match self {
            ForceDef::Mooring { name, .. } | ForceDef::Drag { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConstraintsDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_limit_n: Option<f64>,
    pub nsubsteps: usize,
}

impl Default for ConstraintsDef {
    fn default() -> Self {
        Self {
            force_limit_n: None,
            nsubsteps: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObjectiveDef {
    pub power: PowerKind,
    pub nsubsteps: usize,
}

impl Default for ObjectiveDef {
    fn default() -> Self {
        Self {
            power: PowerKind::Electrical,
            nsubsteps: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverDef {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub constraint_tolerance: f64,
    pub scaling: ScalingDef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_opt_0: Option<Vec<f64>>,
    /// Time grid refinement of reported signals.
    pub postprocess_nsubsteps: usize,
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-6,
            constraint_tolerance: 1e-6,
            scaling: ScalingDef::default(),
            x_opt_0: None,
            postprocess_nsubsteps: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScalingDef {
    pub x_wec: f64,
    pub x_opt: f64,
    pub objective: f64,
}

impl Default for ScalingDef {
    fn default() -> Self {
        Self {
            x_wec: 1.0,
            x_opt: 1.0,
            objective: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignDef {
    pub strategy: StrategyDef,
    #[serde(default)]
    pub failure: FailurePolicy,
}

/// Swept parameter names address case fields, see
/// [`crate::compile::apply_parameters`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyDef {
    Grid {
        sweeps: Vec<SweepDefinition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threads: Option<usize>,
    },
    NelderMead {
        parameters: Vec<String>,
        initial: Vec<f64>,
        step: Vec<f64>,
        #[serde(default = "default_max_iterations")]
        max_iterations: u64,
    },
}

fn default_max_iterations() -> u64 {
    100
}

impl StrategyDef {
    pub fn parameter_names(&self) -> Vec<&str> {
        match self {
            StrategyDef::Grid { sweeps, .. } => sweeps.iter().map(|s| s.name.as_str()).collect(),
            StrategyDef::NelderMead { parameters, .. } => {
                parameters.iter().map(String::as_str).collect()
            }
        }
    }
}
