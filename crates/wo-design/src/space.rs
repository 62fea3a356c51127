//! Design parameter sweeps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, DesignResult};

/// Spacing of sweep points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    /// Uniformly spaced points
    #[default]
    Linear,
    /// Logarithmically spaced points; both ends must be positive
    Logarithmic,
}

/// One swept design parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepDefinition {
    pub name: String,
    pub start: f64,
    pub end: f64,
    pub num_points: usize,
    #[serde(default)]
    pub kind: SweepKind,
}

impl SweepDefinition {
    pub fn new(
        name: impl Into<String>,
        start: f64,
        end: f64,
        num_points: usize,
        kind: SweepKind,
    ) -> DesignResult<Self> {
        let sweep = Self {
            name: name.into(),
            start,
            end,
            num_points,
            kind,
        };
        sweep.validate()?;
        Ok(sweep)
    }

    pub fn validate(&self) -> DesignResult<()> {
        let fail = |what| {
            Err(DesignError::InvalidSweep {
                name: self.name.clone(),
                what,
            })
        };
        if !(self.start.is_finite() && self.end.is_finite()) {
            return fail("bounds must be finite");
        }
        if self.num_points == 0 {
            return fail("sweep must have at least 1 point");
        }
        if self.num_points > 1 && (self.start - self.end).abs() < 1e-12 {
            return fail("start and end values must be different");
        }
        if self.kind == SweepKind::Logarithmic && (self.start <= 0.0 || self.end <= 0.0) {
            return fail("logarithmic sweep bounds must be positive");
        }
        Ok(())
    }

    /// All points, endpoints exact.
    pub fn points(&self) -> Vec<f64> {
        if self.num_points <= 1 {
            return vec![self.start];
        }
        let n = self.num_points - 1;
        let mut points: Vec<f64> = match self.kind {
            SweepKind::Linear => {
                let delta = (self.end - self.start) / n as f64;
                (0..=n).map(|i| self.start + i as f64 * delta).collect()
            }
            SweepKind::Logarithmic => {
                let (lo, hi) = (self.start.ln(), self.end.ln());
                let delta = (hi - lo) / n as f64;
                (0..=n).map(|i| (lo + i as f64 * delta).exp()).collect()
            }
        };
        points[n] = self.end;
        points
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Logarithmic => write!(f, "logarithmic"),
        }
    }
}

impl fmt::Display for SweepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} to {} ({} points, {})",
            self.name, self.start, self.end, self.num_points, self.kind
        )
    }
}

/// Cartesian product of sweeps; the last sweep varies fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    pub sweeps: Vec<SweepDefinition>,
}

impl ParameterSpace {
    pub fn new(sweeps: Vec<SweepDefinition>) -> DesignResult<Self> {
        if sweeps.is_empty() {
            return Err(DesignError::InvalidArg {
                what: "parameter space needs at least one sweep",
            });
        }
        for s in &sweeps {
            s.validate()?;
        }
        Ok(Self { sweeps })
    }

    pub fn dims(&self) -> usize {
        self.sweeps.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sweeps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sweeps.iter().map(|s| s.num_points.max(1)).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(lower, upper)` per parameter.
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.sweeps
            .iter()
            .map(|s| (s.start.min(s.end), s.start.max(s.end)))
            .collect()
    }

    pub fn samples(&self) -> Vec<Vec<f64>> {
        let mut samples = vec![Vec::with_capacity(self.dims())];
        for sweep in &self.sweeps {
            let points = sweep.points();
            samples = samples
                .into_iter()
                .flat_map(|prefix| {
                    points.iter().map(move |&p| {
                        let mut next = prefix.clone();
                        next.push(p);
                        next
                    })
                })
                .collect();
        }
        samples
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn samples_cover_product_within_bounds(
            a in 1usize..5,
            b in 1usize..5,
            lo in -10.0f64..0.0,
            width in 0.5f64..10.0,
        ) {
            let space = ParameterSpace::new(vec![
                SweepDefinition::new("a", lo, lo + width, a, SweepKind::Linear).unwrap(),
                SweepDefinition::new("b", 0.1, 0.1 + width, b, SweepKind::Logarithmic).unwrap(),
            ])
            .unwrap();
            let samples = space.samples();
            prop_assert_eq!(samples.len(), a * b);
            for sample in &samples {
                for (x, (l, h)) in sample.iter().zip(space.bounds()) {
                    prop_assert!(*x >= l - 1e-12 && *x <= h + 1e-12);
                }
            }
        }
    }
}
