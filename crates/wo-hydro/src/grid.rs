//! Uniform frequency grid of the pseudo-spectral basis.

use std::f64::consts::PI;

use crate::error::{HydroError, HydroResult};
use wo_core::ensure_positive;

/// Frequencies `f_k = k·f1`, `k = 1..=nfreq`, optionally preceded by `f = 0`.
///
/// The zero-frequency flag only concerns which frequencies hydrodynamic data
/// is tabulated on. The state basis always carries a mean component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrequencyGrid {
    f1: f64,
    nfreq: usize,
    zero_frequency: bool,
}

impl FrequencyGrid {
    pub fn new(f1: f64, nfreq: usize, zero_frequency: bool) -> HydroResult<Self> {
        ensure_positive(f1, "fundamental frequency f1")?;
        if nfreq == 0 {
            return Err(HydroError::InvalidArg {
                what: "nfreq must be at least 1",
            });
        }
        Ok(Self {
            f1,
            nfreq,
            zero_frequency,
        })
    }

    pub fn f1(&self) -> f64 {
        self.f1
    }

    pub fn nfreq(&self) -> usize {
        self.nfreq
    }

    pub fn zero_frequency(&self) -> bool {
        self.zero_frequency
    }

    /// Repeat period of every signal on this grid.
    pub fn period(&self) -> f64 {
        1.0 / self.f1
    }

    pub fn delta_omega(&self) -> f64 {
        2.0 * PI * self.f1
    }

    /// Positive angular frequencies `ω_1..ω_nfreq`.
    pub fn omega_positive(&self) -> Vec<f64> {
        (1..=self.nfreq).map(|k| k as f64 * self.delta_omega()).collect()
    }

    /// Tabulation frequencies in rad/s, including zero when enabled.
    pub fn omega(&self) -> Vec<f64> {
        let mut w = Vec::with_capacity(self.ntab());
        if self.zero_frequency {
            w.push(0.0);
        }
        w.extend(self.omega_positive());
        w
    }

    /// Tabulation frequencies in Hz.
    pub fn frequencies(&self) -> Vec<f64> {
        self.omega().into_iter().map(|w| w / (2.0 * PI)).collect()
    }

    /// Number of tabulated frequencies (`nfreq`, plus one with zero frequency).
    pub fn ntab(&self) -> usize {
        self.nfreq + usize::from(self.zero_frequency)
    }

    /// Fourier coefficients per DOF: `[a0, a1, b1, ..., a_n, b_n]`.
    pub fn ncomponents(&self) -> usize {
        1 + 2 * self.nfreq
    }

    /// Time samples per period at `nsubsteps`-fold refinement.
    pub fn nt(&self, nsubsteps: usize) -> usize {
        self.ncomponents() * nsubsteps.max(1)
    }

    pub fn time(&self, nsubsteps: usize) -> Vec<f64> {
        let nt = self.nt(nsubsteps);
        let dt = self.period() / nt as f64;
        (0..nt).map(|j| j as f64 * dt).collect()
    }

    /// Index `k` (1-based) of a frequency on the grid, if it is a harmonic.
    pub fn harmonic_index(&self, frequency_hz: f64) -> Option<usize> {
        let ratio = frequency_hz / self.f1;
        let k = ratio.round();
        if k < 1.0 || (ratio - k).abs() > 1e-6 * ratio.max(1.0) {
            return None;
        }
        let k = k as usize;
        (k <= self.nfreq).then_some(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_spacing() {
        let g = FrequencyGrid::new(0.05, 50, false).unwrap();
        let w = g.omega();
        assert_eq!(w.len(), 50);
        for pair in w.windows(2) {
            assert!((pair[1] - pair[0] - g.delta_omega()).abs() < 1e-12);
        }
        assert!((w[0] - 2.0 * PI * 0.05).abs() < 1e-12);
    }

    #[test]
    fn zero_frequency_prepends_dc() {
        let g = FrequencyGrid::new(0.1, 3, true).unwrap();
        assert_eq!(g.omega()[0], 0.0);
        assert_eq!(g.ntab(), 4);
        assert_eq!(g.ncomponents(), 7);
    }

    #[test]
    fn time_grid_spans_one_period() {
        let g = FrequencyGrid::new(0.05, 50, false).unwrap();
        let t = g.time(4);
        assert_eq!(t.len(), 404);
        assert_eq!(t[0], 0.0);
        assert!(*t.last().unwrap() < g.period());
    }

    #[test]
    fn harmonic_lookup() {
        let g = FrequencyGrid::new(0.05, 50, false).unwrap();
        assert_eq!(g.harmonic_index(0.3), Some(6));
        assert_eq!(g.harmonic_index(0.33), None);
        assert_eq!(g.harmonic_index(3.0), None);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(FrequencyGrid::new(0.0, 10, false).is_err());
        assert!(FrequencyGrid::new(0.1, 0, false).is_err());
    }
}
