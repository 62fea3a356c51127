//! Wave environments as complex amplitudes per frequency and direction.

use std::f64::consts::PI;

use nalgebra::DMatrix;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uom::si::angle::radian;
use uom::si::frequency::hertz;
use uom::si::length::meter;
use wo_core::{Angle, Frequency, Length};

use crate::error::{HydroError, HydroResult};
use crate::fourier;
use crate::FrequencyGrid;

/// How irregular-wave component phases are chosen.
#[derive(Clone, Debug, PartialEq)]
pub enum Phases {
    /// Uniform on `[-π, π)` from a seeded generator.
    Random { seed: u64 },
    /// One phase per grid frequency, rad.
    Specified(Vec<f64>),
}

/// Complex wave amplitude `A(ω_k, β)` in meters on the positive grid frequencies.
///
/// The free-surface elevation is `η(t) = Σ_k Σ_β Re(A(ω_k, β) e^{iω_k t})`.
#[derive(Clone, Debug, PartialEq)]
pub struct Waves {
    grid: FrequencyGrid,
    directions: Vec<f64>,
    amplitude: DMatrix<Complex64>,
}

impl Waves {
    pub fn from_amplitudes(
        grid: FrequencyGrid,
        directions: Vec<f64>,
        amplitude: DMatrix<Complex64>,
    ) -> HydroResult<Self> {
        if amplitude.nrows() != grid.nfreq() {
            return Err(HydroError::DimensionMismatch {
                what: "wave amplitude frequency count",
                expected: grid.nfreq(),
                actual: amplitude.nrows(),
            });
        }
        if amplitude.ncols() != directions.len() {
            return Err(HydroError::DimensionMismatch {
                what: "wave amplitude direction count",
                expected: directions.len(),
                actual: amplitude.ncols(),
            });
        }
        if amplitude.iter().any(|a| !a.re.is_finite() || !a.im.is_finite()) {
            return Err(HydroError::InvalidArg {
                what: "wave amplitudes must be finite",
            });
        }
        Ok(Self {
            grid,
            directions,
            amplitude,
        })
    }

    /// Calm water in a single heading.
    pub fn still(grid: FrequencyGrid) -> Self {
        Self {
            grid,
            directions: vec![0.0],
            amplitude: DMatrix::zeros(grid.nfreq(), 1),
        }
    }

    /// A single harmonic component; `frequency` must lie on the grid.
    pub fn regular(
        grid: FrequencyGrid,
        frequency: Frequency,
        amplitude: Length,
        phase: Angle,
        direction: Angle,
    ) -> HydroResult<Self> {
        let f = frequency.get::<hertz>();
        let k = grid
            .harmonic_index(f)
            .ok_or(HydroError::FrequencyNotOnGrid {
                frequency_hz: f,
                f1_hz: grid.f1(),
                nfreq: grid.nfreq(),
            })?;
        let mut amp = DMatrix::zeros(grid.nfreq(), 1);
        amp[(k - 1, 0)] = Complex64::from_polar(amplitude.get::<meter>(), phase.get::<radian>());
        Self::from_amplitudes(grid, vec![direction.get::<radian>()], amp)
    }

    /// Spectrum-derived components with amplitude `sqrt(2·S(f_k)·Δf)`.
    ///
    /// `spectral_density` holds one value per positive grid frequency, m²/Hz.
    pub fn irregular(
        grid: FrequencyGrid,
        spectral_density: &[f64],
        direction: Angle,
        phases: Phases,
    ) -> HydroResult<Self> {
        let n = grid.nfreq();
        if spectral_density.len() != n {
            return Err(HydroError::DimensionMismatch {
                what: "spectral density values",
                expected: n,
                actual: spectral_density.len(),
            });
        }
        if spectral_density.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(HydroError::InvalidArg {
                what: "spectral density must be finite and non-negative",
            });
        }
        let phase_values = match phases {
            Phases::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..n).map(|_| rng.gen_range(-PI..PI)).collect()
            }
            Phases::Specified(values) => {
                if values.len() != n {
                    return Err(HydroError::DimensionMismatch {
                        what: "wave phases",
                        expected: n,
                        actual: values.len(),
                    });
                }
                values
            }
        };
        let df = grid.f1();
        let amp = DMatrix::from_fn(n, 1, |k, _| {
            Complex64::from_polar((2.0 * spectral_density[k] * df).sqrt(), phase_values[k])
        });
        Self::from_amplitudes(grid, vec![direction.get::<radian>()], amp)
    }

    pub fn grid(&self) -> &FrequencyGrid {
        &self.grid
    }

    pub fn directions(&self) -> &[f64] {
        &self.directions
    }

    /// `nfreq × ndirections` complex amplitudes.
    pub fn amplitude(&self) -> &DMatrix<Complex64> {
        &self.amplitude
    }

    /// Elevation summed over directions, sampled on the `nsubsteps` time grid.
    pub fn elevation(&self, nsubsteps: usize) -> Vec<f64> {
        let total: Vec<Complex64> = self.amplitude.row_iter().map(|row| row.sum()).collect();
        let coeffs = fourier::real_from_complex(0.0, &total);
        fourier::apply(&fourier::time_mat(&self.grid, nsubsteps), &coeffs)
    }

    /// Significant wave height `4·sqrt(m0)` of the discrete spectrum.
    pub fn significant_height(&self) -> f64 {
        let m0: f64 = self.amplitude.iter().map(|a| 0.5 * a.norm_sqr()).sum();
        4.0 * m0.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wo_core::{hz, m, rad};

    fn grid() -> FrequencyGrid {
        FrequencyGrid::new(0.05, 50, false).unwrap()
    }

    #[test]
    fn regular_wave_peaks_at_amplitude() {
        let w = Waves::regular(grid(), hz(0.3), m(0.0625), rad(0.0), rad(0.0)).unwrap();
        assert!((w.amplitude()[(5, 0)].re - 0.0625).abs() < 1e-15);
        let eta = w.elevation(1);
        assert!((eta[0] - 0.0625).abs() < 1e-12);
        let peak = eta.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        assert!((peak - 0.0625).abs() < 1e-9);
    }

    #[test]
    fn regular_wave_off_grid_fails() {
        let err = Waves::regular(grid(), hz(0.31), m(0.1), rad(0.0), rad(0.0)).unwrap_err();
        assert!(matches!(err, HydroError::FrequencyNotOnGrid { .. }));
    }

    #[test]
    fn seeded_phases_are_reproducible() {
        let s = vec![0.01; 50];
        let a = Waves::irregular(grid(), &s, rad(0.0), Phases::Random { seed: 7 }).unwrap();
        let b = Waves::irregular(grid(), &s, rad(0.0), Phases::Random { seed: 7 }).unwrap();
        let c = Waves::irregular(grid(), &s, rad(0.0), Phases::Random { seed: 8 }).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn irregular_amplitudes_follow_spectrum() {
        let s: Vec<f64> = (0..50).map(|k| 0.02 * k as f64).collect();
        let w = Waves::irregular(grid(), &s, rad(0.0), Phases::Specified(vec![0.3; 50])).unwrap();
        for k in 0..50 {
            let expected = (2.0 * s[k] * 0.05).sqrt();
            assert!((w.amplitude()[(k, 0)].norm() - expected).abs() < 1e-12);
        }
        let m0: f64 = s.iter().map(|v| v * 0.05).sum();
        assert!((w.significant_height() - 4.0 * m0.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn wrong_phase_count_is_rejected() {
        let s = vec![0.01; 50];
        let err = Waves::irregular(grid(), &s, rad(0.0), Phases::Specified(vec![0.0; 3]));
        assert!(matches!(err, Err(HydroError::DimensionMismatch { .. })));
    }
}
