//! Frequency- and time-domain views of a solved WEC state.
//!
//! Post-processing only reads [`SolveResults`]; every signal is recomputed
//! from the optimal coefficients.

use std::collections::BTreeMap;

use num_complex::Complex64;
use wo_dynamics::Wec;
use wo_hydro::{Waves, fourier};

use crate::error::SolverResult;
use crate::solve::SolveResults;

/// One physical quantity, one channel per DOF (or per PTO DOF).
#[derive(Clone, Debug, PartialEq)]
pub struct Signal<T> {
    pub unit: &'static str,
    pub channels: Vec<Vec<T>>,
}

impl Signal<f64> {
    /// Largest absolute sample over all channels.
    pub fn peak(&self) -> f64 {
        self.channels
            .iter()
            .flatten()
            .fold(0.0, |acc: f64, v| acc.max(v.abs()))
    }

    /// Time mean per channel.
    pub fn mean(&self) -> Vec<f64> {
        self.channels
            .iter()
            .map(|c| c.iter().sum::<f64>() / c.len().max(1) as f64)
            .collect()
    }
}

/// Complex amplitudes on `[0, f1, 2f1, …]`; the zero-frequency entry holds
/// the mean.
#[derive(Clone, Debug, Default)]
pub struct FrequencySignals {
    pub frequency_hz: Vec<f64>,
    pub channel_names: Vec<String>,
    pub signals: BTreeMap<String, Signal<Complex64>>,
}

/// Samples on the `nsubsteps` time grid of one period.
#[derive(Clone, Debug, Default)]
pub struct TimeSignals {
    pub time_s: Vec<f64>,
    pub channel_names: Vec<String>,
    pub signals: BTreeMap<String, Signal<f64>>,
}

impl FrequencySignals {
    pub fn get(&self, name: &str) -> Option<&Signal<Complex64>> {
        self.signals.get(name)
    }

    /// Adds a signal from DOF-major real coefficient blocks.
    pub fn insert_coefficients(&mut self, name: &str, unit: &'static str, blocks: &[Vec<f64>]) {
        let channels = blocks.iter().map(|b| complex_spectrum(b)).collect();
        self.signals
            .insert(name.to_string(), Signal { unit, channels });
    }
}

impl TimeSignals {
    pub fn get(&self, name: &str) -> Option<&Signal<f64>> {
        self.signals.get(name)
    }

    pub fn insert(&mut self, name: &str, unit: &'static str, channels: Vec<Vec<f64>>) {
        self.signals
            .insert(name.to_string(), Signal { unit, channels });
    }
}

/// `[mean, X_1, …, X_n]` from `[a0, a1, b1, …]`.
pub fn complex_spectrum(coeffs: &[f64]) -> Vec<Complex64> {
    let (mean, amplitudes) = fourier::complex_from_real(coeffs);
    std::iter::once(Complex64::new(mean, 0.0))
        .chain(amplitudes)
        .collect()
}

/// Splits a DOF-major coefficient vector into per-DOF blocks.
pub fn coefficient_blocks(x: &[f64], ncomponents: usize) -> Vec<Vec<f64>> {
    x.chunks(ncomponents).map(<[f64]>::to_vec).collect()
}

/// Position, velocity, acceleration, excitation force and every named
/// additional force, in both domains.
pub fn postprocess(
    wec: &Wec,
    results: &SolveResults,
    waves: &Waves,
    nsubsteps: usize,
) -> SolverResult<(FrequencySignals, TimeSignals)> {
    let grid = wec.grid();
    let nc = wec.ncomponents();
    let x_wec: &[f64] = &results.x_wec;
    let x_opt: &[f64] = &results.x_opt;
    let deriv = fourier::derivative_mat(grid);

    let position = coefficient_blocks(x_wec, nc);
    let velocity: Vec<Vec<f64>> = position.iter().map(|p| fourier::apply(&deriv, p)).collect();
    let acceleration: Vec<Vec<f64>> =
        velocity.iter().map(|v| fourier::apply(&deriv, v)).collect();
    let excitation = coefficient_blocks(&wec.excitation_coefficients(waves)?, nc);

    let mut fd = FrequencySignals {
        frequency_hz: std::iter::once(0.0).chain(grid.frequencies()).collect(),
        channel_names: wec.dof_names().to_vec(),
        signals: BTreeMap::new(),
    };
    fd.insert_coefficients("position", "m", &position);
    fd.insert_coefficients("velocity", "m/s", &velocity);
    fd.insert_coefficients("acceleration", "m/s^2", &acceleration);
    fd.insert_coefficients("excitation_force", "N", &excitation);

    let mut td = TimeSignals {
        time_s: grid.time(nsubsteps),
        channel_names: wec.dof_names().to_vec(),
        signals: BTreeMap::new(),
    };
    let args = wec.args(x_wec, x_opt, waves, nsubsteps);
    td.insert("position", "m", args.position());
    td.insert("velocity", "m/s", args.velocity());
    td.insert("acceleration", "m/s^2", args.acceleration());
    td.insert(
        "excitation_force",
        "N",
        excitation.iter().map(|e| args.synthesize(e)).collect(),
    );

    let analysis = &wec.ops(1).analysis;
    for name in wec.forces().keys() {
        let coarse = wec.force_time_series(name, x_wec, x_opt, waves, 1)?;
        let blocks: Vec<Vec<f64>> = coarse.iter().map(|s| fourier::apply(analysis, s)).collect();
        fd.insert_coefficients(name, "N", &blocks);
        td.insert(name, "N", wec.force_time_series(name, x_wec, x_opt, waves, nsubsteps)?);
    }

    Ok((fd, td))
}
