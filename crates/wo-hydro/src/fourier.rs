//! Truncated real Fourier basis.
//!
//! A signal on the grid is stored per DOF as `[a0, a1, b1, ..., a_n, b_n]`:
//!
//! `x(t) = a0 + Σ_k a_k cos(ω_k t) + b_k sin(ω_k t)`
//!
//! The matching complex amplitude is `X_k = a_k − i b_k`, so that
//! `x(t) = a0 + Σ_k Re(X_k e^{iω_k t})`.

use nalgebra::DMatrix;
use num_complex::Complex64;
use wo_core::Scalar;

use crate::FrequencyGrid;

/// Synthesis matrix (`nt × ncomponents`) mapping coefficients to samples.
pub fn time_mat(grid: &FrequencyGrid, nsubsteps: usize) -> DMatrix<f64> {
    let t = grid.time(nsubsteps);
    let w = grid.omega_positive();
    let nc = grid.ncomponents();
    DMatrix::from_fn(t.len(), nc, |j, c| {
        if c == 0 {
            1.0
        } else {
            let k = (c - 1) / 2;
            let phase = w[k] * t[j];
            if c % 2 == 1 { phase.cos() } else { phase.sin() }
        }
    })
}

/// Analysis matrix (`ncomponents × nt`) projecting samples onto the basis.
///
/// Every supported refinement has at least `2·nfreq + 1` samples per period, so
/// discrete orthogonality holds and `analysis_mat · time_mat` is the identity.
pub fn analysis_mat(grid: &FrequencyGrid, nsubsteps: usize) -> DMatrix<f64> {
    let synth = time_mat(grid, nsubsteps);
    let nt = synth.nrows() as f64;
    DMatrix::from_fn(synth.ncols(), synth.nrows(), |c, j| {
        let scale = if c == 0 { 1.0 / nt } else { 2.0 / nt };
        scale * synth[(j, c)]
    })
}

/// Time derivative in coefficient space (`ncomponents × ncomponents`).
pub fn derivative_mat(grid: &FrequencyGrid) -> DMatrix<f64> {
    let nc = grid.ncomponents();
    let mut d = DMatrix::zeros(nc, nc);
    for (k, w) in grid.omega_positive().into_iter().enumerate() {
        let ia = 1 + 2 * k;
        let ib = ia + 1;
        // d/dt (a cos + b sin) = (w b) cos + (-w a) sin
        d[(ia, ib)] = w;
        d[(ib, ia)] = -w;
    }
    d
}

/// Matrix-vector product for any scalar type.
pub fn apply<D: Scalar>(mat: &DMatrix<f64>, x: &[D]) -> Vec<D> {
    debug_assert_eq!(mat.ncols(), x.len());
    (0..mat.nrows())
        .map(|r| {
            let mut acc = D::from(0.0);
            for (c, &xc) in x.iter().enumerate() {
                let m = mat[(r, c)];
                if m != 0.0 {
                    acc += xc * m;
                }
            }
            acc
        })
        .collect()
}

/// Applies `mat` to every DOF block of a DOF-major coefficient vector.
pub fn apply_per_dof<D: Scalar>(mat: &DMatrix<f64>, x: &[D], ndof: usize) -> Vec<Vec<D>> {
    let block = mat.ncols();
    debug_assert_eq!(x.len(), block * ndof);
    x.chunks(block).map(|xd| apply(mat, xd)).collect()
}

/// Real coefficients `[a0, a1, b1, ...]` from a mean and complex amplitudes.
pub fn real_from_complex(mean: f64, amplitudes: &[Complex64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(1 + 2 * amplitudes.len());
    out.push(mean);
    for x in amplitudes {
        out.push(x.re);
        out.push(-x.im);
    }
    out
}

/// Mean and complex amplitudes from real coefficients `[a0, a1, b1, ...]`.
pub fn complex_from_real(coeffs: &[f64]) -> (f64, Vec<Complex64>) {
    let mean = coeffs.first().copied().unwrap_or(0.0);
    let amplitudes = coeffs
        .get(1..)
        .unwrap_or(&[])
        .chunks(2)
        .map(|ab| Complex64::new(ab[0], -ab.get(1).copied().unwrap_or(0.0)))
        .collect();
    (mean, amplitudes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> FrequencyGrid {
        FrequencyGrid::new(0.1, 4, false).unwrap()
    }

    #[test]
    fn synthesis_of_single_cosine() {
        let g = grid();
        let mut x = vec![0.0; g.ncomponents()];
        x[3] = 2.0; // a2
        let samples = apply(&time_mat(&g, 1), &x);
        let t = g.time(1);
        for (s, tj) in samples.iter().zip(t) {
            let expected = 2.0 * (2.0 * g.delta_omega() * tj).cos();
            assert!((s - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn analysis_inverts_synthesis() {
        let g = grid();
        for nsub in [1, 2, 5] {
            let prod = analysis_mat(&g, nsub) * time_mat(&g, nsub);
            let eye = DMatrix::<f64>::identity(g.ncomponents(), g.ncomponents());
            assert!((prod - eye).amax() < 1e-12, "nsubsteps = {nsub}");
        }
    }

    #[test]
    fn derivative_of_sine_is_cosine() {
        let g = grid();
        let mut x = vec![0.0; g.ncomponents()];
        x[2] = 1.0; // b1: sin(w1 t)
        let dx = apply(&derivative_mat(&g), &x);
        assert!((dx[1] - g.delta_omega()).abs() < 1e-12);
        assert_eq!(dx[2], 0.0);
    }

    #[test]
    fn complex_conversion_matches_convention() {
        let amps = vec![Complex64::new(1.0, -2.0), Complex64::new(0.0, 0.5)];
        let real = real_from_complex(0.25, &amps);
        assert_eq!(real, vec![0.25, 1.0, 2.0, 0.0, -0.5]);
        let (mean, back) = complex_from_real(&real);
        assert_eq!(mean, 0.25);
        assert_eq!(back, amps);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn time_domain_round_trip(
            coeffs in prop::collection::vec(-10.0f64..10.0, 13),
            nsub in 1usize..4,
        ) {
            let g = FrequencyGrid::new(0.05, 6, false).unwrap();
            let samples = apply(&time_mat(&g, nsub), &coeffs);
            let back = apply(&analysis_mat(&g, nsub), &samples);
            for (a, b) in coeffs.iter().zip(&back) {
                prop_assert!((a - b).abs() < 1e-9);
            }
        }

        #[test]
        fn nested_refinement_never_hides_peaks(
            coeffs in prop::collection::vec(-5.0f64..5.0, 9),
            nsub in 1usize..4,
            factor in 2usize..4,
        ) {
            let g = FrequencyGrid::new(0.1, 4, false).unwrap();
            let peak = |n: usize| {
                apply(&time_mat(&g, n), &coeffs)
                    .into_iter()
                    .fold(0.0f64, |m, v| m.max(v.abs()))
            };
            prop_assert!(peak(nsub * factor) >= peak(nsub) - 1e-12);
        }
    }
}
