//! Finite-difference derivatives and gradient checking.

use nalgebra::{DMatrix, DVector};

use crate::error::SolverResult;
use crate::nlp::Nlp;

/// Jacobian by central differences (`2n` evaluations).
pub fn central_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let m = f(x)?.len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);

        let mut x_plus = x.clone();
        x_plus[j] += dx;
        let f_plus = f(&x_plus)?;

        let mut x_minus = x.clone();
        x_minus[j] -= dx;
        let f_minus = f(&x_minus)?;

        jac.set_column(j, &((f_plus - f_minus) / (2.0 * dx)));
    }

    Ok(jac)
}

/// Largest discrepancy between exact and finite-difference derivatives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientCheck {
    pub max_abs_error: f64,
    /// Relative to `max(1, |exact|)` per entry.
    pub max_rel_error: f64,
}

impl GradientCheck {
    pub fn passes(&self, tolerance: f64) -> bool {
        self.max_rel_error <= tolerance
    }

    fn merge(&mut self, exact: &DMatrix<f64>, approx: &DMatrix<f64>) {
        for (e, a) in exact.iter().zip(approx.iter()) {
            let abs = (e - a).abs();
            self.max_abs_error = self.max_abs_error.max(abs);
            self.max_rel_error = self.max_rel_error.max(abs / e.abs().max(1.0));
        }
    }
}

/// Compare the objective gradient and both constraint Jacobians of `nlp`
/// against central differences at `x`.
pub fn check_gradients<N: Nlp + ?Sized>(
    nlp: &N,
    x: &DVector<f64>,
    epsilon: f64,
) -> SolverResult<GradientCheck> {
    let mut check = GradientCheck {
        max_abs_error: 0.0,
        max_rel_error: 0.0,
    };

    let (_, grad) = nlp.objective_gradient(x)?;
    let fd_grad = central_difference_jacobian(
        x,
        |x| Ok(DVector::from_element(1, nlp.objective(x)?)),
        epsilon,
    )?;
    check.merge(&DMatrix::from_row_slice(1, grad.len(), grad.as_slice()), &fd_grad);

    let (j_eq, j_in) = nlp.constraint_jacobians(x)?;
    let fd_eq = central_difference_jacobian(x, |x| Ok(nlp.constraints(x)?.0), epsilon)?;
    check.merge(&j_eq, &fd_eq);
    let fd_in = central_difference_jacobian(x, |x| Ok(nlp.constraints(x)?.1), epsilon)?;
    check.merge(&j_in, &fd_in);

    Ok(check)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_quadratic() {
        // f(x) = x^2, J = 2*x
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0]))
        };

        let x = DVector::from_element(1, 3.0);
        let jac = central_difference_jacobian(&x, f, 1e-6).unwrap();

        assert!((jac[(0, 0)] - 6.0).abs() < 1e-6);
    }

    struct Circle {
        wrong_gradient: bool,
    }

    impl Nlp for Circle {
        fn nvars(&self) -> usize {
            2
        }

        fn objective(&self, x: &DVector<f64>) -> SolverResult<f64> {
            Ok(x[0] * x[1])
        }

        fn objective_gradient(&self, x: &DVector<f64>) -> SolverResult<(f64, DVector<f64>)> {
            let scale = if self.wrong_gradient { 2.0 } else { 1.0 };
            Ok((x[0] * x[1], DVector::from_vec(vec![scale * x[1], x[0]])))
        }

        fn constraints(&self, x: &DVector<f64>) -> SolverResult<(DVector<f64>, DVector<f64>)> {
            Ok((
                DVector::from_element(1, x[0] * x[0] + x[1] * x[1] - 1.0),
                DVector::zeros(0),
            ))
        }

        fn constraint_jacobians(
            &self,
            x: &DVector<f64>,
        ) -> SolverResult<(DMatrix<f64>, DMatrix<f64>)> {
            Ok((
                DMatrix::from_row_slice(1, 2, &[2.0 * x[0], 2.0 * x[1]]),
                DMatrix::zeros(0, 2),
            ))
        }
    }

    #[test]
    fn exact_derivatives_pass() {
        let x = DVector::from_vec(vec![0.3, -1.2]);
        let check = check_gradients(&Circle { wrong_gradient: false }, &x, 1e-6).unwrap();
        assert!(check.passes(1e-6), "{check:?}");
    }

    #[test]
    fn wrong_gradient_is_flagged() {
        let x = DVector::from_vec(vec![0.3, -1.2]);
        let check = check_gradients(&Circle { wrong_gradient: true }, &x, 1e-6).unwrap();
        assert!(!check.passes(1e-3));
        assert!((check.max_abs_error - 1.2).abs() < 1e-6);
    }
}
