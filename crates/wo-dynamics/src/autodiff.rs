//! Forward-mode differentiation drivers.
//!
//! One pass per input: the input is seeded with a unit tangent and every
//! output's dual part is read back as one Jacobian column.

use nalgebra::{DMatrix, DVector};
use wo_core::{Dual, derivative, seed_vector, value};

use crate::error::{DynamicsError, DynamicsResult};

/// Values and Jacobian (`nout × z.len()`) of a vector function.
pub fn jacobian<F>(z: &[f64], mut f: F) -> DynamicsResult<(Vec<f64>, DMatrix<f64>)>
where
    F: FnMut(&[Dual]) -> DynamicsResult<Vec<Dual>>,
{
    let lifted: Vec<Dual> = z.iter().map(|&v| Dual::from(v)).collect();
    let values: Vec<f64> = f(&lifted)?.into_iter().map(value).collect();
    let mut jac = DMatrix::zeros(values.len(), z.len());
    for j in 0..z.len() {
        let out = f(&seed_vector(z, j))?;
        if out.len() != values.len() {
            return Err(DynamicsError::DimensionMismatch {
                what: "differentiated output length",
                expected: values.len(),
                actual: out.len(),
            });
        }
        for (i, d) in out.into_iter().enumerate() {
            jac[(i, j)] = derivative(d);
        }
    }
    Ok((values, jac))
}

/// Value and gradient of a scalar function.
pub fn gradient<F>(z: &[f64], mut f: F) -> DynamicsResult<(f64, DVector<f64>)>
where
    F: FnMut(&[Dual]) -> DynamicsResult<Dual>,
{
    let mut grad = DVector::zeros(z.len());
    let mut fx = 0.0;
    if z.is_empty() {
        let lifted: Vec<Dual> = Vec::new();
        return Ok((value(f(&lifted)?), grad));
    }
    for j in 0..z.len() {
        let out = f(&seed_vector(z, j))?;
        fx = value(out);
        grad[j] = derivative(out);
    }
    Ok((fx, grad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_dual::DualNum;

    #[test]
    fn jacobian_of_polynomial_map() {
        let (v, j) = jacobian(&[2.0, 3.0], |x| Ok(vec![x[0] * x[1], x[0] * x[0] - x[1]])).unwrap();
        assert_eq!(v, vec![6.0, 1.0]);
        assert_eq!(j[(0, 0)], 3.0);
        assert_eq!(j[(0, 1)], 2.0);
        assert_eq!(j[(1, 0)], 4.0);
        assert_eq!(j[(1, 1)], -1.0);
    }

    #[test]
    fn gradient_of_sine() {
        let (v, g) = gradient(&[0.0, 1.0], |x| Ok(x[0].sin() + x[1] * 2.0)).unwrap();
        assert!((v - 2.0).abs() < 1e-15);
        assert!((g[0] - 1.0).abs() < 1e-15);
        assert_eq!(g[1], 2.0);
    }

    #[test]
    fn errors_propagate() {
        let res = gradient(&[1.0], |_| {
            Err(DynamicsError::InvalidArg {
                what: "always fails",
            })
        });
        assert!(res.is_err());
    }
}
