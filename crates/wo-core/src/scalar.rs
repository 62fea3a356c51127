//! Scalar bound for code evaluated on plain values and on dual numbers.
//!
//! Force, constraint and objective callables are written once, generically
//! over [`Scalar`]. Evaluating them on `f64` yields values; evaluating them on
//! [`Dual`] with one seeded input yields one exact directional derivative.

pub use num_dual::Dual64 as Dual;

/// Numeric type accepted by differentiable callables.
pub trait Scalar: num_dual::DualNum<f64> + Copy + Send + Sync + 'static {}

impl<T: num_dual::DualNum<f64> + Copy + Send + Sync + 'static> Scalar for T {}

/// Lift a plain value into a dual number with the given tangent.
#[inline]
pub fn seeded(value: f64, tangent: f64) -> Dual {
    Dual::new(value, tangent)
}

#[inline]
pub fn value(d: Dual) -> f64 {
    d.re
}

#[inline]
pub fn derivative(d: Dual) -> f64 {
    d.eps
}

/// Seeds `x[index]` with a unit tangent and lifts every other entry as a constant.
pub fn seed_vector(x: &[f64], index: usize) -> Vec<Dual> {
    x.iter()
        .enumerate()
        .map(|(i, &v)| if i == index { seeded(v, 1.0) } else { Dual::from(v) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic<D: Scalar>(x: D) -> D {
        x * x * x - x * 2.0
    }

    #[test]
    fn plain_values_pass_through() {
        assert_eq!(cubic(2.0_f64), 4.0);
    }

    #[test]
    fn dual_gives_exact_derivative() {
        let d = cubic(seeded(2.0, 1.0));
        assert_eq!(value(d), 4.0);
        assert_eq!(derivative(d), 10.0);
    }

    #[test]
    fn seed_vector_marks_one_direction() {
        let v = seed_vector(&[1.0, 2.0, 3.0], 1);
        assert_eq!(v.iter().map(|d| derivative(*d)).collect::<Vec<_>>(), vec![0.0, 1.0, 0.0]);
        assert_eq!(value(v[2]), 3.0);
    }
}
