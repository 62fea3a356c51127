use crate::WoError;

/// Floating point type used throughout the workspace
pub type Real = f64;

/// Absolute and relative tolerance pair
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, WoError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(WoError::NonFinite { what, value: v })
    }
}

/// Returns the first non-finite entry, if any.
pub fn ensure_all_finite(values: &[Real], what: &'static str) -> Result<(), WoError> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(&value) => Err(WoError::NonFinite { what, value }),
        None => Ok(()),
    }
}

pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, WoError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(WoError::NotPositive { what, value: v })
    }
}

/// Largest absolute value in a slice (0 for an empty slice).
pub fn max_abs(values: &[Real]) -> Real {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("not finite"));
    }

    #[test]
    fn ensure_all_finite_reports_first_bad_value() {
        assert!(ensure_all_finite(&[1.0, 2.0], "ok").is_ok());
        let err = ensure_all_finite(&[1.0, Real::INFINITY, Real::NAN], "vec").unwrap_err();
        match err {
            WoError::NonFinite { what, value } => {
                assert_eq!(what, "vec");
                assert!(value.is_infinite());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn ensure_positive_rejects_zero() {
        assert_eq!(
            ensure_positive(0.0, "f1"),
            Err(WoError::NotPositive { what: "f1", value: 0.0 })
        );
        assert_eq!(ensure_positive(0.5, "f1").unwrap(), 0.5);
    }

    #[test]
    fn max_abs_of_mixed_signs() {
        assert_eq!(max_abs(&[]), 0.0);
        assert_eq!(max_abs(&[1.0, -3.0, 2.0]), 3.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn nearly_equal_is_symmetric(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let tol = Tolerances { abs: 1e-9, rel: 1e-6 };
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
            prop_assert!(nearly_equal(a, a, tol));
        }
    }
}
