//! Linear map from WEC DOFs to PTO DOFs.

use nalgebra::DMatrix;
use wo_core::Scalar;
use wo_dynamics::TimeSeries;

use crate::error::{PtoError, PtoResult};

/// `npto × ndof` transformation, full row rank.
#[derive(Clone, Debug, PartialEq)]
pub struct Kinematics {
    matrix: DMatrix<f64>,
}

impl Kinematics {
    pub fn new(matrix: DMatrix<f64>) -> PtoResult<Self> {
        let rows = matrix.nrows();
        if rows == 0 || matrix.ncols() == 0 {
            return Err(PtoError::InvalidArg {
                what: "kinematics matrix must be non-empty",
            });
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(PtoError::InvalidArg {
                what: "kinematics matrix must be finite",
            });
        }
        let rank = matrix.rank(1e-10 * matrix.amax().max(1.0));
        if rank < rows {
            return Err(PtoError::RankDeficient { rank, rows });
        }
        Ok(Self { matrix })
    }

    /// Each PTO DOF follows the WEC DOF of the same index.
    pub fn identity(ndof: usize) -> Self {
        Self {
            matrix: DMatrix::identity(ndof, ndof),
        }
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn npto(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ndof(&self) -> usize {
        self.matrix.ncols()
    }

    /// PTO coefficient blocks `[pto][component]` from a DOF-major WEC vector.
    pub fn to_pto<D: Scalar>(&self, x_wec: &[D], ncomponents: usize) -> Vec<Vec<D>> {
        (0..self.npto())
            .map(|p| {
                let mut block = vec![D::from(0.0); ncomponents];
                for (dof, xd) in x_wec.chunks(ncomponents).enumerate() {
                    let k = self.matrix[(p, dof)];
                    if k != 0.0 {
                        for (b, &x) in block.iter_mut().zip(xd) {
                            *b += x * k;
                        }
                    }
                }
                block
            })
            .collect()
    }

    /// Force series on the WEC DOFs, `Kᵀ f`.
    pub fn to_wec<D: Scalar>(&self, pto_series: &TimeSeries<D>) -> TimeSeries<D> {
        let nt = pto_series.first().map_or(0, Vec::len);
        (0..self.ndof())
            .map(|dof| {
                let mut out = vec![D::from(0.0); nt];
                for (p, series) in pto_series.iter().enumerate() {
                    let k = self.matrix[(p, dof)];
                    if k != 0.0 {
                        for (o, &f) in out.iter_mut().zip(series) {
                            *o += f * k;
                        }
                    }
                }
                out
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_deficient_matrix_is_rejected() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        match Kinematics::new(m) {
            Err(PtoError::RankDeficient { rank: 1, rows: 2 }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wide_matrix_with_full_row_rank_is_accepted() {
        let k = Kinematics::new(DMatrix::from_row_slice(1, 3, &[0.0, 1.0, 0.5])).unwrap();
        assert_eq!((k.npto(), k.ndof()), (1, 3));
    }

    #[test]
    fn maps_are_transposes() {
        let k = Kinematics::new(DMatrix::from_row_slice(1, 2, &[2.0, -1.0])).unwrap();
        let blocks = k.to_pto(&[1.0, 2.0, 3.0, 10.0, 20.0, 30.0], 3);
        assert_eq!(blocks, vec![vec![-8.0, -16.0, -24.0]]);

        let wec = k.to_wec(&vec![vec![1.0, -2.0]]);
        assert_eq!(wec, vec![vec![2.0, -4.0], vec![-1.0, 2.0]]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn power_is_frame_invariant(
            k in prop::collection::vec(-2.0f64..2.0, 2),
            f in prop::collection::vec(-100.0f64..100.0, 5),
            v in prop::collection::vec(-1.0f64..1.0, 10),
        ) {
            prop_assume!(k.iter().any(|x| x.abs() > 1e-3));
            let kin = Kinematics::new(DMatrix::from_row_slice(1, 2, &k)).unwrap();
            // f·(K v) == (Kᵀ f)·v sample by sample.
            let v_wec = vec![v[..5].to_vec(), v[5..].to_vec()];
            let f_wec = kin.to_wec(&vec![f.clone()]);
            for t in 0..5 {
                let v_pto = k[0] * v_wec[0][t] + k[1] * v_wec[1][t];
                let lhs = f[t] * v_pto;
                let rhs = f_wec[0][t] * v_wec[0][t] + f_wec[1][t] * v_wec[1][t];
                prop_assert!((lhs - rhs).abs() <= 1e-9 * (1.0 + lhs.abs()));
            }
        }
    }
}
