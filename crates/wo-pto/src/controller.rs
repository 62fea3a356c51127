//! Parametrizations of the PTO force by the control state `x_opt`.
//!
//! - **Unstructured**: the force Fourier coefficients are the control state.
//! - **P / PI / PID**: one gain per PTO DOF and term; the force is
//!   `kp·v + ki·x + kd·a` in the PTO frame.
//!
//! Feedback parametrizations are linear in the PTO motion, so their force
//! is exactly band limited and can be formed in coefficient space.

use serde::{Deserialize, Serialize};
use wo_core::Scalar;
use wo_dynamics::{DynamicsError, DynamicsResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    #[default]
    Unstructured,
    Proportional,
    ProportionalIntegral,
    Pid,
}

/// Motion coefficient blocks of every PTO DOF.
pub struct PtoMotion<'a, D> {
    pub position: &'a [Vec<D>],
    pub velocity: &'a [Vec<D>],
    pub acceleration: &'a [Vec<D>],
}

impl Controller {
    /// Number of gain terms of a feedback controller.
    fn nterms(self) -> usize {
        match self {
            Controller::Unstructured => 0,
            Controller::Proportional => 1,
            Controller::ProportionalIntegral => 2,
            Controller::Pid => 3,
        }
    }

    pub fn is_unstructured(self) -> bool {
        self == Controller::Unstructured
    }

    /// Length of `x_opt` for `npto` PTO DOFs.
    pub fn nstate(self, npto: usize, ncomponents: usize) -> usize {
        match self {
            Controller::Unstructured => npto * ncomponents,
            other => npto * other.nterms(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Controller::Unstructured => "unstructured",
            Controller::Proportional => "p",
            Controller::ProportionalIntegral => "pi",
            Controller::Pid => "pid",
        }
    }

    /// PTO force coefficient blocks `[pto][component]`.
    pub fn force_coefficients<D: Scalar>(
        self,
        motion: &PtoMotion<'_, D>,
        x_opt: &[D],
    ) -> DynamicsResult<Vec<Vec<D>>> {
        let npto = motion.position.len();
        let nc = motion.position.first().map_or(0, Vec::len);
        let expected = self.nstate(npto, nc);
        if x_opt.len() != expected {
            return Err(DynamicsError::DimensionMismatch {
                what: "controller state length",
                expected,
                actual: x_opt.len(),
            });
        }
        if self.is_unstructured() {
            return Ok(x_opt.chunks(nc).map(<[D]>::to_vec).collect());
        }

        let gain = |term: usize, p: usize| x_opt[term * npto + p];
        Ok((0..npto)
            .map(|p| {
                let kp = gain(0, p);
                let mut force: Vec<D> = motion.velocity[p].iter().map(|&v| kp * v).collect();
                if self.nterms() >= 2 {
                    let ki = gain(1, p);
                    for (f, &x) in force.iter_mut().zip(&motion.position[p]) {
                        *f += ki * x;
                    }
                }
                if self.nterms() >= 3 {
                    let kd = gain(2, p);
                    for (f, &a) in force.iter_mut().zip(&motion.acceleration[p]) {
                        *f += kd * a;
                    }
                }
                force
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion() -> (Vec<Vec<f64>>, Vec<Vec<f64>>, Vec<Vec<f64>>) {
        (
            vec![vec![0.1, 1.0, 2.0]],
            vec![vec![0.0, 3.0, -1.0]],
            vec![vec![0.0, -2.0, -6.0]],
        )
    }

    #[test]
    fn state_sizes() {
        assert_eq!(Controller::Unstructured.nstate(2, 5), 10);
        assert_eq!(Controller::Proportional.nstate(2, 5), 2);
        assert_eq!(Controller::ProportionalIntegral.nstate(2, 5), 4);
        assert_eq!(Controller::Pid.nstate(2, 5), 6);
    }

    #[test]
    fn unstructured_force_is_the_state() {
        let (x, v, a) = motion();
        let m = PtoMotion {
            position: &x,
            velocity: &v,
            acceleration: &a,
        };
        let f = Controller::Unstructured
            .force_coefficients(&m, &[4.0, 5.0, 6.0])
            .unwrap();
        assert_eq!(f, vec![vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn pid_combines_all_terms() {
        let (x, v, a) = motion();
        let m = PtoMotion {
            position: &x,
            velocity: &v,
            acceleration: &a,
        };
        let f = Controller::Pid.force_coefficients(&m, &[2.0, 10.0, 0.5]).unwrap();
        // 2·v + 10·x + 0.5·a
        assert_eq!(f, vec![vec![1.0, 15.0, 15.0]]);

        let f = Controller::Proportional.force_coefficients(&m, &[-3.0]).unwrap();
        assert_eq!(f, vec![vec![0.0, -9.0, 3.0]]);
    }

    #[test]
    fn wrong_state_length_is_rejected() {
        let (x, v, a) = motion();
        let m = PtoMotion {
            position: &x,
            velocity: &v,
            acceleration: &a,
        };
        assert!(Controller::ProportionalIntegral.force_coefficients(&m, &[1.0]).is_err());
    }

    #[test]
    fn serde_names() {
        let c: Controller = serde_json::from_str("\"proportional_integral\"").unwrap();
        assert_eq!(c, Controller::ProportionalIntegral);
    }
}
