// pharos_core/src/models/motion.rs

use crate::config::FilterConfig;
use crate::messages::VelocityCommand;
use crate::state::BeliefState;
use crate::types::{CovarianceMatrix, StateVector, POSE_DIM};
use crate::utils::angles::normalize_angle;
use log::trace;
use nalgebra::{DMatrix, DVector};

/// Staged output of a prediction pass, committed by the estimator only when
/// no correction batch is in flight.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub vector: StateVector,
    pub covariance: CovarianceMatrix,
}

/// The nonlinear unicycle motion model and its linearization.
///
/// Holds the pieces that never change after construction: the motion noise
/// covariance R, the pose selection matrix Fx mapping pose-space Jacobians
/// into full-state space, and the angular-rate branch threshold.
#[derive(Debug, Clone)]
pub struct MotionModel {
    /// 3 x N selection matrix, identity in the pose columns.
    fx: DMatrix<f64>,
    /// Motion noise covariance R, 3 x 3 diagonal.
    noise: DMatrix<f64>,
    angular_rate_threshold: f64,
}

impl MotionModel {
    pub fn new(config: &FilterConfig) -> Self {
        let dim = config.state_dim();

        let mut fx = DMatrix::zeros(POSE_DIM, dim);
        for i in 0..POSE_DIM {
            fx[(i, i)] = 1.0;
        }

        let noise = DMatrix::from_diagonal(&DVector::from_row_slice(&config.motion_noise_diag));

        Self {
            fx,
            noise,
            angular_rate_threshold: config.angular_rate_threshold,
        }
    }

    /// Predicts the mean and covariance `dt` seconds ahead under a velocity
    /// command. Pure: the caller decides whether the result is committed.
    ///
    /// Angular rates inside the threshold band take the straight-line
    /// approximation, a deliberate choice rather than an error: the arc
    /// radius v/w degenerates as w approaches zero.
    pub fn predict(&self, belief: &BeliefState, command: &VelocityCommand, dt: f64) -> Prediction {
        let x = belief.vector();
        let theta = x[2];
        let mut vector = x.clone();

        // The same branch condition governs the mean update and the Jacobian
        // below; the two must stay consistent.
        let (dx_dtheta, dy_dtheta) = if command.angular.abs() > self.angular_rate_threshold {
            let r = command.linear / command.angular;
            let turned = theta + command.angular * dt;

            vector[0] = x[0] + (-r * theta.sin() + r * turned.sin());
            vector[1] = x[1] + (r * theta.cos() - r * turned.cos());
            vector[2] = turned;

            (
                -r * theta.cos() + r * turned.cos(),
                -r * theta.sin() + r * turned.sin(),
            )
        } else {
            let dist = command.linear * dt;

            vector[0] = x[0] - dist * theta.cos();
            vector[1] = x[1] + dist * theta.sin();
            // Heading unchanged on the straight branch.

            (dist * theta.sin(), dist * theta.cos())
        };

        vector[2] = normalize_angle(vector[2]);

        // Expand the pose-space Jacobian to full-state width:
        // Gt = I + Fx^T * J * Fx, with ones on the diagonal supplied by I.
        let dim = belief.dim();
        let mut pose_jacobian = DMatrix::zeros(POSE_DIM, POSE_DIM);
        pose_jacobian[(0, 2)] = dx_dtheta;
        pose_jacobian[(1, 2)] = dy_dtheta;

        let gt = DMatrix::identity(dim, dim) + self.fx.transpose() * &pose_jacobian * &self.fx;
        let covariance =
            &gt * belief.covariance() * gt.transpose() + self.fx.transpose() * &self.noise * &self.fx;

        trace!(
            "predicted pose x={:.4} y={:.4} theta={:.4} (dt={:.4})",
            vector[0],
            vector[1],
            vector[2],
            dt
        );

        Prediction { vector, covariance }
    }
}
