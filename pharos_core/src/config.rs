// pharos_core/src/config.rs

use crate::error::FilterError;
use crate::types::{LANDMARK_DIM, POSE_DIM};
use serde::{Deserialize, Serialize};

/// Every constant the filter is built from. Fixed at startup; the filter
/// never re-reads configuration at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Number of landmark slots in the state vector.
    pub landmark_capacity: usize,
    /// Diagonal of the motion noise covariance R (x, y, theta).
    pub motion_noise_diag: [f64; 3],
    /// Diagonal of the observation noise covariance Q (range, bearing).
    pub observation_noise_diag: [f64; 2],
    /// Large finite variance standing in for "unknown" on landmark blocks.
    /// A true infinity would make the innovation inversion ill-conditioned.
    pub unknown_covariance: f64,
    /// |angular velocity| above which the arc motion model is used.
    pub angular_rate_threshold: f64,
    /// Minimum |det S| for an observation update to be applied.
    pub innovation_det_threshold: f64,
    /// Landmark ids above this are treated as spurious detections.
    pub spurious_id_threshold: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            landmark_capacity: 5,
            motion_noise_diag: [0.05, 0.05, 0.05],
            observation_noise_diag: [0.005, 0.005],
            unknown_covariance: 100.0,
            angular_rate_threshold: 0.001,
            innovation_det_threshold: 1e-4,
            spurious_id_threshold: 10,
        }
    }
}

impl FilterConfig {
    /// Full state dimension: pose plus all landmark slots.
    pub fn state_dim(&self) -> usize {
        POSE_DIM + LANDMARK_DIM * self.landmark_capacity
    }

    /// Validates the configuration once, before the filter is built.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.landmark_capacity == 0 {
            return Err(FilterError::ZeroLandmarkCapacity);
        }
        for &value in self
            .motion_noise_diag
            .iter()
            .chain(self.observation_noise_diag.iter())
        {
            if !value.is_finite() || value <= 0.0 {
                return Err(FilterError::InvalidNoiseVariance { value });
            }
        }
        if !self.unknown_covariance.is_finite() || self.unknown_covariance <= 0.0 {
            return Err(FilterError::InvalidThreshold {
                name: "unknown_covariance",
                value: self.unknown_covariance,
            });
        }
        if !self.angular_rate_threshold.is_finite() || self.angular_rate_threshold < 0.0 {
            return Err(FilterError::InvalidThreshold {
                name: "angular_rate_threshold",
                value: self.angular_rate_threshold,
            });
        }
        if !self.innovation_det_threshold.is_finite() || self.innovation_det_threshold <= 0.0 {
            return Err(FilterError::InvalidThreshold {
                name: "innovation_det_threshold",
                value: self.innovation_det_threshold,
            });
        }
        Ok(())
    }
}
