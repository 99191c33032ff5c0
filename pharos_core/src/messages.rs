// pharos_core/src/messages.rs

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

// =========================================================================
// == Filter Inputs ==
// =========================================================================

/// A body-frame velocity command driving the prediction step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityCommand {
    /// Forward velocity in m/s.
    pub linear: f64,
    /// Yaw rate in rad/s.
    pub angular: f64,
}

/// A single bearing-range detection of an identified landmark.
///
/// Bearing follows the left-positive convention: a landmark to the robot's
/// left has a positive bearing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkObservation {
    /// Stable identity assigned by the upstream detector.
    pub id: u32,
    /// Distance to the landmark in meters, non-negative.
    pub range: f64,
    /// Angle to the landmark relative to the robot heading, in radians.
    pub bearing: f64,
}

// =========================================================================
// == Filter Outputs (Snapshot Data) ==
// =========================================================================

/// Flat copy of the state vector, emitted after every committed pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub len: usize,
    /// State order: pose (x, y, theta) followed by landmark positions.
    pub values: Vec<f64>,
}

impl StateSnapshot {
    pub fn from_vector(vector: &DVector<f64>) -> Self {
        Self {
            len: vector.len(),
            values: vector.iter().copied().collect(),
        }
    }
}

/// Flat row-major copy of the covariance matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceSnapshot {
    pub rows: usize,
    pub cols: usize,
    /// Row-major: entry (i, j) lives at `i * cols + j`.
    pub values: Vec<f64>,
}

impl CovarianceSnapshot {
    pub fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        let mut values = Vec::with_capacity(matrix.nrows() * matrix.ncols());
        for i in 0..matrix.nrows() {
            for j in 0..matrix.ncols() {
                values.push(matrix[(i, j)]);
            }
        }
        Self {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
            values,
        }
    }
}
