// pharos_core/src/types.rs

use nalgebra::{DMatrix, DVector};

// --- Core Type Aliases ---
pub type StateVector = DVector<f64>;
pub type CovarianceMatrix = DMatrix<f64>;

/// Number of pose components at the head of the state vector: (x, y, theta).
pub const POSE_DIM: usize = 3;
/// Number of components per landmark: (mx, my).
pub const LANDMARK_DIM: usize = 2;

/// State-vector index of the first component of a landmark.
pub fn landmark_index(id: usize) -> usize {
    POSE_DIM + LANDMARK_DIM * id
}
