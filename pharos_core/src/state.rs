// pharos_core/src/state.rs

use crate::config::FilterConfig;
use crate::types::{landmark_index, CovarianceMatrix, StateVector, POSE_DIM};
use nalgebra::Vector2;
use std::f64::consts::FRAC_PI_2;

/// The filter's belief: the augmented mean vector, its covariance, and the
/// per-landmark seen flags.
///
/// Storage and accessors only. The belief is mutated exclusively through the
/// commit step of a prediction or correction pass; prediction and correction
/// themselves work on staged copies.
#[derive(Debug, Clone)]
pub struct BeliefState {
    vector: StateVector,
    covariance: CovarianceMatrix,
    seen: Vec<bool>,
}

impl BeliefState {
    /// Seeds the belief: pose at the origin facing +y (theta = pi/2), all
    /// landmarks unseen with their covariance blocks at the unknown sentinel.
    pub(crate) fn new(config: &FilterConfig) -> Self {
        let dim = config.state_dim();

        let mut vector = StateVector::zeros(dim);
        vector[2] = FRAC_PI_2;

        // Pose block starts fully certain (zero). Every row or column that
        // touches a landmark slot carries the sentinel, matching the
        // pose-landmark cross blocks as well as the landmark block itself.
        let mut covariance = CovarianceMatrix::zeros(dim, dim);
        for i in 0..dim {
            for j in 0..dim {
                if i >= POSE_DIM || j >= POSE_DIM {
                    covariance[(i, j)] = config.unknown_covariance;
                }
            }
        }

        Self {
            vector,
            covariance,
            seen: vec![false; config.landmark_capacity],
        }
    }

    pub fn dim(&self) -> usize {
        self.vector.len()
    }

    pub fn landmark_capacity(&self) -> usize {
        self.seen.len()
    }

    pub fn vector(&self) -> &StateVector {
        &self.vector
    }

    pub fn covariance(&self) -> &CovarianceMatrix {
        &self.covariance
    }

    pub fn x(&self) -> f64 {
        self.vector[0]
    }

    pub fn y(&self) -> f64 {
        self.vector[1]
    }

    pub fn heading(&self) -> f64 {
        self.vector[2]
    }

    /// Estimated position of a landmark slot, if the slot exists.
    pub fn landmark(&self, id: usize) -> Option<Vector2<f64>> {
        if id >= self.seen.len() {
            return None;
        }
        let idx = landmark_index(id);
        Some(Vector2::new(self.vector[idx], self.vector[idx + 1]))
    }

    /// Whether a landmark slot has been initialized from a first sighting.
    pub fn is_seen(&self, id: usize) -> bool {
        self.seen.get(id).copied().unwrap_or(false)
    }

    pub(crate) fn seen_flags(&self) -> &[bool] {
        &self.seen
    }

    /// Commits a prediction pass. Seen flags are untouched: motion never
    /// initializes landmarks.
    pub(crate) fn commit_prediction(&mut self, vector: StateVector, covariance: CovarianceMatrix) {
        self.vector = vector;
        self.covariance = covariance;
    }

    /// Commits a correction pass, including first-sight flags raised while
    /// the batch was staged.
    pub(crate) fn commit_correction(
        &mut self,
        vector: StateVector,
        covariance: CovarianceMatrix,
        seen: Vec<bool>,
    ) {
        self.vector = vector;
        self.covariance = covariance;
        self.seen = seen;
    }
}
