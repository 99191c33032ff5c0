// pharos_core/src/models/observation.rs

use crate::config::FilterConfig;
use crate::messages::LandmarkObservation;
use crate::state::BeliefState;
use crate::types::{landmark_index, CovarianceMatrix, StateVector, LANDMARK_DIM, POSE_DIM};
use crate::utils::angles::normalize_angle;
use log::{trace, warn};
use nalgebra::{DMatrix, DVector};

/// Per-batch accounting of what the correction pass did with each
/// observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Observations whose update was applied.
    pub applied: usize,
    /// Landmarks initialized from their first sighting in this batch.
    pub initialized: usize,
    /// Observations skipped by the innovation stability gate.
    pub skipped_unstable: usize,
    /// Observations discarded before touching state (spurious or
    /// out-of-capacity id, non-finite fields).
    pub discarded: usize,
}

/// Staged output of a correction pass over a whole batch.
#[derive(Debug, Clone)]
pub struct Correction {
    pub vector: StateVector,
    pub covariance: CovarianceMatrix,
    pub(crate) seen: Vec<bool>,
    pub report: BatchReport,
}

/// The bearing-range measurement model: per-landmark initialization,
/// linearized correction, and the numerical-stability gating around the
/// innovation inversion.
#[derive(Debug, Clone)]
pub struct SensorModel {
    /// Observation noise covariance Q, 2 x 2 diagonal.
    noise: DMatrix<f64>,
    landmark_capacity: usize,
    spurious_id_threshold: u32,
    det_threshold: f64,
}

impl SensorModel {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            noise: DMatrix::from_diagonal(&DVector::from_row_slice(
                &config.observation_noise_diag,
            )),
            landmark_capacity: config.landmark_capacity,
            spurious_id_threshold: config.spurious_id_threshold,
            det_threshold: config.innovation_det_threshold,
        }
    }

    /// Runs a batch of observations sequentially against working copies of
    /// the belief. Each applied update feeds the next observation in the
    /// same batch; the caller commits the staged result once the whole
    /// batch has been processed.
    pub fn correct(&self, belief: &BeliefState, batch: &[LandmarkObservation]) -> Correction {
        let dim = belief.dim();
        let mut x = belief.vector().clone();
        let mut p = belief.covariance().clone();
        let mut seen = belief.seen_flags().to_vec();
        let mut report = BatchReport::default();

        for obs in batch {
            if !obs.range.is_finite() || obs.range < 0.0 || !obs.bearing.is_finite() {
                warn!(
                    "discarding malformed observation of landmark {}: range={} bearing={}",
                    obs.id, obs.range, obs.bearing
                );
                report.discarded += 1;
                continue;
            }
            if obs.id > self.spurious_id_threshold {
                warn!("discarding spurious landmark id {}", obs.id);
                report.discarded += 1;
                continue;
            }
            let id = obs.id as usize;
            if id >= self.landmark_capacity {
                warn!(
                    "discarding landmark id {} beyond capacity {}",
                    id, self.landmark_capacity
                );
                report.discarded += 1;
                continue;
            }

            let idx = landmark_index(id);

            // First sighting: place the landmark with the inverse observation
            // model at the current working pose. Happens at most once per
            // landmark for the life of the filter.
            if !seen[id] {
                x[idx] = x[0] + obs.range * (obs.bearing + x[2]).cos();
                x[idx + 1] = x[1] + obs.range * (obs.bearing + x[2]).sin();
                seen[id] = true;
                report.initialized += 1;
                trace!(
                    "initialized landmark {} at ({:.4}, {:.4})",
                    id,
                    x[idx],
                    x[idx + 1]
                );
            }

            let delx = x[idx] - x[0];
            let dely = x[idx + 1] - x[1];
            let q = delx * delx + dely * dely;
            let sq = q.sqrt();

            let z = DVector::from_column_slice(&[obs.range, obs.bearing]);
            let z_hat = DVector::from_column_slice(&[
                sq,
                normalize_angle(dely.atan2(delx) - x[2]),
            ]);
            let innovation = &z - &z_hat;

            // 2 x 5 Jacobian of (range, bearing) w.r.t. [pose, landmark],
            // scaled by 1/q. The heading column only enters the bearing row.
            let mut h = DMatrix::zeros(LANDMARK_DIM, POSE_DIM + LANDMARK_DIM);
            h[(0, 0)] = -sq * delx;
            h[(0, 1)] = -sq * dely;
            h[(0, 3)] = sq * delx;
            h[(0, 4)] = sq * dely;
            h[(1, 0)] = dely;
            h[(1, 1)] = -delx;
            h[(1, 2)] = -q;
            h[(1, 3)] = -dely;
            h[(1, 4)] = delx;
            h /= q;

            // Selection matrix picking the pose block and this landmark's
            // two columns out of the full state.
            let mut fxj = DMatrix::zeros(POSE_DIM + LANDMARK_DIM, dim);
            for i in 0..POSE_DIM {
                fxj[(i, i)] = 1.0;
            }
            fxj[(POSE_DIM, idx)] = 1.0;
            fxj[(POSE_DIM + 1, idx + 1)] = 1.0;

            let h_full = &h * &fxj;
            let s = &h_full * &p * h_full.transpose() + &self.noise;

            // A NaN determinant (degenerate geometry, q = 0) fails the gate
            // the same way a vanishing one does.
            let det = s.determinant();
            if !(det.abs() > self.det_threshold) {
                warn!(
                    "unstable innovation covariance for landmark {} (det {:.3e}), skipping",
                    id, det
                );
                report.skipped_unstable += 1;
                continue;
            }
            let s_inv = match s.try_inverse() {
                Some(inv) => inv,
                None => {
                    warn!("innovation covariance for landmark {} not invertible, skipping", id);
                    report.skipped_unstable += 1;
                    continue;
                }
            };

            let gain = &p * h_full.transpose() * s_inv;
            x += &gain * &innovation;
            p = (DMatrix::identity(dim, dim) - gain * h_full) * p;
            report.applied += 1;

            trace!(
                "applied landmark {}: innovation ({:.4}, {:.4})",
                id,
                innovation[0],
                innovation[1]
            );
        }

        Correction {
            vector: x,
            covariance: p,
            seen,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn model_and_belief() -> (SensorModel, BeliefState) {
        let config = FilterConfig::default();
        (SensorModel::new(&config), BeliefState::new(&config))
    }

    fn obs(id: u32, range: f64, bearing: f64) -> LandmarkObservation {
        LandmarkObservation { id, range, bearing }
    }

    #[test]
    fn first_sight_placement_is_deterministic() {
        let (model, belief) = model_and_belief();
        // Pose (0, 0, pi/2); a landmark dead ahead at range 2 lands at (0, 2).
        let correction = model.correct(&belief, &[obs(2, 2.0, 0.0)]);

        let idx = landmark_index(2);
        assert_abs_diff_eq!(correction.vector[idx], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(correction.vector[idx + 1], 2.0, epsilon = 1e-12);
        assert!(correction.seen[2]);
        assert_eq!(correction.report.initialized, 1);
        assert_eq!(correction.report.applied, 1);
    }

    #[test]
    fn spurious_id_alters_nothing() {
        let (model, belief) = model_and_belief();
        let correction = model.correct(&belief, &[obs(1023, 1.0, 0.0)]);

        assert_eq!(&correction.vector, belief.vector());
        assert_eq!(&correction.covariance, belief.covariance());
        assert!(correction.seen.iter().all(|&s| !s));
        assert_eq!(correction.report.discarded, 1);
        assert_eq!(correction.report.applied, 0);
    }

    #[test]
    fn discards_id_beyond_capacity() {
        // Ids in [capacity, spurious threshold] would pass the spurious
        // guard alone but index past the landmark block; the capacity bound
        // rejects them before any state is touched.
        let (model, belief) = model_and_belief();
        let correction = model.correct(&belief, &[obs(7, 1.0, 0.0)]);

        assert_eq!(&correction.vector, belief.vector());
        assert_eq!(&correction.covariance, belief.covariance());
        assert_eq!(correction.report.discarded, 1);
    }

    #[test]
    fn discards_non_finite_fields() {
        let (model, belief) = model_and_belief();
        let batch = [
            obs(0, f64::NAN, 0.0),
            obs(1, 1.0, f64::INFINITY),
            obs(2, -1.0, 0.0),
        ];
        let correction = model.correct(&belief, &batch);

        assert_eq!(&correction.vector, belief.vector());
        assert_eq!(correction.report.discarded, 3);
        assert!(correction.seen.iter().all(|&s| !s));
    }

    #[test]
    fn unstable_gate_leaves_state_bit_for_bit_unchanged() {
        let config = FilterConfig::default();
        let model = SensorModel::new(&config);
        let mut belief = BeliefState::new(&config);

        // Mark landmark 0 as already seen, sitting exactly on the robot:
        // q = 0 degenerates the Jacobian and the gate must skip the update.
        let vector = belief.vector().clone();
        let covariance = belief.covariance().clone();
        let mut seen = belief.seen_flags().to_vec();
        seen[0] = true;
        belief.commit_correction(vector, covariance, seen);

        let correction = model.correct(&belief, &[obs(0, 1.0, 0.0)]);
        assert_eq!(&correction.vector, belief.vector());
        assert_eq!(&correction.covariance, belief.covariance());
        assert_eq!(correction.report.skipped_unstable, 1);
        assert_eq!(correction.report.applied, 0);
    }

    #[test]
    fn reobservation_never_reinitializes() {
        let (model, belief) = model_and_belief();

        let first = model.correct(&belief, &[obs(0, 1.0, 0.0)]);
        let mut belief = belief;
        belief.commit_correction(first.vector, first.covariance, first.seen);
        let placed = belief.landmark(0).unwrap();

        // Same observation again: information gain nudges the estimate, the
        // initialization formula never re-runs.
        let second = model.correct(&belief, &[obs(0, 1.0, 0.0)]);
        assert_eq!(second.report.initialized, 0);
        assert!(second.seen[0]);

        let idx = landmark_index(0);
        assert!((second.vector[idx] - placed.x).abs() < 0.1);
        assert!((second.vector[idx + 1] - placed.y).abs() < 0.1);
    }

    #[test]
    fn second_sighting_in_same_batch_is_not_reinitialized() {
        let (model, belief) = model_and_belief();
        let correction = model.correct(&belief, &[obs(0, 1.0, 0.0), obs(0, 1.0, 0.0)]);

        assert_eq!(correction.report.initialized, 1);
        assert_eq!(correction.report.applied, 2);
        assert!(correction.seen[0]);
    }

    #[test]
    fn sequential_correction_feeds_later_observations() {
        let (model, belief) = model_and_belief();
        let batch = [obs(0, 1.0, 0.0), obs(1, 2.0, FRAC_PI_2)];
        let correction = model.correct(&belief, &batch);

        // Both landmarks initialized; the second against the pose already
        // nudged by the first update.
        assert!(correction.seen[0] && correction.seen[1]);
        assert_eq!(correction.report.initialized, 2);
    }
}
