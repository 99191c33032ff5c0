// pharos_core/src/estimation/mod.rs

use crate::config::FilterConfig;
use crate::error::FilterError;
use crate::messages::{CovarianceSnapshot, LandmarkObservation, StateSnapshot, VelocityCommand};
use crate::models::motion::MotionModel;
use crate::models::observation::{BatchReport, SensorModel};
use crate::state::BeliefState;
use log::{debug, trace, warn};

/// Which pass currently owns the canonical belief.
///
/// Prediction may only commit while the filter is idle; a correction batch
/// holds the phase for its whole duration, not per observation. A caller
/// serialized by `&mut self` can never observe `Correcting` from outside a
/// batch, so the phase is the explicit form of the reentrancy guard rather
/// than a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Correcting,
}

/// The EKF-SLAM estimation service: one belief over robot pose and landmark
/// positions, updated by velocity commands and bearing-range observation
/// batches.
///
/// The service owns the belief exclusively. External consumers read
/// snapshots after a commit; nothing outside `predict` and `correct`
/// mutates the state.
pub struct EkfSlam {
    config: FilterConfig,
    belief: BeliefState,
    motion: MotionModel,
    sensor: SensorModel,
    phase: Phase,
    /// Stamp of the last accepted command, seconds since construction.
    prev_stamp: f64,
}

impl EkfSlam {
    /// Builds the filter from a validated configuration. The belief starts
    /// at the origin facing +y with every landmark unknown.
    pub fn new(config: FilterConfig) -> Result<Self, FilterError> {
        config.validate()?;
        let belief = BeliefState::new(&config);
        let motion = MotionModel::new(&config);
        let sensor = SensorModel::new(&config);
        Ok(Self {
            config,
            belief,
            motion,
            sensor,
            phase: Phase::Idle,
            prev_stamp: 0.0,
        })
    }

    /// Runs a prediction pass for a velocity command stamped `stamp` seconds
    /// after filter construction. The elapsed time is measured against the
    /// previous accepted command; the first command measures from
    /// construction.
    ///
    /// Returns whether the prediction was committed, so the adapter layer
    /// knows to publish a snapshot. Predictions are dropped, not queued,
    /// when a correction batch is in flight. Commands with non-finite
    /// fields or a non-monotonic stamp are rejected without touching the
    /// stamp bookkeeping.
    pub fn predict(&mut self, command: &VelocityCommand, stamp: f64) -> bool {
        if !command.linear.is_finite() || !command.angular.is_finite() || !stamp.is_finite() {
            warn!(
                "rejecting malformed velocity command: linear={} angular={} stamp={}",
                command.linear, command.angular, stamp
            );
            return false;
        }
        let dt = stamp - self.prev_stamp;
        if dt < 0.0 {
            warn!("rejecting velocity command with backwards stamp {stamp}");
            return false;
        }
        self.prev_stamp = stamp;

        let prediction = self.motion.predict(&self.belief, command, dt);

        if self.phase != Phase::Idle {
            debug!("correction batch in flight, dropping motion update");
            return false;
        }
        self.belief
            .commit_prediction(prediction.vector, prediction.covariance);
        true
    }

    /// Runs a correction pass over a whole observation batch and commits
    /// the result. The phase is held for the duration of the batch.
    pub fn correct(&mut self, batch: &[LandmarkObservation]) -> BatchReport {
        self.phase = Phase::Correcting;
        trace!(
            "correcting batch of {} observation(s) from pose ({:.4}, {:.4}, {:.4})",
            batch.len(),
            self.belief.x(),
            self.belief.y(),
            self.belief.heading()
        );

        let correction = self.sensor.correct(&self.belief, batch);
        let report = correction.report;
        self.belief
            .commit_correction(correction.vector, correction.covariance, correction.seen);

        self.phase = Phase::Idle;
        trace!(
            "committed correction: {} applied, {} initialized, {} unstable, {} discarded",
            report.applied,
            report.initialized,
            report.skipped_unstable,
            report.discarded
        );
        report
    }

    // --- Read accessors ---

    pub fn belief(&self) -> &BeliefState {
        &self.belief
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn state_snapshot(&self) -> StateSnapshot {
        StateSnapshot::from_vector(self.belief.vector())
    }

    pub fn covariance_snapshot(&self) -> CovarianceSnapshot {
        CovarianceSnapshot::from_matrix(self.belief.covariance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn command(linear: f64, angular: f64) -> VelocityCommand {
        VelocityCommand { linear, angular }
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = FilterConfig {
            landmark_capacity: 0,
            ..FilterConfig::default()
        };
        assert!(EkfSlam::new(config).is_err());
    }

    #[test]
    fn first_command_measures_dt_from_construction() {
        let mut filter = EkfSlam::new(FilterConfig::default()).unwrap();
        // Straight drive for 2 s from (0, 0, pi/2) moves 2 m along +y.
        assert!(filter.predict(&command(1.0, 0.0), 2.0));
        assert_abs_diff_eq!(filter.belief().x(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(filter.belief().y(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(filter.belief().heading(), FRAC_PI_2);
    }

    #[test]
    fn dt_is_measured_between_consecutive_commands() {
        let mut filter = EkfSlam::new(FilterConfig::default()).unwrap();
        assert!(filter.predict(&command(1.0, 0.0), 1.0));
        assert!(filter.predict(&command(1.0, 0.0), 1.5));
        assert_abs_diff_eq!(filter.belief().y(), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn malformed_commands_commit_nothing() {
        let mut filter = EkfSlam::new(FilterConfig::default()).unwrap();
        assert!(!filter.predict(&command(f64::NAN, 0.0), 1.0));
        assert!(!filter.predict(&command(1.0, f64::INFINITY), 1.0));
        assert_abs_diff_eq!(filter.belief().y(), 0.0);

        // A backwards stamp is rejected and does not advance bookkeeping.
        assert!(filter.predict(&command(0.0, 0.0), 1.0));
        assert!(!filter.predict(&command(1.0, 0.0), 0.5));
        assert_abs_diff_eq!(filter.belief().y(), 0.0);
    }

    #[test]
    fn prediction_is_dropped_while_correcting() {
        let mut filter = EkfSlam::new(FilterConfig::default()).unwrap();
        filter.phase = Phase::Correcting;

        let before = filter.belief().vector().clone();
        assert!(!filter.predict(&command(1.0, 0.0), 1.0));
        assert_eq!(filter.belief().vector(), &before);

        // The dropped prediction still advanced the stamp bookkeeping.
        filter.phase = Phase::Idle;
        assert!(filter.predict(&command(1.0, 0.0), 2.0));
        assert_abs_diff_eq!(filter.belief().y(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn correct_commits_batch_and_returns_report() {
        let mut filter = EkfSlam::new(FilterConfig::default()).unwrap();
        let batch = [LandmarkObservation {
            id: 0,
            range: 1.0,
            bearing: 0.0,
        }];

        let report = filter.correct(&batch);
        assert_eq!(report.initialized, 1);
        assert_eq!(report.applied, 1);
        assert!(filter.belief().is_seen(0));
    }

    #[test]
    fn snapshots_mirror_the_belief() {
        let mut filter = EkfSlam::new(FilterConfig::default()).unwrap();
        filter.predict(&command(1.0, 0.0), 1.0);

        let state = filter.state_snapshot();
        assert_eq!(state.len, 13);
        assert_abs_diff_eq!(state.values[1], filter.belief().y());

        let covariance = filter.covariance_snapshot();
        assert_eq!(covariance.rows, 13);
        assert_eq!(covariance.cols, 13);
        let n = covariance.cols;
        for i in 0..n {
            for j in 0..n {
                assert_abs_diff_eq!(
                    covariance.values[i * n + j],
                    filter.belief().covariance()[(i, j)]
                );
            }
        }
    }
}
