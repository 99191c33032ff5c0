// pharos_core/src/prelude.rs

// --- Core Service (The main entry point of the library) ---
pub use crate::estimation::EkfSlam;

// --- Configuration and Errors ---
pub use crate::config::FilterConfig;
pub use crate::error::FilterError;

// --- Messages (The "nouns" crossing the API boundary) ---
pub use crate::messages::{
    CovarianceSnapshot, LandmarkObservation, StateSnapshot, VelocityCommand,
};

// --- Models and Their Staged Outputs ---
pub use crate::models::motion::{MotionModel, Prediction};
pub use crate::models::observation::{BatchReport, Correction, SensorModel};

// --- State and Numeric Types ---
pub use crate::state::BeliefState;
pub use crate::types::{landmark_index, CovarianceMatrix, StateVector, LANDMARK_DIM, POSE_DIM};
pub use crate::utils::angles::normalize_angle;
