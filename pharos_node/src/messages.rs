// pharos_node/src/messages.rs

use pharos_core::messages::{CovarianceSnapshot, StateSnapshot};
use serde::{Deserialize, Serialize};

// =========================================================================
// == Inbound Wire Payloads ==
// =========================================================================

/// A twist-style velocity setpoint: only linear.x (forward) and angular.z
/// (yaw) drive a planar robot; the remaining components ride along for wire
/// compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TwistPayload {
    pub linear: [f64; 3],
    pub angular: [f64; 3],
}

/// One detected marker with its relative position (x, y, z) in the sensor
/// frame: x to the right, z forward along the optical axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerPayload {
    pub id: u32,
    pub position: [f64; 3],
}

/// A batch of marker detections from one sensor frame, in detection order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkerArrayPayload {
    pub markers: Vec<MarkerPayload>,
}

// =========================================================================
// == Outbound Wire Payloads ==
// =========================================================================

/// The snapshot pair published after every committed pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefUpdate {
    pub state: StateSnapshot,
    pub covariance: CovarianceSnapshot,
}
