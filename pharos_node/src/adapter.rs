// pharos_node/src/adapter.rs

use crate::messages::{MarkerArrayPayload, MarkerPayload, TwistPayload};
use pharos_core::messages::{LandmarkObservation, VelocityCommand};

/// A planar robot only consumes forward velocity and yaw rate from a twist.
pub fn command_from_twist(twist: &TwistPayload) -> VelocityCommand {
    VelocityCommand {
        linear: twist.linear[0],
        angular: twist.angular[2],
    }
}

/// Converts a sensor-frame marker position into a bearing-range observation:
/// range is the forward distance z, bearing is -atan2(x, z) so that a marker
/// to the robot's left has positive bearing.
pub fn observation_from_marker(marker: &MarkerPayload) -> LandmarkObservation {
    let x = marker.position[0];
    let z = marker.position[2];
    LandmarkObservation {
        id: marker.id,
        range: z,
        bearing: -x.atan2(z),
    }
}

/// Translates a whole detection batch, preserving detection order.
pub fn observations_from_markers(array: &MarkerArrayPayload) -> Vec<LandmarkObservation> {
    array.markers.iter().map(observation_from_marker).collect()
}
