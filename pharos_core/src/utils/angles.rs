// pharos_core/src/utils/angles.rs

use std::f64::consts::PI;

/// Reduces a finite angle to the principal range, congruent to the input
/// modulo 2*pi.
///
/// The reduction works on the absolute value modulo pi: the remainder gives
/// the magnitude within a half-turn, and the parity of the quotient decides
/// whether the value lands in the low half or is reflected across +/-pi.
/// Non-finite input is outside the domain; callers filter before this point.
pub fn normalize_angle(angle: f64) -> f64 {
    let rem = angle.abs() % PI;
    let quo = (angle.abs() - rem) / PI;
    let odd_quo = (quo % 2.0) as i64;

    if angle >= 0.0 {
        if odd_quo == 0 {
            rem
        } else {
            -(PI - rem)
        }
    } else if odd_quo == 0 {
        -rem
    } else {
        PI - rem
    }
}
