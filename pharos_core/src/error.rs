// pharos_core/src/error.rs

use thiserror::Error;

/// Construction-time failures. Runtime edge cases (degenerate geometry,
/// invalid landmark ids, non-finite inputs) are handled as per-item skips
/// inside the filter, never as errors.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("landmark capacity must be at least 1")]
    ZeroLandmarkCapacity,

    #[error("noise variance must be positive and finite, got {value}")]
    InvalidNoiseVariance { value: f64 },

    #[error("{name} must be positive and finite, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}
