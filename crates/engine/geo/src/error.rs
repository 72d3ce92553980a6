//! Geometry pipeline error types.

use thiserror::Error;

/// Errors produced by the geometry pipeline.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Input data failed validation (malformed stations, wrong corner count,
    /// non-monotonic depths, empty point sets).
    #[error("validation error: {0}")]
    Validation(String),

    /// Pipeline configuration is unusable (non-positive scale, inverted
    /// safe band).
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Convenience result type for geometry operations.
pub type GeoResult<T> = Result<T, GeoError>;
