//! Error types for image operations.

use thiserror::Error;

/// Error type for image operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error raised by a core raster operation.
    #[error(transparent)]
    Core(#[from] atmos_core::Error),
}

/// Result type for image operations.
pub type OpsResult<T> = Result<T, OpsError>;
