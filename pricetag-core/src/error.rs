//! Error types for model operations.

use thiserror::Error;

/// Result type for model operations.
pub type DesignResult<T> = Result<T, DesignError>;

/// Errors that can occur when validating or converting design records.
#[derive(Debug, Error)]
pub enum DesignError {
    /// A label size with a non-positive dimension.
    #[error("invalid label size: {width_mm}x{height_mm} mm (both must be > 0)")]
    InvalidSize {
        /// Offending width in millimeters.
        width_mm: f64,
        /// Offending height in millimeters.
        height_mm: f64,
    },

    /// A persisted identifier that is not a valid UUID.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
