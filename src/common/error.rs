//! Error types for rust_crowd_planning

use thiserror::Error;

/// Main error type for planning and navigation
#[derive(Debug, Error)]
pub enum RoboticsError {
    /// Path planning failed
    #[error("Planning error: {0}")]
    PlanningError(String),
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Frame serialization failed
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// Visualization error
    #[error("Visualization error: {0}")]
    VisualizationError(String),
}

/// Result type alias for planning operations
pub type RoboticsResult<T> = Result<T, RoboticsError>;

/// Fails with `InvalidParameter` unless `value` is finite and strictly positive.
pub fn ensure_positive(name: &str, value: f64) -> RoboticsResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RoboticsError::InvalidParameter(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}
