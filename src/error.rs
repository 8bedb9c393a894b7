use thiserror::Error;

/// Result type for lander operations
pub type Result<T> = std::result::Result<T, LanderError>;

/// Main error type for the lander library.
///
/// None of these are transient: every variant is a programming or
/// configuration error surfaced to the caller, and nothing is retried.
#[derive(Debug, Error)]
pub enum LanderError {
    /// A sample was requested before the replay buffer held enough transitions
    #[error("Insufficient data: requested {requested} transitions, buffer holds {available}")]
    InsufficientData {
        requested: usize,
        available: usize,
    },

    /// Observation or parameter dimensions disagree with the network architecture
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        expected: String,
        actual: String,
    },

    /// Loss or parameters became non-finite
    #[error("Numeric instability: {0}")]
    NumericInstability(String),

    /// Invalid configuration value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Action index outside the action space
    #[error("Invalid action {action}: must be less than {action_count}")]
    InvalidAction {
        action: usize,
        action_count: usize,
    },

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for LanderError {
    fn from(err: bincode::Error) -> Self {
        LanderError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for LanderError {
    fn from(err: serde_json::Error) -> Self {
        LanderError::Serialization(err.to_string())
    }
}

// Helper functions for common error patterns
impl LanderError {
    pub fn shape_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        LanderError::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        LanderError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
