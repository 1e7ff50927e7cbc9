use thiserror::Error;

/// Result type for deepq operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// Main error type for the deepq library
#[derive(Error, Debug)]
pub enum DqnError {
    /// Invalid dimensions for operations
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Action index outside of the action space
    #[error("invalid action {action}: must be less than {max_actions}")]
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Every action was masked out
    #[error("no legal actions available")]
    NoLegalActions,

    /// IO errors (model files, metric logs)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Model (de)serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration (de)serialization errors
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Failure reported by an environment collaborator
    #[error("environment error: {0}")]
    Environment(String),

    /// Numerical computation errors
    #[error("numerical error: {0}")]
    NumericalError(String),
}

impl DqnError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DqnError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        DqnError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn environment<S: Into<String>>(message: S) -> Self {
        DqnError::Environment(message.into())
    }
}
