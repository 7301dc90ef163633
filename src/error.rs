use thiserror::Error;

/// Result type for qrace operations
pub type Result<T> = std::result::Result<T, QraceError>;

/// Main error type for the qrace engine
#[derive(Error, Debug)]
pub enum QraceError {
    /// Invalid configuration value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Unrecognised strategy or mode name
    #[error("Unknown {kind} '{value}'")]
    UnknownVariant {
        kind: &'static str,
        value: String,
    },

    /// Well-formed configuration file holding an unusable value
    #[error("Invalid configuration at line {line}, column {column}: {reason}")]
    InvalidConfig {
        line: usize,
        column: usize,
        reason: String,
    },

    /// Dataset too small to give every worker its minimum batch
    #[error("Insufficient data for the number of workers: {samples} samples, need at least {required}")]
    InsufficientData {
        samples: usize,
        required: usize,
    },

    /// A transition refers to a state or action outside the table
    #[error("Transition {index}: {field} = {value} is out of bounds (limit {limit})")]
    OutOfBounds {
        index: usize,
        field: &'static str,
        value: usize,
        limit: usize,
    },

    /// Malformed experience source
    #[error("Parse error on line {line}: {reason}")]
    Parse {
        line: usize,
        reason: String,
    },

    /// A worker thread terminated abnormally
    #[error("Worker {worker} panicked before finishing its episodes")]
    WorkerPanicked {
        worker: usize,
    },

    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper functions for common error patterns
impl QraceError {
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        QraceError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_variant<S: Into<String>>(kind: &'static str, value: S) -> Self {
        QraceError::UnknownVariant {
            kind,
            value: value.into(),
        }
    }

    /// Whether this error stems from the run configuration rather than IO or a worker
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            QraceError::InvalidParameter { .. }
                | QraceError::UnknownVariant { .. }
                | QraceError::InvalidConfig { .. }
                | QraceError::InsufficientData { .. }
        )
    }
}
