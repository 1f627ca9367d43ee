use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid thresholds for {metric}/{sector}: {reason}")]
    InvalidThresholds {
        metric: String,
        sector: String,
        reason: String,
    },

    #[error("Invalid tuning: {parameter} — {reason}")]
    InvalidTuning { parameter: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DiagnosticError {
    fn from(e: serde_json::Error) -> Self {
        DiagnosticError::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for DiagnosticError {
    fn from(e: serde_yaml::Error) -> Self {
        DiagnosticError::SerializationError(e.to_string())
    }
}
