use thiserror::Error;

#[derive(Debug, Error)]
pub enum StockerError {
    #[error("Invalid configuration: {field}: {reason}")]
    Configuration { field: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Simulation failed: {0}")]
    Simulation(String),

    #[error("Too many failed trials: {failed} of {total} failed (tolerance {max_fraction})")]
    TrialFailures {
        failed: u32,
        total: u32,
        max_fraction: f64,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl StockerError {
    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        StockerError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for StockerError {
    fn from(e: serde_json::Error) -> Self {
        StockerError::SerializationError(e.to_string())
    }
}
