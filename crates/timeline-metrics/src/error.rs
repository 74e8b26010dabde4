use thiserror::Error;

/// Errors raised while configuring or running a timeline measurement cycle
#[derive(Error, Debug)]
pub enum MeasurementError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Trace capture is not supported: {0}")]
    Unsupported(String),

    #[error("Malformed interaction record '{name}': {reason}")]
    MalformedInteractionRecord { name: String, reason: String },

    #[error("Invalid interactions: {0}")]
    InvalidInteractions(String),

    #[error("Unknown metric flags: {flags:?}")]
    UnknownFlags { flags: Vec<String> },

    #[error("Trace capture failed: {0:#}")]
    Capture(anyhow::Error),

    #[error("Metric '{metric}' failed: {error:#}")]
    Metric { metric: String, error: anyhow::Error },
}

impl MeasurementError {
    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        MeasurementError::MalformedInteractionRecord {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MeasurementError>;
