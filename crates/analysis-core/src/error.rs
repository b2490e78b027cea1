use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Fewer bars or samples than an estimator needs. Estimators convert this
    /// into an empty or neutral result; it never reaches the caller.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Upstream fetch failed for {source_name}: {message}")]
    UpstreamFetch { source_name: String, message: String },

    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Malformed request. The only error surfaced to the HTTP layer.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn upstream(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        AnalysisError::UpstreamFetch {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Whether the error belongs to the caller (4xx) rather than a degraded component.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AnalysisError::InvalidInput(_))
    }
}
