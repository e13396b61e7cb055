use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpsboardError {
    /// Missing or rejected credentials. Fatal; never retried automatically.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Upstream returned a retryable failure (5xx, rate limit, timeout).
    /// The cache writes nothing on failure, so the next poll tick retries.
    #[error("Upstream request failed with status {status}: {message}")]
    UpstreamTransient { status: u16, message: String },

    /// Network-level failure before an HTTP status was obtained.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream body violated the wire schema (e.g. unknown incident status).
    /// Surfaced at the adapter boundary before aggregation sees the data.
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl OpsboardError {
    /// Whether the next poll cycle may succeed without operator intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            OpsboardError::UpstreamTransient { .. } | OpsboardError::Transport(_) => true,
            OpsboardError::Configuration(_)
            | OpsboardError::MalformedResponse(_)
            | OpsboardError::Serialization(_)
            | OpsboardError::InvalidArgument(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, OpsboardError>;
