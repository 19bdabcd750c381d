//! Error types for kcenter-rs.

use thiserror::Error;

/// Boxed error from a broker client, kept as the `source` of [`Error::Unreachable`].
pub type BrokerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// Request payload failed validation. Raised before any broker I/O.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The AI task subsystem was disabled at startup.
    #[error("AI task service is not configured")]
    NotConfigured,

    /// Any failure talking to the broker, passed through untouched.
    #[error("task broker unreachable: {0}")]
    Unreachable(#[source] BrokerError),

    #[error("malformed result envelope: {0}")]
    MalformedResult(String),

    /// Reserved: an absent result is reported as `PENDING`, not as missing.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// No route under the API prefix matches the path.
    #[error("no route for {0}")]
    RouteNotFound(String),

    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error("envelope encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an arbitrary broker-side failure.
    pub fn unreachable(err: impl Into<BrokerError>) -> Self {
        Error::Unreachable(err.into())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Unreachable(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
