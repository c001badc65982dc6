//! Error types for DocQA

use std::time::Duration;

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the DocQA system
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM provider error: {message}")]
    LLMProvider {
        message: String,
        /// Server-side failures (5xx) that may succeed on a later attempt.
        transient: bool,
    },

    #[error("Rate limited by LLM provider")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Non-transient provider error.
    pub fn llm(message: impl Into<String>) -> Self {
        Error::LLMProvider {
            message: message.into(),
            transient: false,
        }
    }

    /// Whether a later attempt of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::RateLimited { .. } | Error::Timeout(_) | Error::Network(_) => true,
            Error::LLMProvider { transient, .. } => *transient,
            _ => false,
        }
    }

    /// Minimum delay the remote service asked us to wait, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::Network("connection reset".into()).is_transient());
        assert!(Error::Timeout("60s".into()).is_transient());
        assert!(Error::RateLimited { retry_after: None }.is_transient());
        assert!(
            Error::LLMProvider {
                message: "502".into(),
                transient: true
            }
            .is_transient()
        );

        assert!(!Error::llm("bad request").is_transient());
        assert!(!Error::Authentication("invalid key".into()).is_transient());
        assert!(!Error::Configuration("missing key".into()).is_transient());
        assert!(!Error::VectorIndex("unreachable".into()).is_transient());
    }

    #[test]
    fn test_retry_after_only_for_rate_limits() {
        let limited = Error::RateLimited {
            retry_after: Some(Duration::from_millis(1500)),
        };
        assert_eq!(limited.retry_after(), Some(Duration::from_millis(1500)));
        assert_eq!(Error::Network("down".into()).retry_after(), None);
    }
}
