//! Error types for the DeepSeek adapter

use deepseek_application::ports::llm_gateway::GatewayError;
use thiserror::Error;

/// Result type alias for DeepSeek operations
pub type Result<T> = std::result::Result<T, DeepSeekError>;

/// Errors that can occur when talking to the DeepSeek HTTP API
#[derive(Error, Debug)]
pub enum DeepSeekError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("No API key configured (set {0})")]
    MissingApiKey(String),
}

impl From<reqwest::Error> for DeepSeekError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DeepSeekError::Timeout
        } else {
            DeepSeekError::Http(e)
        }
    }
}

impl DeepSeekError {
    /// Whether another attempt could succeed. Authentication failures and
    /// client errors never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            DeepSeekError::Timeout | DeepSeekError::RateLimited(_) => true,
            DeepSeekError::Http(e) => e.is_connect() || e.is_request() || e.is_body(),
            DeepSeekError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<DeepSeekError> for GatewayError {
    fn from(e: DeepSeekError) -> Self {
        match e {
            DeepSeekError::Authentication { message, .. } => GatewayError::Authentication(message),
            DeepSeekError::MissingApiKey(var) => {
                GatewayError::Authentication(format!("no API key configured (set {var})"))
            }
            DeepSeekError::RateLimited(message) => GatewayError::RateLimited(message),
            DeepSeekError::Timeout => GatewayError::Timeout,
            DeepSeekError::Api { status, message } => GatewayError::Api { status, message },
            DeepSeekError::Http(e) => GatewayError::Connection(e.to_string()),
            DeepSeekError::Serialization(e) => GatewayError::InvalidResponse(e.to_string()),
            DeepSeekError::UnexpectedResponse(message) => GatewayError::InvalidResponse(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(DeepSeekError::Timeout.is_retryable());
        assert!(DeepSeekError::RateLimited("slow down".into()).is_retryable());
        assert!(
            DeepSeekError::Api {
                status: 503,
                message: "busy".into()
            }
            .is_retryable()
        );
        assert!(
            !DeepSeekError::Api {
                status: 400,
                message: "bad".into()
            }
            .is_retryable()
        );
        assert!(
            !DeepSeekError::Authentication {
                status: 401,
                message: "bad key".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_gateway_error_mapping() {
        let err: GatewayError = DeepSeekError::Authentication {
            status: 401,
            message: "invalid key".into(),
        }
        .into();
        assert_eq!(err, GatewayError::Authentication("invalid key".into()));

        let err: GatewayError = DeepSeekError::Timeout.into();
        assert!(err.is_timeout());

        let err: GatewayError = DeepSeekError::Api {
            status: 502,
            message: "gateway".into(),
        }
        .into();
        assert!(err.is_retryable());
    }
}
