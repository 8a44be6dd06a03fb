// crates/network/src/error.rs
//! Error types for network operations

use hearlearn_core::AppError;
use std::time::Duration;
use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur while talking to the extraction service
#[derive(Debug, Error)]
pub enum NetworkError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error while reading the document to upload
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not finish within its bounded wait
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx HTTP status
    #[error("Service rejected request with HTTP {status}")]
    Rejected { status: u16 },

    /// The body was not a usable answer
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Resilience error
    #[error("Resilience error: {0}")]
    Resilience(#[from] hearlearn_resilience::ResilienceError),
}

impl NetworkError {
    /// Returns true if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::Timeout(_) | NetworkError::Http(_) => true,
            NetworkError::Rejected { status } => *status >= 500,
            NetworkError::Resilience(hearlearn_resilience::ResilienceError::Timeout(_)) => true,
            _ => false,
        }
    }

    /// Returns true if the service answered with a 4xx status
    pub fn is_client_error(&self) -> bool {
        matches!(self, NetworkError::Rejected { status } if (400..500).contains(status))
    }
}

impl From<NetworkError> for AppError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Timeout(duration) => AppError::NetworkTimeout {
                operation: "extraction service request".to_string(),
                seconds: duration.as_secs(),
            },
            NetworkError::Resilience(hearlearn_resilience::ResilienceError::Timeout(duration)) => {
                AppError::NetworkTimeout {
                    operation: "extraction service request".to_string(),
                    seconds: duration.as_secs(),
                }
            }
            NetworkError::Rejected { status } => AppError::ServiceRejected { status },
            NetworkError::InvalidResponse(details) => AppError::InvalidServiceResponse { details },
            NetworkError::InvalidUrl(url) => AppError::InvalidConfiguration {
                setting: "remote.base_url".to_string(),
                value: url,
                reason: "not a valid URL".to_string(),
            },
            NetworkError::Io(e) => AppError::from(e),
            other => AppError::network("extraction service request failed", other),
        }
    }
}
