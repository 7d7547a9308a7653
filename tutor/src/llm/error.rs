//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Timeout(_))
    }

    /// Check if the failure happened before the model produced anything
    ///
    /// Transport-level failures and timeouts never carry partial content;
    /// parse failures do (the reply arrived, it just wasn't usable).
    pub fn is_transport(&self) -> bool {
        match self {
            LlmError::ApiError { .. } => true,
            LlmError::Network(_) => true,
            LlmError::Timeout(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::Json(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_timeout() {
        assert!(LlmError::Timeout(Duration::from_secs(30)).is_timeout());
        assert!(
            !LlmError::ApiError {
                status: 500,
                message: "Server error".to_string()
            }
            .is_timeout()
        );
    }

    #[test]
    fn test_is_transport() {
        assert!(
            LlmError::ApiError {
                status: 502,
                message: "Bad gateway".to_string()
            }
            .is_transport()
        );
        assert!(LlmError::Timeout(Duration::from_secs(30)).is_transport());
        assert!(!LlmError::InvalidResponse("bad JSON".to_string()).is_transport());
    }
}
