//! Backend request errors.

use chimax_core::EnvelopeError;
use thiserror::Error;

/// Errors that can occur when calling either backend.
///
/// Transport failures and logical failures (`status: false`) both end up
/// here, so callers handle one error type regardless of where a request
/// went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request exceeded the client timeout.
    #[error("The server took too long to respond")]
    Timeout,

    /// Connection or I/O failure before a response arrived.
    #[error("Could not reach the server: {0}")]
    Transport(String),

    /// The backend rejected the credentials (HTTP 401).
    #[error("Your session has expired, please sign in again")]
    Unauthorized,

    /// Any other non-2xx response.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// HTTP success carrying `status: false`.
    #[error("{0}")]
    Logical(String),

    /// The body was not a valid envelope for the expected payload.
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    /// The request URL could not be built.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether the backend reported the session as no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<EnvelopeError> for ApiError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Logical(message) => Self::Logical(message),
            EnvelopeError::MissingData => Self::Decode(err.to_string()),
            EnvelopeError::Decode(message) => Self::Decode(message),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_error_displays_backend_message() {
        let err = ApiError::from(EnvelopeError::Logical("not found".to_string()));
        assert_eq!(err.to_string(), "not found");
    }

    #[test]
    fn test_status_error_displays_message_only() {
        let err = ApiError::Status {
            status: 500,
            message: "Internal failure".to_string(),
        };
        assert_eq!(err.to_string(), "Internal failure");
        assert!(!err.is_unauthorized());
        assert!(ApiError::Unauthorized.is_unauthorized());
    }
}
