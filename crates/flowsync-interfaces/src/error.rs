//! Errors raised by the flow-management and registry API clients.

use thiserror::Error;

/// Result type for API client operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur when talking to a remote API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The client requires a session token but none has been acquired
    #[error("{client}: method {operation} requires authentication to use")]
    Unauthenticated {
        /// Client that rejected the call
        client: String,
        /// Operation that was attempted
        operation: String,
    },

    /// The server answered with a non-success status
    #[error("{operation}: status {status}: {body}")]
    Http {
        /// Operation that failed
        operation: String,
        /// HTTP status code
        status: u16,
        /// Response body as returned by the server
        body: String,
    },

    /// The request could not be sent or the response could not be read
    #[error("{operation}: transport error: {message}")]
    Transport {
        /// Operation that failed
        operation: String,
        /// Underlying transport error
        message: String,
    },

    /// The response body did not match the expected shape
    #[error("{operation}: invalid response: {message}")]
    Decode {
        /// Operation that failed
        operation: String,
        /// Decoder message
        message: String,
    },

    /// The client could not be constructed from its configuration
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// HTTP status of the failed call, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_carries_body() {
        let err = ApiError::Http {
            operation: "Change Version".to_string(),
            status: 409,
            body: "revision is stale".to_string(),
        };
        assert_eq!(err.to_string(), "Change Version: status 409: revision is stale");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_unauthenticated_message() {
        let err = ApiError::Unauthenticated {
            client: "RegistryClient".to_string(),
            operation: "list_buckets".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "RegistryClient: method list_buckets requires authentication to use"
        );
        assert_eq!(err.status(), None);
    }
}
