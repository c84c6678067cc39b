//! API Client Error Types
//!
//! Error taxonomy of the HTTP client. A 401 is kept distinct from every other
//! status because it drives the global session policy.

use thiserror::Error;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    /// The credential was rejected (401). Terminal, never retried.
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other non-2xx response
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// The request did not complete in time
    #[error("Request timeout")]
    Timeout,

    /// The API could not be reached
    #[error("API unavailable")]
    Unavailable,

    /// Other transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not the expected JSON
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The owning view went away before the response arrived
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// Classify a transport-level reqwest failure
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_connect() {
            ClientError::Unavailable
        } else {
            ClientError::Request(e)
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
