//! Error types for confab-backend

use thiserror::Error;

/// Backend invocation error type
#[derive(Debug, Error)]
pub enum Error {
    /// Network/connection error
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// Backend returned a non-success status
    #[error("backend error: {0}")]
    Api(String),

    /// Response body did not match the wire contract
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Response carried no usable body
    #[error("empty response body")]
    EmptyResponse,

    /// Invalid client configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
