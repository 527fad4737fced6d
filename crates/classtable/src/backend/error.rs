//! Error types for the hosted backend client.

use thiserror::Error;

/// Errors that can occur while talking to the hosted backend.
#[derive(Debug, Error, Clone)]
pub enum BackendError {
    /// Network/HTTP request failed before a response was produced
    #[error("Network error: {message}")]
    Network { message: String },

    /// The auth service rejected a request; `message` is the
    /// backend-originated error string (e.g. "Invalid login credentials")
    #[error("Auth error: {message}")]
    Auth { message: String },

    /// The REST layer returned an error status
    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded into the expected shape
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Backend returned something the client does not know how to handle
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// Base URL parsing/construction failed
    #[error("URL error: {message}")]
    UrlError { message: String },
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for BackendError {
    fn from(err: url::ParseError) -> Self {
        BackendError::UrlError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode {
            message: err.to_string(),
        }
    }
}
