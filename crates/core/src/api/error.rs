//! Error type shared by the REST clients.

use thiserror::Error;

/// Errors returned by [`PipelineApi`](super::PipelineApi) and
/// [`TaskMessageApi`](super::TaskMessageApi) implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server has no such resource (HTTP 404).
    #[error("Not found")]
    NotFound,

    /// The request was refused before it was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never got a response (connect, timeout, TLS, ...).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
