use thiserror::Error;

/// Errors from the completion endpoint boundary.
///
/// Every variant is a transport-level failure from the caller's point of
/// view: the request never produced a usable completion body.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// Endpoint answered with a non-success status.
    #[error("completion API error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Network-level failure (connect, timeout, body read, decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API key contains bytes that cannot form an HTTP header.
    #[error("invalid API key: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),
}
