//! Typed errors for analysis and validation.

use thiserror::Error;

/// A response payload that failed semantic validation.
///
/// `path` names the offending field in JSON-pointer style
/// (e.g. `opportunities[2].type`) so log lines point at the
/// exact spot in the model output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {reason}")]
pub struct ValidationError {
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Why a single analysis attempt failed. Every class is retryable.
#[derive(Debug, Clone, Error)]
pub enum AttemptError {
    /// Network or API failure before a body was obtained
    #[error("transport error: {0}")]
    Transport(String),

    /// Body obtained but not parseable as the expected JSON document
    #[error("format error: {0}")]
    Format(String),

    /// Parsed cleanly but violated a semantic rule
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Terminal outcome of an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No credential configured; checked before any network call
    #[error("no API key configured")]
    MissingApiKey,

    /// Every attempt failed; carries the final failure
    #[error("analysis failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: AttemptError },
}

/// Result type alias for analysis operations.
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
