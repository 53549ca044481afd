//! End-to-end analysis attempts with bounded retries.
//!
//! One `run` call drives up to [`MAX_ATTEMPTS`] sequential attempts. Each
//! attempt builds the prompt, calls the completion endpoint, strips any
//! code fences from the reply, parses it, and validates the result.
//! Transport, format, and validation failures are all retryable; only
//! exhaustion of the budget surfaces to the caller.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use completion_client::util::strip_code_fences;
use completion_client::{ChatRequest, WireMessage};
use fxcompass_common::{Analysis, AnalysisError, AnalysisResult, AttemptError, Config, NewsItem};

use crate::prompt;
use crate::traits::{CompletionBackend, HttpCompletionBackend};
use crate::validate;

/// Attempts one `run` call makes before giving up.
pub const MAX_ATTEMPTS: u32 = 5;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 2000;

/// Synchronous progress callback: percent complete plus a human-readable
/// stage message carrying the attempt index.
pub type ProgressFn = dyn Fn(u8, &str) + Send + Sync;

pub struct AnalysisExecutor {
    config: Config,
    backend: Arc<dyn CompletionBackend>,
}

impl AnalysisExecutor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            backend: Arc::new(HttpCompletionBackend::new()),
        }
    }

    /// Swap in a different completion backend, for tests or for an
    /// OpenAI-compatible endpoint other than the default.
    pub fn with_backend(config: Config, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { config, backend }
    }

    /// Run the full pipeline for one news batch.
    ///
    /// A missing credential is rejected before any network call and does
    /// not consume an attempt. Attempts run back to back with no delay;
    /// callers that need pacing sit behind the submission queue.
    pub async fn run(
        &self,
        news: &[NewsItem],
        api_key: &str,
        on_progress: &ProgressFn,
    ) -> AnalysisResult<Analysis> {
        if api_key.trim().is_empty() {
            return Err(AnalysisError::MissingApiKey);
        }

        let mut last_error: Option<AttemptError> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(news, api_key, attempt, on_progress).await {
                Ok(analysis) => {
                    on_progress(
                        100,
                        &format!("analysis succeeded after {attempt} attempt(s)"),
                    );
                    return Ok(analysis);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "analysis attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(AnalysisError::Exhausted {
            attempts: MAX_ATTEMPTS,
            last: last_error
                .unwrap_or_else(|| AttemptError::Transport("no attempts were made".to_string())),
        })
    }

    async fn attempt(
        &self,
        news: &[NewsItem],
        api_key: &str,
        attempt: u32,
        on_progress: &ProgressFn,
    ) -> Result<Analysis, AttemptError> {
        on_progress(
            10,
            &format!("attempt {attempt}/{MAX_ATTEMPTS}: preparing news data"),
        );
        let prompt = prompt::build(news, &self.config);
        let request = ChatRequest::new(&self.config.model)
            .message(WireMessage::system(prompt.system))
            .message(WireMessage::user(prompt.user))
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS);

        on_progress(30, &format!("attempt {attempt}: requesting analysis"));
        let response = self
            .backend
            .complete(api_key, &request)
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        on_progress(60, &format!("attempt {attempt}: parsing response"));
        let content = response.text().ok_or_else(|| {
            AttemptError::Format("completion response has no message content".to_string())
        })?;
        let cleaned = strip_code_fences(content);
        if !cleaned.starts_with('{') || !cleaned.ends_with('}') {
            return Err(AttemptError::Format(
                "response content is not a JSON object".to_string(),
            ));
        }
        let raw: Value = serde_json::from_str(cleaned)
            .map_err(|e| AttemptError::Format(format!("response is not valid JSON: {e}")))?;

        on_progress(80, &format!("attempt {attempt}: validating analysis"));
        let analysis = validate::validate(&raw)?;

        debug!(
            currencies = analysis.currencies.len(),
            opportunities = analysis.opportunities.len(),
            "analysis validated"
        );
        Ok(analysis)
    }
}
