// Test doubles for the analysis pipeline.
//
// Two doubles matching the two trait boundaries:
// - StubBackend (CompletionBackend) — scripted queue of completion replies
// - RecordingNotifier (AnalysisNotifier) — captures queue lifecycle events
//
// Plus builders for news batches and model payloads (valid, fenced,
// directionally incoherent).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use completion_client::{ChatRequest, ChatResponse, CompletionError};
use fxcompass_common::{Analysis, AnalysisError, NewsItem};

use crate::notify::AnalysisNotifier;
use crate::traits::CompletionBackend;

// ---------------------------------------------------------------------------
// StubBackend
// ---------------------------------------------------------------------------

enum StubReply {
    Content(String),
    TransportError(String),
}

/// Scripted completion backend. Replies are consumed in order; a call past
/// the end of the script errors so tests fail loudly on extra attempts.
/// Every call is recorded (credential and request) for wire assertions.
pub struct StubBackend {
    script: Mutex<VecDeque<StubReply>>,
    requests: Mutex<Vec<(String, ChatRequest)>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script a successful completion whose message content is `content`.
    pub fn reply(self, content: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(StubReply::Content(content.to_string()));
        self
    }

    /// Script a transport-level failure.
    pub fn transport_error(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(StubReply::TransportError(message.to_string()));
        self
    }

    /// Number of completion calls made so far.
    pub fn calls(&self) -> u32 {
        self.requests.lock().unwrap().len() as u32
    }

    /// The most recent request, if any call has been made.
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|(_, request)| request.clone())
    }

    /// The credential passed to each call, in call order.
    pub fn api_keys(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn chat_response(content: &str) -> ChatResponse {
    serde_json::from_value(json!({
        "choices": [{ "message": { "content": content } }]
    }))
    .expect("stub response shape")
}

#[async_trait]
impl CompletionBackend for StubBackend {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse, CompletionError> {
        self.requests
            .lock()
            .unwrap()
            .push((api_key.to_string(), request.clone()));
        let reply = self.script.lock().unwrap().pop_front();
        match reply {
            Some(StubReply::Content(content)) => Ok(chat_response(&content)),
            Some(StubReply::TransportError(message)) => Err(CompletionError::Api {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: message,
            }),
            None => Err(CompletionError::Api {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "StubBackend: script exhausted".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// One captured queue lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyEvent {
    Queued { position: usize },
    Completed,
    Retrying { attempt: u32, max_attempts: u32 },
    Abandoned,
}

/// Notifier that records every event. Clone it before handing one copy to
/// the queue; both copies share the same event log.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<NotifyEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotifyEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn completed_count(&self) -> usize {
        self.count(|e| matches!(e, NotifyEvent::Completed))
    }

    pub fn retry_count(&self) -> usize {
        self.count(|e| matches!(e, NotifyEvent::Retrying { .. }))
    }

    pub fn abandoned_count(&self) -> usize {
        self.count(|e| matches!(e, NotifyEvent::Abandoned))
    }

    fn count(&self, pred: impl Fn(&NotifyEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

#[async_trait]
impl AnalysisNotifier for RecordingNotifier {
    async fn queued(&self, position: usize) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(NotifyEvent::Queued { position });
        Ok(())
    }

    async fn completed(&self, _analysis: &Analysis) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(NotifyEvent::Completed);
        Ok(())
    }

    async fn retrying(&self, attempt: u32, max_attempts: u32) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(NotifyEvent::Retrying {
            attempt,
            max_attempts,
        });
        Ok(())
    }

    async fn abandoned(&self, _error: &AnalysisError) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(NotifyEvent::Abandoned);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

/// A minimal coherent analysis payload, as the model would emit it.
pub fn valid_analysis_json() -> String {
    json!({
        "currencies": [
            { "currency": "USD", "strength": 75, "trend": "up", "factors": ["hawkish Fed"] },
            { "currency": "EUR", "strength": 40, "trend": "down", "factors": ["soft PMIs"] }
        ],
        "opportunities": [
            {
                "pair": "USD/EUR",
                "type": "buy",
                "timeframe": "short",
                "strength": 85,
                "reasoning": ["rate differential widening"],
                "risk": "moderate",
                "stopLoss": 1.0820,
                "target": 1.1050
            }
        ],
        "correlations": [
            {
                "pair": "EUR/USD",
                "correlation": -0.85,
                "explanation": "dollar strength pressures the euro",
                "factors": ["policy divergence"]
            }
        ],
        "marketSentiment": {
            "overall": "risk-on",
            "confidence": 75,
            "drivers": ["equities rally"]
        }
    })
    .to_string()
}

/// The valid payload wrapped in markdown code fences, as models often do
/// despite instructions.
pub fn fenced_analysis_json() -> String {
    format!("```json\n{}\n```", valid_analysis_json())
}

/// Structurally valid payload whose single opportunity trades against the
/// trend, so validation must fault.
pub fn incoherent_analysis_json() -> String {
    let mut value: serde_json::Value = serde_json::from_str(&valid_analysis_json()).unwrap();
    value["opportunities"][0]["type"] = json!("sell");
    value.to_string()
}

/// A small news batch with distinct titles.
pub fn sample_news(count: usize) -> Vec<NewsItem> {
    (0..count)
        .map(|i| NewsItem {
            title: format!("Headline {i}"),
            description: format!("Body of story {i}"),
            published_at: format!("2024-03-0{}T09:00:00Z", i % 9 + 1),
            link: format!("https://example.com/{i}"),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Self-tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_backend_replays_script_in_order() {
        let backend = StubBackend::new()
            .transport_error("down")
            .reply("{\"ok\":true}");
        let request = ChatRequest::new("test-model");

        let first = backend.complete("key", &request).await;
        assert!(first.is_err());

        let second = backend.complete("key", &request).await.unwrap();
        assert_eq!(second.text(), Some("{\"ok\":true}"));

        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn stub_backend_errors_when_script_runs_dry() {
        let backend = StubBackend::new();
        let request = ChatRequest::new("test-model");
        let result = backend.complete("key", &request).await;
        assert!(result.is_err());
    }

    #[test]
    fn valid_payload_passes_validation() {
        let raw: serde_json::Value = serde_json::from_str(&valid_analysis_json()).unwrap();
        assert!(crate::validate::validate(&raw).is_ok());
    }

    #[test]
    fn incoherent_payload_fails_validation() {
        let raw: serde_json::Value = serde_json::from_str(&incoherent_analysis_json()).unwrap();
        assert!(crate::validate::validate(&raw).is_err());
    }
}
