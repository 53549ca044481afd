// Trait abstraction for the completion endpoint dependency.
//
// CompletionBackend replaces a direct CompletionClient — the one outbound
// HTTP call behind one trait. The credential is a per-call argument because
// it travels with each queued job rather than living in the backend.
//
// This enables deterministic executor and queue tests with StubBackend:
// no network, no API key. `cargo test` in seconds.

use async_trait::async_trait;

use completion_client::{ChatRequest, ChatResponse, CompletionClient, CompletionError};

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Issue one chat-completion call using the given credential.
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse, CompletionError>;
}

/// Production backend. Builds a fresh client per call so a job's credential
/// is used for exactly that call and never cached between jobs.
#[derive(Debug, Default)]
pub struct HttpCompletionBackend {
    base_url: Option<String>,
}

impl HttpCompletionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the backend at an OpenAI-compatible endpoint other than the default.
    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            base_url: Some(url.into()),
        }
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionBackend {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse, CompletionError> {
        let client = match &self.base_url {
            Some(url) => CompletionClient::new(api_key).with_base_url(url),
            None => CompletionClient::new(api_key),
        };
        client.chat(request).await
    }
}
