use async_trait::async_trait;
use tracing::{info, warn};

use fxcompass_common::{Analysis, AnalysisError};

/// Pluggable notification surface for queue lifecycle events.
#[async_trait]
pub trait AnalysisNotifier: Send + Sync {
    /// A job was admitted to the queue at the given position (1-based).
    async fn queued(&self, position: usize) -> anyhow::Result<()>;

    /// A job finished with a validated analysis.
    async fn completed(&self, analysis: &Analysis) -> anyhow::Result<()>;

    /// A failed job was put back at the head of the queue for another pass.
    async fn retrying(&self, attempt: u32, max_attempts: u32) -> anyhow::Result<()>;

    /// A job exhausted its retry budget and was dropped.
    async fn abandoned(&self, error: &AnalysisError) -> anyhow::Result<()>;
}

/// Default notifier: one structured log line per event.
pub struct LogNotifier;

#[async_trait]
impl AnalysisNotifier for LogNotifier {
    async fn queued(&self, position: usize) -> anyhow::Result<()> {
        info!(position, "analysis request queued");
        Ok(())
    }

    async fn completed(&self, analysis: &Analysis) -> anyhow::Result<()> {
        info!(
            currencies = analysis.currencies.len(),
            opportunities = analysis.opportunities.len(),
            sentiment = %analysis.market_sentiment.overall,
            confidence = analysis.market_sentiment.confidence,
            "analysis completed"
        );
        Ok(())
    }

    async fn retrying(&self, attempt: u32, max_attempts: u32) -> anyhow::Result<()> {
        warn!(attempt, max_attempts, "analysis failed, retrying");
        Ok(())
    }

    async fn abandoned(&self, error: &AnalysisError) -> anyhow::Result<()> {
        warn!(error = %error, "analysis abandoned after exhausting retries");
        Ok(())
    }
}
