use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fxcompass_analyzer::executor::AnalysisExecutor;
use fxcompass_analyzer::feed::NewsFeed;
use fxcompass_analyzer::queue::{AnalysisQueue, DRAIN_INTERVAL_SECS};
use fxcompass_common::Config;

#[derive(Parser)]
#[command(name = "fxcompass", about = "Forex news market analysis pipeline")]
struct Cli {
    /// RSS/Atom feed to pull news from
    #[arg(long)]
    feed_url: Option<String>,

    /// Output language for analysis text
    #[arg(long)]
    language: Option<String>,

    /// How many news items to analyze (1-10)
    #[arg(long)]
    news_count: Option<usize>,

    /// Completion model name
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fxcompass=info".parse()?))
        .init();

    info!("fxcompass starting...");

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(url) = cli.feed_url {
        config.feed_url = url;
    }
    if let Some(language) = cli.language {
        config.language = language;
    }
    if let Some(count) = cli.news_count {
        config.news_count = count.clamp(1, 10);
    }
    if let Some(model) = cli.model {
        config.model = model;
    }

    if config.api_key.trim().is_empty() {
        bail!("OPENAI_API_KEY environment variable is required");
    }

    let feed = NewsFeed::new();
    let news = feed.fetch(&config.feed_url).await?;
    if news.is_empty() {
        bail!("feed returned no usable news items");
    }

    let api_key = config.api_key.clone();
    let executor = AnalysisExecutor::new(config);
    let queue = Arc::new(AnalysisQueue::new(executor));

    let job = queue.enqueue(news, api_key).await;
    info!(job = %job, "analysis job enqueued");

    // Drain on the scheduler cadence until the queue settles.
    let mut ticker = tokio::time::interval(Duration::from_secs(DRAIN_INTERVAL_SECS));
    loop {
        ticker.tick().await;
        queue.drain_once().await;
        let status = queue.status().await;
        if status.queue_length == 0 && !status.is_processing {
            break;
        }
    }

    match queue.latest().await {
        Some(record) => {
            info!(
                currencies = record.analysis.currencies.len(),
                opportunities = record.analysis.opportunities.len(),
                sentiment = %record.analysis.market_sentiment.overall,
                confidence = record.confidence,
                "analysis complete"
            );
            println!("{}", serde_json::to_string_pretty(&record.analysis)?);
        }
        None => bail!("analysis did not complete after retries"),
    }

    Ok(())
}
