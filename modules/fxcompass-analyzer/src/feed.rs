// RSS/Atom news feed client.
// Returns NewsItem batches ready for analysis submission.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use fxcompass_common::NewsItem;

const FEED_MAX_ITEMS: usize = 20;
const FEED_MAX_AGE_DAYS: i64 = 7;

pub struct NewsFeed {
    client: reqwest::Client,
}

impl NewsFeed {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build feed HTTP client");
        Self { client }
    }

    /// Fetch and parse the news feed, newest first, capped at [`FEED_MAX_ITEMS`].
    pub async fn fetch(&self, feed_url: &str) -> Result<Vec<NewsItem>> {
        let resp = self
            .client
            .get(feed_url)
            .header("User-Agent", "fxcompass/0.1")
            .send()
            .await
            .context("news feed fetch failed")?;

        let bytes = resp.bytes().await.context("failed to read news feed body")?;
        let items = parse_items(&bytes[..])?;

        info!(feed_url, items = items.len(), "news feed parsed");
        Ok(items)
    }
}

impl Default for NewsFeed {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_items(bytes: &[u8]) -> Result<Vec<NewsItem>> {
    let feed = feed_rs::parser::parse(bytes).context("failed to parse RSS/Atom feed")?;
    let cutoff = chrono::Utc::now() - chrono::Duration::days(FEED_MAX_AGE_DAYS);

    let mut dated: Vec<(Option<chrono::DateTime<chrono::Utc>>, NewsItem)> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

            let pub_date = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.with_timezone(&chrono::Utc));

            if let Some(date) = pub_date {
                if date < cutoff {
                    return None;
                }
            }

            let item = NewsItem {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                description: entry.summary.map(|t| t.content).unwrap_or_default(),
                published_at: pub_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
                link,
            };
            Some((pub_date, item))
        })
        .collect();

    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated.truncate(FEED_MAX_ITEMS);

    Ok(dated.into_iter().map(|(_, item)| item).collect())
}
