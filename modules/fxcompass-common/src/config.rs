use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // OpenAI
    pub api_key: String,
    pub model: String,

    // Analysis
    pub language: String,
    pub news_count: usize,

    // News feed
    pub feed_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4-turbo-preview".to_string(),
            language: "fr".to_string(),
            news_count: 5,
            feed_url: "https://www.forexlive.com/feed/news/".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    /// Every variable is optional; unset vars fall back to the defaults.
    /// The API key may legitimately be empty here, the analyzer rejects
    /// it at run time rather than load time.
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: env::var("FXCOMPASS_MODEL")
                .unwrap_or_else(|_| "gpt-4-turbo-preview".to_string()),
            language: env::var("FXCOMPASS_LANGUAGE").unwrap_or_else(|_| "fr".to_string()),
            news_count: env::var("FXCOMPASS_NEWS_COUNT")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<usize>()
                .expect("FXCOMPASS_NEWS_COUNT must be a number")
                .clamp(1, 10),
            feed_url: env::var("FXCOMPASS_FEED_URL")
                .unwrap_or_else(|_| "https://www.forexlive.com/feed/news/".to_string()),
        }
    }
}
