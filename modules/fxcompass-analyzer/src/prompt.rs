use serde::Serialize;

use completion_client::util::truncate_to_char_boundary;
use fxcompass_common::{Config, NewsItem, MAJOR_CURRENCIES};

/// Byte cap per news item body, keeping the user message inside the
/// model's context budget even for verbose feeds.
const MAX_ITEM_BYTES: usize = 2_000;

/// The exact payload for one completion call: fixed analyst instructions
/// plus the serialized news batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub system: String,
    pub user: String,
}

/// Shape of one news item inside the user message.
#[derive(Serialize)]
struct PromptItem<'a> {
    title: &'a str,
    content: &'a str,
    date: &'a str,
}

/// Build the full prompt for one analysis attempt.
/// Pure function of its inputs; truncates to `config.news_count` items.
pub fn build(news: &[NewsItem], config: &Config) -> AnalysisPrompt {
    let count = config.news_count.clamp(1, 10);
    let items: Vec<PromptItem<'_>> = news
        .iter()
        .take(count)
        .map(|item| PromptItem {
            title: &item.title,
            content: truncate_to_char_boundary(&item.description, MAX_ITEM_BYTES),
            date: &item.published_at,
        })
        .collect();

    let user = serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string());

    AnalysisPrompt {
        system: build_system_prompt(&config.language),
        user,
    }
}

const RESPONSE_TEMPLATE: &str = r#"{
  "currencies": [
    { "currency": "USD", "strength": 75, "trend": "up", "factors": ["..."] }
  ],
  "opportunities": [
    {
      "pair": "USD/EUR",
      "type": "buy",
      "timeframe": "medium",
      "strength": 85,
      "reasoning": ["..."],
      "risk": "moderate",
      "stopLoss": 1.0820,
      "target": 1.1050
    }
  ],
  "correlations": [
    { "pair": "EUR/USD", "correlation": -0.85, "explanation": "...", "factors": ["..."] }
  ],
  "marketSentiment": { "overall": "risk-on", "confidence": 75, "drivers": ["..."] }
}"#;

/// The fixed analyst instructions, interpolated with the response language.
pub fn build_system_prompt(language: &str) -> String {
    let currencies = MAJOR_CURRENCIES.join(", ");
    format!(
        r#"You are a professional forex analyst. You will receive a JSON array of recent news items. Analyze them and produce a market analysis of the major currencies ({currencies}).

## Trading rules

Apply every rule below. An opportunity that breaks any of them must not appear in the response.

1. Only signal a pair when the strength differential between base and quote is at least 20 points.
2. The dominant currency of a signal must have strength 60 or higher.
3. The weak currency of a signal must have strength 40 or lower.
4. Derive the timeframe from the differential: 20-40 short, 40-60 medium, above 60 long.
5. Every opportunity must offer at least a 1:2 risk/reward ratio between stop-loss and target.
6. Anchor each stop-loss to the nearest support or resistance level.

A "buy" means the base currency is trending up while the quote currency is trending down. A "sell" means the base is trending down while the quote is trending up. Never signal a pair whose two currencies trend the same way.

## Response format

Respond with ONLY a raw JSON object. No prose before or after it, no markdown code fences. The object must have exactly this shape:

{RESPONSE_TEMPLATE}

- "strength" and "confidence" are integers from 0 to 100.
- "trend" is one of "up", "down", "neutral".
- "type" is "buy" or "sell"; "timeframe" is "short", "medium" or "long"; "risk" is "low", "moderate" or "high".
- "overall" is one of "risk-on", "risk-off", "neutral".
- "correlation" is a decimal between -1 and 1.
- "factors", "reasoning" and "drivers" must be non-empty arrays of strings.
- Empty "currencies", "opportunities" or "correlations" arrays are acceptable when the news supports no signal.

Write every natural-language string in the response in the language "{language}"."#
    )
}
