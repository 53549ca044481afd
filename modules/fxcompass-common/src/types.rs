use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- News ---

/// A single news item from the upstream feed, consumed read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub link: String,
}

// --- Currencies ---

/// The eight major currencies the analysis covers.
pub const MAJOR_CURRENCIES: [&str; 8] = ["USD", "EUR", "GBP", "JPY", "AUD", "CAD", "CHF", "NZD"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyStrength {
    pub currency: String,
    pub strength: u8,
    pub trend: Trend,
    pub factors: Vec<String>,
}

// --- Opportunities ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "buy"),
            TradeDirection::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Short,
    Medium,
    Long,
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::Short => write!(f, "short"),
            Timeframe::Medium => write!(f, "medium"),
            Timeframe::Long => write!(f, "long"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Moderate => write!(f, "moderate"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingOpportunity {
    /// Currency pair as "BASE/QUOTE" (e.g. "EUR/USD").
    pub pair: String,
    #[serde(rename = "type")]
    pub direction: TradeDirection,
    pub timeframe: Timeframe,
    pub strength: u8,
    pub reasoning: Vec<String>,
    pub risk: RiskLevel,
    pub stop_loss: f64,
    pub target: f64,
}

/// Split a "BASE/QUOTE" pair into its two symbols.
pub fn split_pair(pair: &str) -> Option<(&str, &str)> {
    let (base, quote) = pair.split_once('/')?;
    if base.is_empty() || quote.is_empty() {
        return None;
    }
    Some((base, quote))
}

// --- Correlations ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyCorrelation {
    pub pair: String,
    pub correlation: f64,
    pub explanation: String,
    pub factors: Vec<String>,
}

// --- Sentiment ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverallSentiment {
    RiskOn,
    RiskOff,
    Neutral,
}

impl std::fmt::Display for OverallSentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallSentiment::RiskOn => write!(f, "risk-on"),
            OverallSentiment::RiskOff => write!(f, "risk-off"),
            OverallSentiment::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSentiment {
    pub overall: OverallSentiment,
    pub confidence: u8,
    pub drivers: Vec<String>,
}

// --- Analysis result ---

/// The full market analysis produced by one successful pipeline run.
/// Immutable once returned; superseded wholesale by the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub currencies: Vec<CurrencyStrength>,
    pub opportunities: Vec<TradingOpportunity>,
    pub correlations: Vec<CurrencyCorrelation>,
    pub market_sentiment: MarketSentiment,
}

impl Analysis {
    /// Look up a currency by exact symbol match.
    pub fn currency(&self, symbol: &str) -> Option<&CurrencyStrength> {
        self.currencies.iter().find(|c| c.currency == symbol)
    }
}

/// A completed analysis with its completion time and the model's
/// self-reported confidence, as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub analysis: Analysis,
    pub completed_at: DateTime<Utc>,
    pub confidence: u8,
}

/// Queue state observable by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub queue_length: usize,
    pub is_processing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_strength() -> CurrencyStrength {
        CurrencyStrength {
            currency: "USD".to_string(),
            strength: 75,
            trend: Trend::Up,
            factors: vec!["hawkish Fed".to_string()],
        }
    }

    #[test]
    fn analysis_serializes_camel_case_keys() {
        let analysis = Analysis {
            currencies: vec![usd_strength()],
            opportunities: vec![],
            correlations: vec![],
            market_sentiment: MarketSentiment {
                overall: OverallSentiment::RiskOn,
                confidence: 80,
                drivers: vec!["equities rally".to_string()],
            },
        };
        let value = serde_json::to_value(&analysis).unwrap();
        assert!(value.get("marketSentiment").is_some());
        assert!(value.get("market_sentiment").is_none());
    }

    #[test]
    fn opportunity_direction_serializes_as_type() {
        let op = TradingOpportunity {
            pair: "USD/EUR".to_string(),
            direction: TradeDirection::Buy,
            timeframe: Timeframe::Medium,
            strength: 85,
            reasoning: vec!["divergent rate paths".to_string()],
            risk: RiskLevel::Moderate,
            stop_loss: 1.0820,
            target: 1.1050,
        };
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["type"], "buy");
        assert!(value.get("stopLoss").is_some());
        assert!(value.get("direction").is_none());
    }

    #[test]
    fn overall_sentiment_uses_kebab_case() {
        let json = serde_json::to_string(&OverallSentiment::RiskOn).unwrap();
        assert_eq!(json, "\"risk-on\"");
        let json = serde_json::to_string(&OverallSentiment::RiskOff).unwrap();
        assert_eq!(json, "\"risk-off\"");
    }

    #[test]
    fn enum_display_matches_wire_strings() {
        for (variant, wire) in [
            (Timeframe::Short, "short"),
            (Timeframe::Medium, "medium"),
            (Timeframe::Long, "long"),
        ] {
            assert_eq!(variant.to_string(), wire);
            assert_eq!(serde_json::to_string(&variant).unwrap(), format!("\"{wire}\""));
        }
        for (variant, wire) in [
            (RiskLevel::Low, "low"),
            (RiskLevel::Moderate, "moderate"),
            (RiskLevel::High, "high"),
        ] {
            assert_eq!(variant.to_string(), wire);
            assert_eq!(serde_json::to_string(&variant).unwrap(), format!("\"{wire}\""));
        }
    }

    #[test]
    fn news_item_round_trips_camel_case() {
        let item = NewsItem {
            title: "ECB holds rates".to_string(),
            description: "The ECB left policy unchanged".to_string(),
            published_at: "2024-03-07T13:45:00Z".to_string(),
            link: "https://example.com/ecb".to_string(),
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"publishedAt\""));
        let back: NewsItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn split_pair_handles_valid_and_invalid() {
        assert_eq!(split_pair("EUR/USD"), Some(("EUR", "USD")));
        assert_eq!(split_pair("EURUSD"), None);
        assert_eq!(split_pair("/USD"), None);
        assert_eq!(split_pair("EUR/"), None);
    }

    #[test]
    fn currency_lookup_is_exact_match() {
        let analysis = Analysis {
            currencies: vec![usd_strength()],
            opportunities: vec![],
            correlations: vec![],
            market_sentiment: MarketSentiment {
                overall: OverallSentiment::Neutral,
                confidence: 50,
                drivers: vec!["mixed data".to_string()],
            },
        };
        assert!(analysis.currency("USD").is_some());
        assert!(analysis.currency("usd").is_none());
        assert!(analysis.currency("GBP").is_none());
    }
}
