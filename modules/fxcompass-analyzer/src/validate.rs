//! Strict schema and coherence validation of model output.
//!
//! The producer is an untrusted LLM: structurally plausible JSON can still
//! be semantically incoherent, like a "buy" signal where both currencies
//! trend the same way. Validation short-circuits on the first violation
//! and reports the offending field path.

use serde::de::DeserializeOwned;
use serde_json::Value;

use fxcompass_common::{
    split_pair, Analysis, CurrencyCorrelation, CurrencyStrength, MarketSentiment, OverallSentiment,
    RiskLevel, Timeframe, TradeDirection, TradingOpportunity, Trend, ValidationError,
};

/// Minimum strength differential between the dominant and weak currency
/// for any trading signal.
pub const MIN_STRENGTH_DIFFERENTIAL: i16 = 20;

/// Validate a decoded JSON value and narrow it into an [`Analysis`].
///
/// Checks run in a fixed order: root shape, then each currency, then each
/// opportunity (structure first, directional coherence second), then each
/// correlation, then the market sentiment. The first violation wins.
/// Empty top-level arrays are acceptable; the model may legitimately find
/// no signals in a news batch.
pub fn validate(raw: &Value) -> Result<Analysis, ValidationError> {
    if !raw.is_object() {
        return Err(ValidationError::new("$", "must be a JSON object"));
    }

    let currencies_raw = require_array(require(raw, "currencies", "")?, "currencies")?;
    let opportunities_raw = require_array(require(raw, "opportunities", "")?, "opportunities")?;
    let correlations_raw = require_array(require(raw, "correlations", "")?, "correlations")?;
    let sentiment_raw = require(raw, "marketSentiment", "")?;
    if !sentiment_raw.is_object() {
        return Err(ValidationError::new("marketSentiment", "must be an object"));
    }

    let mut currencies = Vec::with_capacity(currencies_raw.len());
    for (i, value) in currencies_raw.iter().enumerate() {
        currencies.push(parse_currency(value, &format!("currencies[{i}]"))?);
    }

    let mut opportunities = Vec::with_capacity(opportunities_raw.len());
    for (i, value) in opportunities_raw.iter().enumerate() {
        opportunities.push(parse_opportunity(
            value,
            &format!("opportunities[{i}]"),
            &currencies,
        )?);
    }

    let mut correlations = Vec::with_capacity(correlations_raw.len());
    for (i, value) in correlations_raw.iter().enumerate() {
        correlations.push(parse_correlation(value, &format!("correlations[{i}]"))?);
    }

    let market_sentiment = parse_sentiment(sentiment_raw, "marketSentiment")?;

    Ok(Analysis {
        currencies,
        opportunities,
        correlations,
        market_sentiment,
    })
}

// --- Entity parsers ---

fn parse_currency(value: &Value, path: &str) -> Result<CurrencyStrength, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::new(path, "must be an object"));
    }
    let currency = nonempty_string(
        require(value, "currency", path)?,
        &field_path(path, "currency"),
    )?;
    let strength = score(
        require(value, "strength", path)?,
        &field_path(path, "strength"),
    )?;
    let trend: Trend = parse_variant(
        require(value, "trend", path)?,
        &field_path(path, "trend"),
        "up, down, neutral",
    )?;
    let factors = string_list(
        require(value, "factors", path)?,
        &field_path(path, "factors"),
    )?;
    Ok(CurrencyStrength {
        currency,
        strength,
        trend,
        factors,
    })
}

fn parse_opportunity(
    value: &Value,
    path: &str,
    currencies: &[CurrencyStrength],
) -> Result<TradingOpportunity, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::new(path, "must be an object"));
    }
    let pair_path = field_path(path, "pair");
    let pair = nonempty_string(require(value, "pair", path)?, &pair_path)?;
    let direction: TradeDirection = parse_variant(
        require(value, "type", path)?,
        &field_path(path, "type"),
        "buy, sell",
    )?;
    let timeframe: Timeframe = parse_variant(
        require(value, "timeframe", path)?,
        &field_path(path, "timeframe"),
        "short, medium, long",
    )?;
    let strength = score(
        require(value, "strength", path)?,
        &field_path(path, "strength"),
    )?;
    let reasoning = string_list(
        require(value, "reasoning", path)?,
        &field_path(path, "reasoning"),
    )?;
    let risk: RiskLevel = parse_variant(
        require(value, "risk", path)?,
        &field_path(path, "risk"),
        "low, moderate, high",
    )?;
    let stop_loss = number(
        require(value, "stopLoss", path)?,
        &field_path(path, "stopLoss"),
    )?;
    let target = number(require(value, "target", path)?, &field_path(path, "target"))?;

    // Directional coherence against the already-validated currency list.
    let (base_symbol, quote_symbol) = split_pair(&pair)
        .ok_or_else(|| ValidationError::new(pair_path.as_str(), "must be formatted as BASE/QUOTE"))?;
    let base = lookup_currency(currencies, base_symbol, &pair, &pair_path)?;
    let quote = lookup_currency(currencies, quote_symbol, &pair, &pair_path)?;
    check_direction(&pair, direction, base, quote, path)?;

    Ok(TradingOpportunity {
        pair,
        direction,
        timeframe,
        strength,
        reasoning,
        risk,
        stop_loss,
        target,
    })
}

fn lookup_currency<'a>(
    currencies: &'a [CurrencyStrength],
    symbol: &str,
    pair: &str,
    path: &str,
) -> Result<&'a CurrencyStrength, ValidationError> {
    currencies.iter().find(|c| c.currency == symbol).ok_or_else(|| {
        ValidationError::new(
            path,
            format!("currency {symbol} in pair {pair} has no strength entry"),
        )
    })
}

fn check_direction(
    pair: &str,
    direction: TradeDirection,
    base: &CurrencyStrength,
    quote: &CurrencyStrength,
    path: &str,
) -> Result<(), ValidationError> {
    let differential = base.strength as i16 - quote.strength as i16;
    let coherent = match direction {
        TradeDirection::Buy => {
            base.trend == Trend::Up
                && quote.trend == Trend::Down
                && differential >= MIN_STRENGTH_DIFFERENTIAL
        }
        TradeDirection::Sell => {
            base.trend == Trend::Down
                && quote.trend == Trend::Up
                && -differential >= MIN_STRENGTH_DIFFERENTIAL
        }
    };
    if coherent {
        return Ok(());
    }
    Err(ValidationError::new(
        path,
        format!(
            "{direction} on {pair} is directionally inconsistent: base trend {}, quote trend {}, differential {differential}",
            base.trend, quote.trend
        ),
    ))
}

fn parse_correlation(value: &Value, path: &str) -> Result<CurrencyCorrelation, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::new(path, "must be an object"));
    }
    let pair = nonempty_string(require(value, "pair", path)?, &field_path(path, "pair"))?;
    let correlation_path = field_path(path, "correlation");
    let correlation = number(require(value, "correlation", path)?, &correlation_path)?;
    if !(-1.0..=1.0).contains(&correlation) {
        return Err(ValidationError::new(
            correlation_path.as_str(),
            "must be between -1 and 1",
        ));
    }
    let explanation = nonempty_string(
        require(value, "explanation", path)?,
        &field_path(path, "explanation"),
    )?;
    let factors = string_list(
        require(value, "factors", path)?,
        &field_path(path, "factors"),
    )?;
    Ok(CurrencyCorrelation {
        pair,
        correlation,
        explanation,
        factors,
    })
}

fn parse_sentiment(value: &Value, path: &str) -> Result<MarketSentiment, ValidationError> {
    let overall: OverallSentiment = parse_variant(
        require(value, "overall", path)?,
        &field_path(path, "overall"),
        "risk-on, risk-off, neutral",
    )?;
    let confidence = score(
        require(value, "confidence", path)?,
        &field_path(path, "confidence"),
    )?;
    let drivers = string_list(
        require(value, "drivers", path)?,
        &field_path(path, "drivers"),
    )?;
    Ok(MarketSentiment {
        overall,
        confidence,
        drivers,
    })
}

// --- Value helpers ---

fn field_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn require<'a>(value: &'a Value, key: &str, parent: &str) -> Result<&'a Value, ValidationError> {
    value
        .get(key)
        .ok_or_else(|| ValidationError::new(field_path(parent, key), "missing required field"))
}

fn require_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, ValidationError> {
    value
        .as_array()
        .ok_or_else(|| ValidationError::new(path, "must be an array"))
}

fn nonempty_string(value: &Value, path: &str) -> Result<String, ValidationError> {
    let s = value
        .as_str()
        .ok_or_else(|| ValidationError::new(path, "must be a string"))?;
    if s.trim().is_empty() {
        return Err(ValidationError::new(path, "must be a non-empty string"));
    }
    Ok(s.to_string())
}

/// Integer score in the closed range [0, 100]. Fractional values are rejected.
fn score(value: &Value, path: &str) -> Result<u8, ValidationError> {
    let n = value
        .as_i64()
        .ok_or_else(|| ValidationError::new(path, "must be an integer"))?;
    if !(0..=100).contains(&n) {
        return Err(ValidationError::new(path, "must be between 0 and 100"));
    }
    Ok(n as u8)
}

fn number(value: &Value, path: &str) -> Result<f64, ValidationError> {
    value
        .as_f64()
        .ok_or_else(|| ValidationError::new(path, "must be a number"))
}

fn string_list(value: &Value, path: &str) -> Result<Vec<String>, ValidationError> {
    let items = require_array(value, path)?;
    if items.is_empty() {
        return Err(ValidationError::new(path, "must be a non-empty array"));
    }
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let s = item
            .as_str()
            .ok_or_else(|| ValidationError::new(format!("{path}[{i}]"), "must be a string"))?;
        out.push(s.to_string());
    }
    Ok(out)
}

fn parse_variant<T: DeserializeOwned>(
    value: &Value,
    path: &str,
    expected: &str,
) -> Result<T, ValidationError> {
    serde_json::from_value(value.clone())
        .map_err(|_| ValidationError::new(path, format!("must be one of {expected}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use serde_json::json;

    fn currency(symbol: &str, strength: u8, trend: &str) -> Value {
        json!({
            "currency": symbol,
            "strength": strength,
            "trend": trend,
            "factors": ["macro backdrop"]
        })
    }

    fn opportunity(pair: &str, direction: &str) -> Value {
        json!({
            "pair": pair,
            "type": direction,
            "timeframe": "medium",
            "strength": 85,
            "reasoning": ["divergent central bank paths"],
            "risk": "moderate",
            "stopLoss": 1.0820,
            "target": 1.1050
        })
    }

    fn sentiment() -> Value {
        json!({
            "overall": "risk-on",
            "confidence": 75,
            "drivers": ["equities rally"]
        })
    }

    fn payload(currencies: Vec<Value>, opportunities: Vec<Value>) -> Value {
        json!({
            "currencies": currencies,
            "opportunities": opportunities,
            "correlations": [],
            "marketSentiment": sentiment()
        })
    }

    #[test]
    fn valid_analysis_round_trips() {
        let analysis = Analysis {
            currencies: vec![
                CurrencyStrength {
                    currency: "USD".to_string(),
                    strength: 75,
                    trend: Trend::Up,
                    factors: vec!["hawkish Fed".to_string()],
                },
                CurrencyStrength {
                    currency: "EUR".to_string(),
                    strength: 40,
                    trend: Trend::Down,
                    factors: vec!["soft PMIs".to_string()],
                },
            ],
            opportunities: vec![TradingOpportunity {
                pair: "USD/EUR".to_string(),
                direction: TradeDirection::Buy,
                timeframe: Timeframe::Short,
                strength: 80,
                reasoning: vec!["rate differential widening".to_string()],
                risk: RiskLevel::Moderate,
                stop_loss: 1.0820,
                target: 1.1050,
            }],
            correlations: vec![CurrencyCorrelation {
                pair: "EUR/USD".to_string(),
                correlation: -0.85,
                explanation: "dollar strength pressures the euro".to_string(),
                factors: vec!["policy divergence".to_string()],
            }],
            market_sentiment: MarketSentiment {
                overall: OverallSentiment::RiskOff,
                confidence: 70,
                drivers: vec!["geopolitical stress".to_string()],
            },
        };
        let raw = serde_json::to_value(&analysis).unwrap();
        let validated = validate(&raw).unwrap();
        assert_eq!(validated, analysis);
    }

    #[test]
    fn empty_top_level_arrays_are_valid() {
        let raw = payload(vec![], vec![]);
        let analysis = validate(&raw).unwrap();
        assert!(analysis.currencies.is_empty());
        assert!(analysis.opportunities.is_empty());
    }

    #[test]
    fn missing_currencies_field_faults() {
        let raw = json!({
            "opportunities": [],
            "correlations": [],
            "marketSentiment": sentiment()
        });
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "currencies");
        assert!(err.reason.contains("missing"));
    }

    #[test]
    fn opportunities_as_string_faults() {
        let mut raw = payload(vec![], vec![]);
        raw["opportunities"] = json!("plenty");
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "opportunities");
        assert!(err.reason.contains("array"));
    }

    #[test]
    fn confidence_out_of_range_faults() {
        let mut raw = payload(vec![], vec![]);
        raw["marketSentiment"]["confidence"] = json!(150);
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "marketSentiment.confidence");
    }

    #[test]
    fn fractional_strength_faults() {
        let mut raw = payload(vec![currency("USD", 75, "up")], vec![]);
        raw["currencies"][0]["strength"] = json!(75.5);
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "currencies[0].strength");
        assert!(err.reason.contains("integer"));
    }

    #[test]
    fn currency_fault_names_index() {
        let raw = payload(
            vec![currency("USD", 75, "up"), currency("EUR", 40, "sideways")],
            vec![],
        );
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "currencies[1].trend");
    }

    #[test]
    fn empty_factors_array_faults() {
        let mut raw = payload(vec![currency("USD", 75, "up")], vec![]);
        raw["currencies"][0]["factors"] = json!([]);
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "currencies[0].factors");
    }

    #[test]
    fn non_string_factor_names_element_path() {
        let mut raw = payload(vec![currency("USD", 75, "up")], vec![]);
        raw["currencies"][0]["factors"] = json!(["ok", 7]);
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "currencies[0].factors[1]");
    }

    #[test]
    fn coherent_buy_validates() {
        let raw = payload(
            vec![currency("USD", 75, "up"), currency("EUR", 40, "down")],
            vec![opportunity("USD/EUR", "buy")],
        );
        let analysis = validate(&raw).unwrap();
        assert_eq!(analysis.opportunities[0].direction, TradeDirection::Buy);
    }

    #[test]
    fn sell_against_the_trend_faults() {
        let raw = payload(
            vec![currency("USD", 75, "up"), currency("EUR", 40, "down")],
            vec![opportunity("USD/EUR", "sell")],
        );
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "opportunities[0]");
        assert!(err.reason.contains("sell"));
    }

    #[test]
    fn buy_with_insufficient_differential_faults() {
        let raw = payload(
            vec![currency("USD", 55, "up"), currency("EUR", 40, "down")],
            vec![opportunity("USD/EUR", "buy")],
        );
        let err = validate(&raw).unwrap_err();
        assert!(err.reason.contains("differential 15"));
    }

    #[test]
    fn unknown_pair_symbol_faults() {
        let raw = payload(
            vec![currency("USD", 75, "up")],
            vec![opportunity("USD/JPY", "buy")],
        );
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "opportunities[0].pair");
        assert!(err.reason.contains("JPY"));
        assert!(err.reason.contains("USD/JPY"));
    }

    #[test]
    fn pair_without_slash_faults() {
        let raw = payload(
            vec![currency("USD", 75, "up"), currency("EUR", 40, "down")],
            vec![opportunity("USDEUR", "buy")],
        );
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "opportunities[0].pair");
        assert!(err.reason.contains("BASE/QUOTE"));
    }

    #[test]
    fn correlation_out_of_range_faults() {
        let mut raw = payload(vec![], vec![]);
        raw["correlations"] = json!([{
            "pair": "EUR/USD",
            "correlation": 1.5,
            "explanation": "overshoot",
            "factors": ["noise"]
        }]);
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "correlations[0].correlation");
    }

    #[test]
    fn empty_correlation_explanation_faults() {
        let mut raw = payload(vec![], vec![]);
        raw["correlations"] = json!([{
            "pair": "EUR/USD",
            "correlation": 0.4,
            "explanation": "",
            "factors": ["noise"]
        }]);
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "correlations[0].explanation");
    }

    #[test]
    fn non_object_root_faults() {
        let err = validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.path, "$");
    }

    #[test]
    fn differential_boundary_is_inclusive_at_twenty() {
        // Buy: exactly 20 clears, 19 faults.
        let raw = payload(
            vec![currency("USD", 60, "up"), currency("EUR", 40, "down")],
            vec![opportunity("USD/EUR", "buy")],
        );
        assert!(validate(&raw).is_ok());

        let raw = payload(
            vec![currency("USD", 59, "up"), currency("EUR", 40, "down")],
            vec![opportunity("USD/EUR", "buy")],
        );
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "opportunities[0]");
        assert!(err.reason.contains("differential 19"));

        // Sell mirrors at -20.
        let raw = payload(
            vec![currency("USD", 40, "down"), currency("EUR", 60, "up")],
            vec![opportunity("USD/EUR", "sell")],
        );
        assert!(validate(&raw).is_ok());

        let raw = payload(
            vec![currency("USD", 41, "down"), currency("EUR", 60, "up")],
            vec![opportunity("USD/EUR", "sell")],
        );
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.path, "opportunities[0]");
        assert!(err.reason.contains("differential -19"));
    }

    // Randomized coverage of the directional invariant: a buy validates
    // iff base trends up, quote trends down, and the differential is at
    // least 20; symmetric for sell.
    #[test]
    fn direction_invariant_holds_for_random_inputs() {
        let trends = ["up", "down", "neutral"];
        let mut rng = rand::rng();
        for _ in 0..500 {
            let base_strength: u8 = rng.random_range(0..=100);
            let quote_strength: u8 = rng.random_range(0..=100);
            let base_trend = trends[rng.random_range(0..trends.len())];
            let quote_trend = trends[rng.random_range(0..trends.len())];
            let direction = if rng.random_range(0..2) == 0 { "buy" } else { "sell" };

            let differential = base_strength as i16 - quote_strength as i16;
            let expect_ok = match direction {
                "buy" => base_trend == "up" && quote_trend == "down" && differential >= 20,
                _ => base_trend == "down" && quote_trend == "up" && -differential >= 20,
            };

            let raw = payload(
                vec![
                    currency("USD", base_strength, base_trend),
                    currency("EUR", quote_strength, quote_trend),
                ],
                vec![opportunity("USD/EUR", direction)],
            );
            let result = validate(&raw);
            assert_eq!(
                result.is_ok(),
                expect_ok,
                "direction={direction} base={base_strength}/{base_trend} quote={quote_strength}/{quote_trend}: {result:?}"
            );
        }
    }
}
