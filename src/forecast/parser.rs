use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::sync::LazyLock;
use tracing::warn;

use super::{ForecastResult, Sentiment, DEFAULT_SENTIMENT_STRENGTH};

/// Fenced block tagged `json`, matched lazily across newlines.
static JSON_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\n(.*?)\n```").expect("Invalid regex"));

/// Pulls the first fenced JSON block out of a model reply and decodes it.
///
/// Returns `None` when there is no block or its content is not a JSON object.
pub fn extract_json_block(text: &str) -> Option<Map<String, Value>> {
    let body = JSON_BLOCK_REGEX.captures(text)?.get(1)?.as_str();

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => Some(object),
        Ok(_) => {
            warn!("fenced json block is not an object");
            None
        }
        Err(err) => {
            warn!(error = %err, "fenced json block failed to decode");
            None
        }
    }
}

/// Parses a model reply into a [`ForecastResult`]. Never fails; anything
/// missing or malformed takes its default.
pub fn parse_forecast(text: &str) -> ForecastResult {
    match extract_json_block(text) {
        Some(object) => ForecastResult::from_object(&object),
        None => {
            warn!("no usable json in model reply, using defaults");
            ForecastResult::default()
        }
    }
}

impl ForecastResult {
    /// Fills every field once from a decoded object. A field that is absent
    /// or has the wrong shape falls back on its own; the others are kept.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        ForecastResult {
            predicted_range_low: field(object, "predicted_range_low"),
            predicted_range_high: field(object, "predicted_range_high"),
            confidence_level: field(object, "confidence_level"),
            market_sentiment: field::<String>(object, "market_sentiment")
                .and_then(|s| s.parse::<Sentiment>().ok())
                .unwrap_or_default(),
            sentiment_strength: field(object, "sentiment_strength")
                .unwrap_or_else(|| Number::from(DEFAULT_SENTIMENT_STRENGTH)),
            key_indicators: field(object, "key_indicators").unwrap_or_default(),
            hourly_predictions: field(object, "hourly_predictions").unwrap_or_default(),
            analysis: field(object, "analysis"),
            support_levels: field(object, "support_levels").unwrap_or_default(),
            resistance_levels: field(object, "resistance_levels").unwrap_or_default(),
        }
    }
}

fn field<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Option<T> {
    let value = object.get(key)?;
    serde_json::from_value(value.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fenced(body: &str) -> String {
        format!("Here is my analysis.\n```json\n{body}\n```\nGood luck!")
    }

    #[test]
    fn partial_object_keeps_defaults() {
        let text = fenced(r#"{"predicted_range_low": 90, "market_sentiment": "BULLISH"}"#);

        let forecast = parse_forecast(&text);

        assert_eq!(forecast.predicted_range_low, Some(90.0));
        assert_eq!(forecast.market_sentiment, Sentiment::Bullish);
        assert_eq!(forecast.predicted_range_high, None);
        assert_eq!(forecast.sentiment_strength, Number::from(5));
        assert!(forecast.key_indicators.is_empty());
        assert!(forecast.hourly_predictions.is_empty());
        assert_eq!(forecast.analysis, None);
    }

    #[test]
    fn full_object_is_decoded() {
        let text = fenced(
            r#"{
  "predicted_range_low": 61000.5,
  "predicted_range_high": 66000,
  "confidence_level": "medium",
  "market_sentiment": "bearish",
  "sentiment_strength": 7,
  "key_indicators": ["RSI divergence", "MACD cross"],
  "hourly_predictions": [64000, 63900.5],
  "analysis": "Momentum is fading.",
  "support_levels": [62000],
  "resistance_levels": [65000, 66500]
}"#,
        );

        let forecast = parse_forecast(&text);

        assert_eq!(forecast.predicted_range_high, Some(66000.0));
        assert_eq!(forecast.confidence_level.as_deref(), Some("medium"));
        assert_eq!(forecast.market_sentiment, Sentiment::Bearish);
        assert_eq!(forecast.sentiment_strength, Number::from(7));
        assert_eq!(forecast.key_indicators, vec!["RSI divergence", "MACD cross"]);
        assert_eq!(forecast.hourly_predictions, vec![64000.0, 63900.5]);
        assert_eq!(forecast.support_levels, vec![62000.0]);
        assert_eq!(forecast.resistance_levels, vec![65000.0, 66500.0]);
    }

    #[test]
    fn wrong_shapes_fall_back_per_field() {
        let text = fenced(
            r#"{"sentiment_strength": "high", "market_sentiment": "SIDEWAYS",
                "hourly_predictions": [1, "two"], "predicted_range_low": null,
                "analysis": "kept"}"#,
        );

        let forecast = parse_forecast(&text);

        assert_eq!(forecast.sentiment_strength, Number::from(5));
        assert_eq!(forecast.market_sentiment, Sentiment::Neutral);
        assert!(forecast.hourly_predictions.is_empty());
        assert_eq!(forecast.predicted_range_low, None);
        assert_eq!(forecast.analysis.as_deref(), Some("kept"));
    }

    #[test]
    fn sentiment_strength_keeps_its_number_form() {
        let whole = parse_forecast(&fenced(r#"{"sentiment_strength": 8}"#));
        let fractional = parse_forecast(&fenced(r#"{"sentiment_strength": 6.5}"#));

        assert_eq!(serde_json::to_string(&whole.sentiment_strength).unwrap(), "8");
        assert_eq!(serde_json::to_string(&fractional.sentiment_strength).unwrap(), "6.5");
        assert_eq!(
            serde_json::to_string(&ForecastResult::default().sentiment_strength).unwrap(),
            "5"
        );
    }

    #[test]
    fn missing_block_yields_defaults() {
        let text = r#"{"predicted_range_low": 90}"#;
        assert!(extract_json_block(text).is_none());
        assert_eq!(parse_forecast(text), ForecastResult::default());
    }

    #[test]
    fn malformed_block_yields_defaults() {
        let text = fenced(r#"{"predicted_range_low": 90,"#);
        assert_eq!(parse_forecast(&text), ForecastResult::default());
    }

    #[test]
    fn non_object_block_yields_defaults() {
        assert!(extract_json_block(&fenced("[1, 2, 3]")).is_none());
    }

    #[test]
    fn first_block_wins() {
        let text = format!(
            "{}\n{}",
            fenced(r#"{"analysis": "first"}"#),
            fenced(r#"{"analysis": "second"}"#)
        );
        assert_eq!(parse_forecast(&text).analysis.as_deref(), Some("first"));
    }
}
