use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::data::PricePoint;
use crate::error::PredictError;
use crate::model::LanguageModel;

pub mod parser;
pub mod prompt;

pub use parser::parse_forecast;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl FromStr for Sentiment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BULLISH" => Ok(Sentiment::Bullish),
            "BEARISH" => Ok(Sentiment::Bearish),
            "NEUTRAL" => Ok(Sentiment::Neutral),
            _ => Err(()),
        }
    }
}

/// Model forecast with every field resolved: either the value the model
/// returned or its default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub predicted_range_low: Option<f64>,
    pub predicted_range_high: Option<f64>,
    pub confidence_level: Option<String>,
    pub market_sentiment: Sentiment,
    /// Kept as the model wrote it, so an integer stays an integer.
    pub sentiment_strength: Number,
    pub key_indicators: Vec<String>,
    pub hourly_predictions: Vec<f64>,
    pub analysis: Option<String>,
    pub support_levels: Vec<f64>,
    pub resistance_levels: Vec<f64>,
}

pub const DEFAULT_SENTIMENT_STRENGTH: u64 = 5;

impl Default for ForecastResult {
    fn default() -> Self {
        ForecastResult {
            predicted_range_low: None,
            predicted_range_high: None,
            confidence_level: None,
            market_sentiment: Sentiment::Neutral,
            sentiment_strength: Number::from(DEFAULT_SENTIMENT_STRENGTH),
            key_indicators: Vec::new(),
            hourly_predictions: Vec::new(),
            analysis: None,
            support_levels: Vec::new(),
            resistance_levels: Vec::new(),
        }
    }
}

/// Asks the model for a forecast and returns its raw reply.
pub async fn request_forecast(
    model: &dyn LanguageModel,
    symbol: &str,
    current_price: f64,
    timeframe: &str,
    history: &[PricePoint],
) -> Result<String, PredictError> {
    let prompt = prompt::build_prompt(symbol, current_price, timeframe, history);
    debug!(symbol, timeframe, "requesting forecast");

    model.generate(&prompt).await.map_err(|err| {
        warn!(symbol, error = %err, "language model call failed");
        PredictError::ModelUnavailable(err.to_string())
    })
}
