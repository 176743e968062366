use crate::analytics::trend::TrendMetrics;
use crate::data::coingecko::MarketClient;
use crate::data::HistoricalSeries;
use crate::error::PredictError;
use crate::forecast::{self, ForecastResult, Sentiment};
use crate::model::LanguageModel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Number;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct PredictedRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketAnalysis {
    pub sentiment: Sentiment,
    pub sentiment_strength: Number,
    pub key_indicators: Vec<String>,
    pub support_levels: Vec<f64>,
    pub resistance_levels: Vec<f64>,
}

/// Everything the chart needs for one prediction request.
#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub current_price: f64,
    pub historical_prices: HistoricalSeries,
    pub predicted_range: PredictedRange,
    pub market_analysis: MarketAnalysis,
    pub trend_analysis: Option<TrendMetrics>,
    pub hourly_predictions: Vec<f64>,
    pub confidence_level: Option<String>,
    pub analysis: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub timeframe: String,
    pub symbol: String,
}

impl ChartData {
    pub fn assemble(
        symbol: &str,
        timeframe: &str,
        current_price: f64,
        historical_prices: HistoricalSeries,
        forecast: ForecastResult,
        trend_analysis: Option<TrendMetrics>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        ChartData {
            current_price,
            historical_prices,
            predicted_range: PredictedRange {
                low: forecast.predicted_range_low,
                high: forecast.predicted_range_high,
            },
            market_analysis: MarketAnalysis {
                sentiment: forecast.market_sentiment,
                sentiment_strength: forecast.sentiment_strength,
                key_indicators: forecast.key_indicators,
                support_levels: forecast.support_levels,
                resistance_levels: forecast.resistance_levels,
            },
            trend_analysis,
            hourly_predictions: forecast.hourly_predictions,
            confidence_level: forecast.confidence_level,
            analysis: forecast.analysis,
            timestamp: generated_at,
            timeframe: timeframe.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

/// Runs the prediction pipeline. Holds no per-request state, so one engine
/// serves every request.
pub struct Engine {
    market: MarketClient,
    model: Arc<dyn LanguageModel>,
    history_hours: usize,
}

impl Engine {
    pub fn new(market: MarketClient, model: Arc<dyn LanguageModel>, history_hours: usize) -> Self {
        Engine {
            market,
            model,
            history_hours,
        }
    }

    /// price -> history (with fallback) -> model -> parse -> trend -> assemble.
    ///
    /// Only a missing spot price or a failed model call abort; everything
    /// else degrades to defaults.
    pub async fn run(&self, symbol: &str, timeframe: &str) -> Result<ChartData, PredictError> {
        let current_price = self.market.current_price(symbol).await.map_err(|err| {
            warn!(symbol, error = %err, "spot price unavailable");
            PredictError::PriceUnavailable(err.to_string())
        })?;

        let history = self
            .market
            .historical_prices(symbol, self.history_hours)
            .await;
        info!(symbol, current_price, points = history.len(), "market data loaded");

        let reply = forecast::request_forecast(
            self.model.as_ref(),
            symbol,
            current_price,
            timeframe,
            &history,
        )
        .await?;

        let forecast = forecast::parse_forecast(&reply);
        let trend = TrendMetrics::calculate(&forecast.hourly_predictions, current_price);

        Ok(ChartData::assemble(
            symbol,
            timeframe,
            current_price,
            history,
            forecast,
            trend,
            Utc::now(),
        ))
    }
}
