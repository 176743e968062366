use serde::Serialize;

use crate::data::round_to;
use crate::forecast::Sentiment;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendMetrics {
    pub average_change_percentage: f64,
    pub trend_direction: Sentiment,
    pub trend_strength: f64,
}

impl TrendMetrics {
    /// Average percent change of the hourly predictions against the current
    /// price.
    ///
    /// Returns `None` when there are no predictions, or when the current price
    /// is not a positive finite number. The
    /// direction is taken from the unrounded average; the strength is the
    /// absolute value of the rounded one.
    pub fn calculate(hourly_predictions: &[f64], current_price: f64) -> Option<Self> {
        if hourly_predictions.is_empty() || !current_price.is_finite() || current_price <= 0.0 {
            return None;
        }

        let total: f64 = hourly_predictions
            .iter()
            .map(|predicted| ((predicted - current_price) / current_price) * 100.0)
            .sum();
        let average = total / hourly_predictions.len() as f64;
        let rounded = round_to(average, 2);

        let trend_direction = if average > 0.0 {
            Sentiment::Bullish
        } else if average < 0.0 {
            Sentiment::Bearish
        } else {
            Sentiment::Neutral
        };

        Some(TrendMetrics {
            average_change_percentage: rounded,
            trend_direction,
            trend_strength: rounded.abs(),
        })
    }
}
