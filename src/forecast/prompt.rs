use crate::data::PricePoint;

/// Builds the forecast prompt. The same inputs always give the same text.
pub fn build_prompt(
    symbol: &str,
    current_price: f64,
    timeframe: &str,
    history: &[PricePoint],
) -> String {
    let prices: Vec<f64> = history.iter().map(|point| point.price).collect();

    format!(
        "Based on the current market conditions and historical patterns:
- Cryptocurrency: {symbol}
- Current Price: ${current_price}
- Timeframe: {timeframe}
- Last {hours} hours prices: {prices:?}

Provide a price prediction analysis and potential price range for {symbol} in the next {timeframe}.
Format the response as JSON with fields:
- predicted_range_low (number)
- predicted_range_high (number)
- confidence_level (string)
- market_sentiment (string: \"BULLISH\", \"BEARISH\", or \"NEUTRAL\")
- sentiment_strength (number: 1-10, where 1 is weakest and 10 is strongest)
- key_indicators (array of strings with technical indicators supporting the sentiment)
- hourly_predictions (array of 24 price predictions)
- analysis (string)
- support_levels (array of numbers)
- resistance_levels (array of numbers)
",
        hours = history.len(),
    )
}
