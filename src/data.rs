use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub mod coingecko;

/// Coin ids the history endpoints are queried for. Anything else gets an
/// empty series without touching the network.
pub const SUPPORTED_COINS: &[&str] = &[
    "bitcoin", "ethereum", "dogecoin", "solana", "cardano", "ripple", "litecoin",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

/// Hourly prices, oldest first.
pub type HistoricalSeries = Vec<PricePoint>;

impl PricePoint {
    /// Builds a point from an epoch-seconds timestamp, rounding the price to
    /// six fractional digits. Returns `None` for out-of-range timestamps.
    pub fn from_epoch_secs(secs: i64, price: f64) -> Option<Self> {
        let ts = DateTime::from_timestamp(secs, 0)?;
        Some(PricePoint {
            timestamp: ts.naive_utc(),
            price: round_to(price, 6),
        })
    }

    /// Same as [`PricePoint::from_epoch_secs`]; sub-second precision is dropped.
    pub fn from_epoch_millis(millis: i64, price: f64) -> Option<Self> {
        Self::from_epoch_secs(millis.div_euclid(1000), price)
    }
}

pub fn is_supported(symbol: &str) -> bool {
    let symbol = symbol.to_lowercase();
    SUPPORTED_COINS.contains(&symbol.as_str())
}

/// Rounds the exact decimal value of `value` to `places` digits, so 1.115
/// (stored as 1.11499...) becomes 1.11, not 1.12.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}
