use std::collections::HashMap;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{is_supported, HistoricalSeries, PricePoint};
use crate::error::UpstreamError;

const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Deserialize, Debug)]
struct SpotQuote {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
    last_updated_at: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct MarketChart {
    prices: Option<Vec<(f64, f64)>>,
}

/// CoinGecko client for spot prices and hourly history.
#[derive(Clone)]
pub struct MarketClient {
    client: Client,
    base_url: String,
}

impl MarketClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        MarketClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Current USD spot price. A single request, no retry.
    pub async fn current_price(&self, symbol: &str) -> Result<f64, UpstreamError> {
        let quote = self.spot_quote(symbol, false).await?;
        quote.usd.ok_or(UpstreamError::MissingField("usd"))
    }

    /// Last `hours` hourly prices, oldest first.
    ///
    /// Never fails: an unsupported symbol yields an empty series, and a
    /// failed or empty market chart falls back to
    /// [`MarketClient::historical_prices_alternative`].
    pub async fn historical_prices(&self, symbol: &str, hours: usize) -> HistoricalSeries {
        if !is_supported(symbol) {
            warn!(symbol, "unsupported coin id, skipping history");
            return Vec::new();
        }

        match self.market_chart(&symbol.to_lowercase(), hours).await {
            Ok(series) if !series.is_empty() => series,
            Ok(_) => {
                warn!(symbol, "market chart returned no prices, estimating history");
                self.historical_prices_alternative(symbol, hours).await
            }
            Err(err) => {
                warn!(symbol, error = %err, "market chart failed, estimating history");
                self.historical_prices_alternative(symbol, hours).await
            }
        }
    }

    /// Estimated history built from the spot price and its 24h change.
    ///
    /// This is a linear extrapolation, not observed data. Returns an empty
    /// series if the spot request fails.
    pub async fn historical_prices_alternative(
        &self,
        symbol: &str,
        hours: usize,
    ) -> HistoricalSeries {
        let quote = match self.spot_quote(&symbol.to_lowercase(), true).await {
            Ok(quote) => quote,
            Err(err) => {
                warn!(symbol, error = %err, "alternative price fetch failed");
                return Vec::new();
            }
        };

        let Some(current_price) = quote.usd else {
            warn!(symbol, "alternative price fetch returned no usd price");
            return Vec::new();
        };

        synthesize_history(
            current_price,
            quote.usd_24h_change.unwrap_or(0.0),
            quote.last_updated_at.unwrap_or_else(|| Utc::now().timestamp()),
            hours,
        )
    }

    async fn market_chart(&self, coin_id: &str, hours: usize) -> Result<HistoricalSeries, UpstreamError> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, coin_id);
        let days = (hours as f64 / 24.0).to_string();
        debug!(%url, %days, "fetching market chart");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", "usd"),
                ("days", days.as_str()),
                ("interval", "hourly"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let chart: MarketChart = response.json().await?;
        let prices = chart.prices.ok_or(UpstreamError::MissingField("prices"))?;
        debug!(count = prices.len(), "market chart points received");

        let skip = prices.len().saturating_sub(hours);
        Ok(prices
            .into_iter()
            .skip(skip)
            .filter_map(|(millis, price)| PricePoint::from_epoch_millis(millis as i64, price))
            .collect())
    }

    async fn spot_quote(&self, id: &str, with_change: bool) -> Result<SpotQuote, UpstreamError> {
        let url = format!("{}/simple/price", self.base_url);
        let mut query = vec![("ids", id), ("vs_currencies", "usd")];
        if with_change {
            query.push(("include_24hr_change", "true"));
            query.push(("include_last_updated_at", "true"));
        }
        debug!(%url, id, "fetching spot price");

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let mut quotes: HashMap<String, SpotQuote> = response.json().await?;
        quotes
            .remove(id)
            .ok_or_else(|| UpstreamError::MissingQuote(id.to_string()))
    }
}

/// Walks back `hours` steps from `last_updated`, assuming the 24h change was
/// spread evenly across every hour. The most recent point sits one hour
/// before `last_updated`.
pub fn synthesize_history(
    current_price: f64,
    change_24h: f64,
    last_updated: i64,
    hours: usize,
) -> HistoricalSeries {
    let change_per_hour = change_24h / 24.0;

    (1..=hours)
        .rev()
        .filter_map(|steps_back| {
            let timestamp = last_updated - SECONDS_PER_HOUR * steps_back as i64;
            let price = current_price * (1.0 - change_per_hour * steps_back as f64 / 100.0);
            PricePoint::from_epoch_secs(timestamp, price)
        })
        .collect()
}
