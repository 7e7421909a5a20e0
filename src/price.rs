//! SOL price feed (CoinGecko API) and sparkline geometry

use crate::config::PriceConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Points kept for the 24h sparkline
pub const SPARKLINE_POINTS: usize = 24;

/// Inner padding of the sparkline in pixels
const SPARKLINE_PADDING: f64 = 4.0;

/// Current price and 24h change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub currency: String,
    pub price: f64,
    /// Percent change over 24 hours
    pub change_24h: f64,
}

#[derive(Debug, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

/// Client for the price API
pub struct PriceFeed {
    client: Client,
    config: PriceConfig,
}

impl PriceFeed {
    pub fn new(config: PriceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        debug!("[Price] GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch price data")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Price API error {}: {}", status, body);
        }

        response.json().await.context("Failed to parse price response")
    }

    /// Current price and 24h change in the configured currency
    pub async fn fetch_quote(&self) -> Result<PriceQuote> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}&include_24hr_change=true",
            self.config.api_url, self.config.coin_id, self.config.currency
        );
        let body = self.get_json(&url).await?;

        let coin = body
            .get(&self.config.coin_id)
            .with_context(|| format!("No price for {}", self.config.coin_id))?;
        let price = coin
            .get(&self.config.currency)
            .and_then(Value::as_f64)
            .with_context(|| format!("No {} price for {}", self.config.currency, self.config.coin_id))?;
        let change_24h = coin
            .get(format!("{}_24h_change", self.config.currency))
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        Ok(PriceQuote {
            currency: self.config.currency.clone(),
            price,
            change_24h,
        })
    }

    /// The last [`SPARKLINE_POINTS`] prices of the 1-day market chart
    pub async fn fetch_sparkline(&self) -> Result<Vec<f64>> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days=1",
            self.config.api_url, self.config.coin_id, self.config.currency
        );
        let body = self.get_json(&url).await?;
        let chart: MarketChart = serde_json::from_value(body).context("Unexpected market chart shape")?;

        let prices: Vec<f64> = chart.prices.into_iter().map(|(_, price)| price).collect();
        let start = prices.len().saturating_sub(SPARKLINE_POINTS);
        Ok(prices[start..].to_vec())
    }

    /// Current price, or the configured fallback when the feed is unavailable
    pub async fn price_or_fallback(&self) -> f64 {
        match self.fetch_quote().await {
            Ok(quote) => quote.price,
            Err(e) => {
                warn!("[Price] Using fallback price {}: {:#}", self.config.fallback_price, e);
                self.config.fallback_price
            }
        }
    }
}

/// `+1.23%` / `-0.40%`
pub fn format_change(change: f64) -> String {
    if change > 0.0 {
        format!("+{:.2}%", change)
    } else {
        format!("{:.2}%", change)
    }
}

/// SVG path data for a sparkline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SparklinePaths {
    /// `M x y L x y ...`
    pub line: String,
    /// The line closed along the bottom edge, for the fill
    pub area: String,
}

/// Scale prices into a `width` x `height` box. Needs at least two points.
pub fn sparkline_paths(prices: &[f64], width: f64, height: f64) -> Option<SparklinePaths> {
    if prices.len() < 2 {
        return None;
    }

    let chart_width = width - SPARKLINE_PADDING * 2.0;
    let chart_height = height - SPARKLINE_PADDING * 2.0;

    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max - min == 0.0 { 1.0 } else { max - min };

    let last = (prices.len() - 1) as f64;
    let points: Vec<(f64, f64)> = prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            let x = (i as f64 / last) * chart_width;
            let y = chart_height - ((price - min) / range) * chart_height;
            (x + SPARKLINE_PADDING, y + SPARKLINE_PADDING)
        })
        .collect();

    let line = points
        .iter()
        .enumerate()
        .map(|(i, (x, y))| format!("{} {} {}", if i == 0 { "M" } else { "L" }, x, y))
        .collect::<Vec<_>>()
        .join(" ");

    let bottom = chart_height + SPARKLINE_PADDING;
    let (first_x, _) = points[0];
    let (last_x, _) = points[points.len() - 1];
    let area = format!("{} L {} {} L {} {} Z", line, last_x, bottom, first_x, bottom);

    Some(SparklinePaths { line, area })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Json, Router};
    use serde_json::json;

    async fn spawn_price_api() -> String {
        let app = Router::new()
            .route(
                "/simple/price",
                get(|| async { Json(json!({ "solana": { "inr": 15234.5, "inr_24h_change": -2.5 } })) }),
            )
            .route(
                "/coins/solana/market_chart",
                get(|| async {
                    let prices: Vec<Value> = (0..30).map(|i| json!([i * 1000, 100.0 + i as f64])).collect();
                    Json(json!({ "prices": prices }))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn feed(api_url: String) -> PriceFeed {
        PriceFeed::new(PriceConfig {
            api_url,
            ..PriceConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_quote() {
        let feed = feed(spawn_price_api().await);
        let quote = feed.fetch_quote().await.unwrap();
        assert_eq!(quote.price, 15234.5);
        assert_eq!(quote.change_24h, -2.5);
        assert_eq!(quote.currency, "inr");
    }

    #[tokio::test]
    async fn test_sparkline_keeps_last_24() {
        let feed = feed(spawn_price_api().await);
        let prices = feed.fetch_sparkline().await.unwrap();
        assert_eq!(prices.len(), SPARKLINE_POINTS);
        assert_eq!(prices[0], 106.0);
        assert_eq!(prices[23], 129.0);
    }

    #[tokio::test]
    async fn test_fallback_when_unreachable() {
        let feed = feed("http://127.0.0.1:1".to_string());
        assert_eq!(feed.price_or_fallback().await, 20_000.0);
    }

    #[test]
    fn test_sparkline_paths() {
        let paths = sparkline_paths(&[1.0, 3.0, 2.0], 108.0, 48.0).unwrap();
        assert_eq!(paths.line, "M 4 44 L 54 4 L 104 24");
        assert_eq!(paths.area, "M 4 44 L 54 4 L 104 24 L 104 44 L 4 44 Z");
    }

    #[test]
    fn test_sparkline_flat_series() {
        let paths = sparkline_paths(&[5.0, 5.0], 28.0, 28.0).unwrap();
        assert_eq!(paths.line, "M 4 24 L 24 24");
    }

    #[test]
    fn test_sparkline_needs_two_points() {
        assert!(sparkline_paths(&[1.0], 100.0, 80.0).is_none());
        assert!(sparkline_paths(&[], 100.0, 80.0).is_none());
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(1.234), "+1.23%");
        assert_eq!(format_change(-0.4), "-0.40%");
        assert_eq!(format_change(0.0), "0.00%");
    }
}
