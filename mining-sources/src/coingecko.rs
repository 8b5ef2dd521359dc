//! CoinGecko simple price client
//!
//! Free tier, no authentication, aggressive rate limits. A failed call
//! degrades to a static price table so a cycle never fails on prices.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use mining_core::CoinSpec;

use crate::adapter::{get_body, PriceSource, PriceTable};
use crate::error::SourceError;

const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

pub const COINGECKO_LABEL: &str = "CoinGecko API";

/// Default delay before each price request
pub const DEFAULT_PRE_CALL_DELAY: Duration = Duration::from_millis(500);

/// Prices used when CoinGecko is unavailable
const FALLBACK_PRICES: &[(&str, f64)] = &[
    ("BTC", 92_000.0),
    ("BCH", 450.0),
    ("XEC", 0.000_03),
    ("LTC", 85.0),
    ("DOGE", 0.16),
    ("BSV", 45.0),
];

fn gecko_id(coin_id: &str) -> Option<&'static str> {
    match coin_id {
        "BTC" => Some("bitcoin"),
        "BCH" => Some("bitcoin-cash"),
        "XEC" => Some("ecash"),
        "LTC" => Some("litecoin"),
        "DOGE" => Some("dogecoin"),
        "BSV" => Some("bitcoin-cash-sv"),
        _ => None,
    }
}

/// Fallback table restricted to the requested coins
pub fn fallback_prices(coins: &[&'static CoinSpec]) -> PriceTable {
    let prices = coins
        .iter()
        .map(|coin| {
            let price = FALLBACK_PRICES
                .iter()
                .find(|(id, _)| *id == coin.id)
                .map(|(_, p)| *p)
                .unwrap_or(0.0);
            (coin.id.to_string(), price)
        })
        .collect();
    PriceTable::fallback(prices)
}

/// CoinGecko API client
#[derive(Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
    pre_call_delay: Duration,
}

impl CoinGeckoClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, COINGECKO_API_BASE)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            pre_call_delay: DEFAULT_PRE_CALL_DELAY,
        }
    }

    pub fn with_pre_call_delay(mut self, delay: Duration) -> Self {
        self.pre_call_delay = delay;
        self
    }

    /// Parse a `/simple/price` payload, `0` for coins missing from it
    pub fn parse_prices(coins: &[&'static CoinSpec], body: &str) -> Result<PriceTable, SourceError> {
        let quotes: HashMap<String, HashMap<String, Option<f64>>> = serde_json::from_str(body)?;

        let prices = coins
            .iter()
            .map(|coin| {
                let price = gecko_id(coin.id)
                    .and_then(|id| quotes.get(id))
                    .and_then(|q| q.get("usd").copied().flatten())
                    .filter(|p| p.is_finite() && *p >= 0.0)
                    .unwrap_or(0.0);
                (coin.id.to_string(), price)
            })
            .collect();

        Ok(PriceTable::observed(prices))
    }

    async fn try_fetch(&self, coins: &[&'static CoinSpec]) -> Result<PriceTable, SourceError> {
        let ids: Vec<&str> = coins.iter().filter_map(|c| gecko_id(c.id)).collect();
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url,
            ids.join(",")
        );
        debug!("[CoinGecko] Fetching prices from: {}", url);

        let body = get_body(&self.http, &url).await?;
        Self::parse_prices(coins, &body)
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    fn label(&self) -> &str {
        COINGECKO_LABEL
    }

    async fn fetch_prices(&self, coins: &[&'static CoinSpec]) -> PriceTable {
        if !self.pre_call_delay.is_zero() {
            tokio::time::sleep(self.pre_call_delay).await;
        }

        match self.try_fetch(coins).await {
            Ok(table) => {
                info!("[CoinGecko] Fetched prices for {} coins", table.len());
                table
            }
            Err(e) => {
                warn!("[CoinGecko] Price fetch failed ({}), using fallback prices", e);
                fallback_prices(coins)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins() -> Vec<&'static CoinSpec> {
        ["BTC", "BCH", "XEC"]
            .iter()
            .map(|id| CoinSpec::lookup(id).unwrap())
            .collect()
    }

    #[test]
    fn test_parse_prices_fills_missing_with_zero() {
        let body = r#"{"bitcoin": {"usd": 91500.12}, "bitcoin-cash": {"usd": 455.3}}"#;
        let table = CoinGeckoClient::parse_prices(&coins(), body).unwrap();
        assert_eq!(table.price("BTC"), 91500.12);
        assert_eq!(table.price("BCH"), 455.3);
        assert_eq!(table.price("XEC"), 0.0);
        assert!(!table.is_fallback());
    }

    #[test]
    fn test_parse_prices_rejects_error_payload() {
        assert!(CoinGeckoClient::parse_prices(&coins(), r#"{"error": "Throttled"}"#).is_err());
    }

    #[test]
    fn test_fallback_prices_cover_requested_coins() {
        let table = fallback_prices(&coins());
        assert!(table.is_fallback());
        assert_eq!(table.len(), 3);
        assert_eq!(table.price("BTC"), 92_000.0);
        assert_eq!(table.price("XEC"), 0.000_03);
        assert_eq!(table.price("LTC"), 0.0);
    }

    #[tokio::test]
    async fn test_unreachable_provider_degrades_to_fallback() {
        let http = crate::adapter::build_http_client(Duration::from_secs(2)).unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let client = CoinGeckoClient::with_base_url(http, "http://127.0.0.1:9")
            .with_pre_call_delay(Duration::ZERO);
        let table = client.fetch_prices(&coins()).await;
        assert!(table.is_fallback());
        assert_eq!(table.price("BCH"), 450.0);
    }
}
