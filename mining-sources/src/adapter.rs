//! Adapter traits and shared HTTP plumbing

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::time::Duration;

use mining_core::{parse_number, CoinRecord, CoinSpec};

use crate::error::SourceError;

/// Default per-request timeout for every upstream call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Some providers reject requests without a browser-like agent
const USER_AGENT: &str = "Mozilla/5.0 (compatible; MiningMonitor/1.0)";

/// A provider of difficulty/hashrate data for one or more coins.
///
/// Implementations target exactly one upstream endpoint, normalize units
/// before returning, and never retry. Every failure is returned as a
/// [`SourceError`] value.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Configuration key (e.g., "blockchair")
    fn name(&self) -> &str;

    /// Human-readable label stored in `CoinRecord::data_source`
    fn label(&self) -> &str;

    /// Upstream host, used to pace calls to the same provider
    fn host(&self) -> &str;

    /// Whether calls should go through the per-host pacer
    fn paced(&self) -> bool {
        true
    }

    /// Whether this adapter knows how to fetch the coin at all
    fn supports(&self, coin: &CoinSpec) -> bool;

    /// Fetch and normalize one coin's record
    async fn fetch(&self, coin: &CoinSpec) -> Result<CoinRecord, SourceError>;
}

/// USD prices for one cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    prices: HashMap<String, f64>,
    fallback: bool,
}

impl PriceTable {
    /// Prices observed from a provider
    pub fn observed(prices: HashMap<String, f64>) -> Self {
        Self {
            prices,
            fallback: false,
        }
    }

    /// Static defaults used when the provider is unavailable
    pub fn fallback(prices: HashMap<String, f64>) -> Self {
        Self {
            prices,
            fallback: true,
        }
    }

    /// Price for a coin, `0` when absent
    pub fn price(&self, coin_id: &str) -> f64 {
        self.prices.get(coin_id).copied().unwrap_or(0.0)
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// A provider of USD quotes.
///
/// Never fails outright: on any upstream problem it degrades to a static
/// fallback table covering the requested coins.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn label(&self) -> &str;

    async fn fetch_prices(&self, coins: &[&'static CoinSpec]) -> PriceTable;
}

/// Build the HTTP client shared by all adapters
pub fn build_http_client(timeout: Duration) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SourceError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))
}

/// GET a URL and return the body, mapping transport and status failures
pub(crate) async fn get_body(http: &Client, url: &str) -> Result<String, SourceError> {
    let response = http.get(url).send().await?;

    if !response.status().is_success() {
        return Err(SourceError::Http(response.status().as_u16()));
    }

    Ok(response.text().await?)
}

/// Host part of a base URL, for pacing
pub(crate) fn host_of(base_url: &str) -> String {
    reqwest::Url::parse(base_url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|h| match u.port() {
                Some(port) => format!("{}:{}", h, port),
                None => h.to_string(),
            })
        })
        .unwrap_or_else(|| base_url.to_string())
}

/// Deserialize a number that may arrive as a JSON number or a numeric string.
///
/// Anything else (null, objects, garbage strings) becomes `None`.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
        Other(serde_json::Value),
    }

    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Number(n)) if n.is_finite() => Some(n),
        Some(NumberOrString::String(s)) => parse_number(&s),
        _ => None,
    })
}
