//! Blockchair stats client
//!
//! Covers every coin in the table through one endpoint shape. `hashrate_24h`
//! is H/s and often arrives as a numeric string.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use mining_core::{hashes_to_exahash, CoinRecord, CoinSpec};

use crate::adapter::{get_body, host_of, lenient_f64, SourceAdapter};
use crate::error::SourceError;

const BLOCKCHAIR_API_BASE: &str = "https://api.blockchair.com";

pub const BLOCKCHAIR_LABEL: &str = "Blockchair API";

/// Blockchair API client
#[derive(Clone)]
pub struct BlockchairClient {
    http: Client,
    base_url: String,
    host: String,
}

#[derive(Debug, Deserialize)]
struct StatsEnvelope {
    data: Option<ChainStats>,
}

#[derive(Debug, Deserialize)]
struct ChainStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    difficulty: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    hashrate_24h: Option<f64>,
}

/// Blockchair's chain slug for a ticker
fn chain_slug(coin_id: &str) -> Option<&'static str> {
    match coin_id {
        "BTC" => Some("bitcoin"),
        "BCH" => Some("bitcoin-cash"),
        "XEC" => Some("ecash"),
        "LTC" => Some("litecoin"),
        "DOGE" => Some("dogecoin"),
        "BSV" => Some("bitcoin-sv"),
        _ => None,
    }
}

impl BlockchairClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, BLOCKCHAIR_API_BASE)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            host: host_of(&base_url),
            http,
            base_url,
        }
    }

    /// Parse a `/{chain}/stats` payload
    pub fn parse_stats(coin: &CoinSpec, body: &str) -> Result<CoinRecord, SourceError> {
        let envelope: StatsEnvelope = serde_json::from_str(body)?;
        let stats = envelope.data.ok_or(SourceError::MissingField("data"))?;
        let difficulty = stats.difficulty.ok_or(SourceError::MissingField("difficulty"))?;
        let hashrate = stats.hashrate_24h.map(hashes_to_exahash).unwrap_or(0.0);

        Ok(CoinRecord::fetched(coin, difficulty, hashrate, BLOCKCHAIR_LABEL))
    }
}

#[async_trait]
impl SourceAdapter for BlockchairClient {
    fn name(&self) -> &str {
        "blockchair"
    }

    fn label(&self) -> &str {
        BLOCKCHAIR_LABEL
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn supports(&self, coin: &CoinSpec) -> bool {
        chain_slug(coin.id).is_some()
    }

    #[instrument(skip(self, coin), fields(coin = coin.id))]
    async fn fetch(&self, coin: &CoinSpec) -> Result<CoinRecord, SourceError> {
        let slug = chain_slug(coin.id).ok_or_else(|| SourceError::Unsupported(coin.id.to_string()))?;

        let url = format!("{}/{}/stats", self.base_url, slug);
        debug!("[Blockchair] Fetching {} stats from: {}", coin.id, url);

        let body = get_body(&self.http, &url).await?;
        let record = Self::parse_stats(coin, &body)?;

        info!(
            "[Blockchair] {}: difficulty={:.2e}, hashrate={:.4} EH/s",
            coin.id, record.difficulty, record.network_hashrate
        );
        Ok(record)
    }
}
