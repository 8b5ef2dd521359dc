//! Blockchain.info stats client
//!
//! Primary BTC source. The stats endpoint reports `hash_rate` in GH/s.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use mining_core::{CoinRecord, CoinSpec, HashrateUnit};

use crate::adapter::{get_body, host_of, lenient_f64, SourceAdapter};
use crate::error::SourceError;

const BLOCKCHAIN_INFO_API_BASE: &str = "https://blockchain.info";

pub const BLOCKCHAIN_INFO_LABEL: &str = "Blockchain.info API";

/// Blockchain.info API client
#[derive(Clone)]
pub struct BlockchainInfoClient {
    http: Client,
    base_url: String,
    host: String,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default, deserialize_with = "lenient_f64")]
    difficulty: Option<f64>,
    /// GH/s
    #[serde(default, deserialize_with = "lenient_f64")]
    hash_rate: Option<f64>,
}

impl BlockchainInfoClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, BLOCKCHAIN_INFO_API_BASE)
    }

    /// Point the client at a different host (mirrors, tests)
    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            host: host_of(&base_url),
            http,
            base_url,
        }
    }

    /// Parse a `/stats` payload into a record
    pub fn parse_stats(coin: &CoinSpec, body: &str) -> Result<CoinRecord, SourceError> {
        let stats: StatsResponse = serde_json::from_str(body)?;
        let difficulty = stats.difficulty.ok_or(SourceError::MissingField("difficulty"))?;
        let hashrate = stats
            .hash_rate
            .map(|gh| HashrateUnit::Giga.to_exahash(gh))
            .unwrap_or(0.0);

        Ok(CoinRecord::fetched(coin, difficulty, hashrate, BLOCKCHAIN_INFO_LABEL))
    }
}

#[async_trait]
impl SourceAdapter for BlockchainInfoClient {
    fn name(&self) -> &str {
        "blockchain_info"
    }

    fn label(&self) -> &str {
        BLOCKCHAIN_INFO_LABEL
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn supports(&self, coin: &CoinSpec) -> bool {
        coin.id == "BTC"
    }

    #[instrument(skip(self, coin), fields(coin = coin.id))]
    async fn fetch(&self, coin: &CoinSpec) -> Result<CoinRecord, SourceError> {
        if !self.supports(coin) {
            return Err(SourceError::Unsupported(coin.id.to_string()));
        }

        let url = format!("{}/stats?format=json", self.base_url);
        debug!("[Blockchain.info] Fetching stats from: {}", url);

        let body = get_body(&self.http, &url).await?;
        let record = Self::parse_stats(coin, &body)?;

        info!(
            "[Blockchain.info] {}: difficulty={:.2e}, hashrate={:.2} EH/s",
            coin.id, record.difficulty, record.network_hashrate
        );
        Ok(record)
    }
}
