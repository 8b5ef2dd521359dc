//! mempool.space mining API client
//!
//! Secondary BTC source. `currentHashrate` is reported in H/s.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use mining_core::{hashes_to_exahash, CoinRecord, CoinSpec};

use crate::adapter::{get_body, host_of, lenient_f64, SourceAdapter};
use crate::error::SourceError;

const MEMPOOL_SPACE_API_BASE: &str = "https://mempool.space";

pub const MEMPOOL_SPACE_LABEL: &str = "mempool.space API";

/// mempool.space API client
#[derive(Clone)]
pub struct MempoolSpaceClient {
    http: Client,
    base_url: String,
    host: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HashrateResponse {
    #[serde(default, deserialize_with = "lenient_f64")]
    current_hashrate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    current_difficulty: Option<f64>,
}

impl MempoolSpaceClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, MEMPOOL_SPACE_API_BASE)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            host: host_of(&base_url),
            http,
            base_url,
        }
    }

    /// Parse a `/api/v1/mining/hashrate/3d` payload
    pub fn parse_hashrate(coin: &CoinSpec, body: &str) -> Result<CoinRecord, SourceError> {
        let response: HashrateResponse = serde_json::from_str(body)?;
        let difficulty = response
            .current_difficulty
            .ok_or(SourceError::MissingField("currentDifficulty"))?;
        let hashrate = response.current_hashrate.map(hashes_to_exahash).unwrap_or(0.0);

        Ok(CoinRecord::fetched(coin, difficulty, hashrate, MEMPOOL_SPACE_LABEL))
    }
}

#[async_trait]
impl SourceAdapter for MempoolSpaceClient {
    fn name(&self) -> &str {
        "mempool_space"
    }

    fn label(&self) -> &str {
        MEMPOOL_SPACE_LABEL
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

        let url = format!("{}/api/v1/mining/hashrate/3d", self.base_url);
        debug!("[mempool.space] Fetching hashrate from: {}", url);

        let body = get_body(&self.http, &url).await?;
        let record = Self::parse_hashrate(coin, &body)?;

        info!(
            "[mempool.space] {}: difficulty={:.2e}, hashrate={:.2} EH/s",
            coin.id, record.difficulty, record.network_hashrate
        );
        Ok(record)
    }
}
