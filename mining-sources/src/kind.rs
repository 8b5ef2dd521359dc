//! Source identifiers used in configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// The data providers a fallback chain can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// blockchain.info stats API (BTC only)
    BlockchainInfo,
    /// mempool.space mining API (BTC only)
    MempoolSpace,
    /// Blockchair stats API (all coins)
    Blockchair,
    /// BitInfoCharts HTML pages (all coins, least reliable)
    BitInfoCharts,
    /// Configured placeholder values
    Static,
}

impl SourceKind {
    /// Configuration key
    pub fn key(&self) -> &'static str {
        match self {
            SourceKind::BlockchainInfo => "blockchain_info",
            SourceKind::MempoolSpace => "mempool_space",
            SourceKind::Blockchair => "blockchair",
            SourceKind::BitInfoCharts => "bitinfocharts",
            SourceKind::Static => "static",
        }
    }

    /// Chain used for a coin when none is configured
    pub fn default_chain(coin_id: &str) -> Vec<SourceKind> {
        match coin_id {
            "BTC" => vec![
                SourceKind::BlockchainInfo,
                SourceKind::MempoolSpace,
                SourceKind::Blockchair,
                SourceKind::BitInfoCharts,
            ],
            _ => vec![SourceKind::Blockchair, SourceKind::BitInfoCharts],
        }
    }

    /// Parse a comma-separated chain such as "blockchair, bitinfocharts"
    pub fn parse_chain(text: &str) -> Result<Vec<SourceKind>, String> {
        let chain = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()?;

        if chain.is_empty() {
            return Err(format!("Empty source chain: '{}'", text));
        }
        Ok(chain)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "blockchain_info" | "blockchain.info" | "blockchain" => Ok(SourceKind::BlockchainInfo),
            "mempool_space" | "mempool.space" | "mempool" => Ok(SourceKind::MempoolSpace),
            "blockchair" => Ok(SourceKind::Blockchair),
            "bitinfocharts" | "scrape" => Ok(SourceKind::BitInfoCharts),
            "static" | "placeholder" => Ok(SourceKind::Static),
            _ => Err(format!("Unknown source: {}", s)),
        }
    }
}
