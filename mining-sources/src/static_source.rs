//! Fixed placeholder values
//!
//! Some deployments list coins no live provider covers. This adapter
//! serves configured placeholder numbers for them so they still appear in
//! the snapshot, clearly labelled as static.

use async_trait::async_trait;
use std::collections::HashMap;

use mining_core::{parse_number, CoinRecord, CoinSpec};

use crate::adapter::SourceAdapter;
use crate::error::SourceError;

pub const STATIC_LABEL: &str = "Static placeholder";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Placeholder {
    difficulty: f64,
    hashrate_eh: f64,
}

/// Adapter returning configured placeholder metrics
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    placeholders: HashMap<String, Placeholder>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the placeholder for a coin
    pub fn with_placeholder(mut self, coin_id: &str, difficulty: f64, hashrate_eh: f64) -> Self {
        self.placeholders.insert(
            coin_id.trim().to_ascii_uppercase(),
            Placeholder {
                difficulty,
                hashrate_eh,
            },
        );
        self
    }

    /// Parse `"XEC=1.2e11/0.003;BSV=5e10/0.4"` (difficulty/hashrate in EH/s)
    pub fn from_placeholders(text: &str) -> Result<Self, SourceError> {
        let mut source = Self::new();

        for entry in text.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (coin_id, values) = entry
                .split_once('=')
                .ok_or_else(|| SourceError::InvalidConfig(format!("Expected COIN=difficulty/hashrate, got '{}'", entry)))?;
            let (difficulty, hashrate) = values.split_once('/').unwrap_or((values, "0"));

            let difficulty = parse_number(difficulty)
                .ok_or_else(|| SourceError::InvalidConfig(format!("Bad difficulty in '{}'", entry)))?;
            let hashrate = parse_number(hashrate)
                .ok_or_else(|| SourceError::InvalidConfig(format!("Bad hashrate in '{}'", entry)))?;

            source = source.with_placeholder(coin_id, difficulty, hashrate);
        }

        Ok(source)
    }

    pub fn is_empty(&self) -> bool {
        self.placeholders.is_empty()
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn label(&self) -> &str {
        STATIC_LABEL
    }

    fn host(&self) -> &str {
        "static"
    }

    fn paced(&self) -> bool {
        false
    }

    fn supports(&self, coin: &CoinSpec) -> bool {
        self.placeholders.contains_key(coin.id)
    }

    async fn fetch(&self, coin: &CoinSpec) -> Result<CoinRecord, SourceError> {
        let placeholder = self
            .placeholders
            .get(coin.id)
            .ok_or_else(|| SourceError::Unsupported(coin.id.to_string()))?;

        Ok(CoinRecord::fetched(
            coin,
            placeholder.difficulty,
            placeholder.hashrate_eh,
            STATIC_LABEL,
        ))
    }
}
