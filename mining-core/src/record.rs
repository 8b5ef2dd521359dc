//! Coin records, alerts and the published snapshot

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coin::CoinSpec;
use crate::units::zero_pct;

/// One coin's metrics as published to readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinRecord {
    /// Uppercase ticker, unique within a snapshot
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub algorithm: String,

    /// Network difficulty at fetch time
    pub difficulty: f64,

    /// Difficulty from the previous accepted snapshot (or `difficulty` when
    /// there was no usable prior value)
    pub previous_difficulty: f64,

    /// Change vs `previous_difficulty` in percent, two decimal places
    pub difficulty_change_pct: Decimal,

    /// Network hashrate in EH/s
    pub network_hashrate: f64,

    /// USD price
    pub price: f64,

    pub block_reward: f64,
    pub block_time_seconds: u32,

    /// Label of the provider that produced this record
    pub data_source: String,
}

impl CoinRecord {
    /// Build a freshly-fetched record for a coin.
    ///
    /// Delta and price fields start at their neutral values; the aggregation
    /// cycle fills them in. Non-finite or negative inputs are clamped to 0.
    pub fn fetched(
        coin: &CoinSpec,
        difficulty: f64,
        network_hashrate: f64,
        data_source: impl Into<String>,
    ) -> Self {
        let difficulty = non_negative(difficulty);
        Self {
            id: coin.id.to_string(),
            symbol: coin.id.to_string(),
            name: coin.name.to_string(),
            algorithm: coin.algorithm.to_string(),
            difficulty,
            previous_difficulty: difficulty,
            difficulty_change_pct: zero_pct(),
            network_hashrate: non_negative(network_hashrate),
            price: 0.0,
            block_reward: coin.block_reward,
            block_time_seconds: coin.block_time_secs,
            data_source: data_source.into(),
        }
    }

    /// "BTC (Blockchain.info API)" style label used by the health endpoint
    pub fn source_label(&self) -> String {
        format!("{} ({})", self.symbol, self.data_source)
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// A detected difficulty drop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Emission time in unix millis followed by the coin id
    pub id: String,
    /// Ticker of the coin
    pub coin_id: String,
    /// Display name of the coin
    pub coin: String,
    /// Negative percentage change, two decimal places
    #[serde(rename = "change")]
    pub change_pct: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(record: &CoinRecord, change_pct: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}{}", timestamp.timestamp_millis(), record.id),
            coin_id: record.id.clone(),
            coin: record.name.clone(),
            change_pct,
            timestamp,
        }
    }
}

/// The published view of all coins from the last accepted cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Records in resolution order
    pub coins: Vec<CoinRecord>,
    /// When the last accepted cycle finished; `None` before the first
    pub last_update: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(coins: Vec<CoinRecord>, last_update: DateTime<Utc>) -> Self {
        Self {
            coins,
            last_update: Some(last_update),
        }
    }

    /// Find a coin's record by id
    pub fn get(&self, id: &str) -> Option<&CoinRecord> {
        self.coins.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn btc() -> &'static CoinSpec {
        CoinSpec::lookup("BTC").unwrap()
    }

    #[test]
    fn test_fetched_record_defaults() {
        let record = CoinRecord::fetched(btc(), 1.2e14, f64::NAN, "Test API");
        assert_eq!(record.id, "BTC");
        assert_eq!(record.symbol, "BTC");
        assert_eq!(record.previous_difficulty, 1.2e14);
        assert_eq!(record.network_hashrate, 0.0);
        assert_eq!(record.price, 0.0);
        assert_eq!(record.block_reward, 3.125);
        assert_eq!(record.block_time_seconds, 600);
        assert_eq!(record.difficulty_change_pct.to_string(), "0.00");
        assert_eq!(record.source_label(), "BTC (Test API)");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = CoinRecord::fetched(btc(), 100.0, 1.0, "Test API");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["difficultyChangePct"], "0.00");
        assert_eq!(json["previousDifficulty"], 100.0);
        assert_eq!(json["networkHashrate"], 1.0);
        assert_eq!(json["blockTimeSeconds"], 600);
        assert_eq!(json["dataSource"], "Test API");
    }

    #[test]
    fn test_alert_id_and_shape() {
        let record = CoinRecord::fetched(btc(), 90.0, 1.0, "Test API");
        let ts = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let alert = Alert::new(&record, Decimal::new(-1000, 2), ts);
        assert_eq!(alert.id, "1700000000123BTC");

        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["coin"], "Bitcoin");
        assert_eq!(json["coinId"], "BTC");
        assert_eq!(json["change"], "-10.00");
    }

    #[test]
    fn test_empty_snapshot_serializes_null_update() {
        let json = serde_json::to_value(Snapshot::default()).unwrap();
        assert!(json["lastUpdate"].is_null());
        assert_eq!(json["coins"].as_array().unwrap().len(), 0);
    }
}
