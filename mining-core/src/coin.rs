//! Static per-coin configuration

use serde::Serialize;
use std::fmt;

use crate::error::{MonitorError, MonitorResult};

/// Static description of a tracked coin
///
/// Block reward and block time are not fetched from providers; they come
/// from this table and are copied into every record for the coin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinSpec {
    /// Uppercase ticker, also used as the record id
    pub id: &'static str,
    /// Display name (e.g., "Bitcoin")
    pub name: &'static str,
    /// Mining algorithm label
    pub algorithm: &'static str,
    /// Block subsidy in the coin's own unit
    pub block_reward: f64,
    /// Target block interval in seconds
    pub block_time_secs: u32,
}

/// Every coin the monitor knows how to describe
pub const COIN_TABLE: &[CoinSpec] = &[
    CoinSpec {
        id: "BTC",
        name: "Bitcoin",
        algorithm: "SHA-256",
        block_reward: 3.125,
        block_time_secs: 600,
    },
    CoinSpec {
        id: "BCH",
        name: "Bitcoin Cash",
        algorithm: "SHA-256",
        block_reward: 3.125,
        block_time_secs: 600,
    },
    CoinSpec {
        id: "XEC",
        name: "eCash",
        algorithm: "SHA-256",
        block_reward: 1_812_500.0,
        block_time_secs: 537,
    },
    CoinSpec {
        id: "LTC",
        name: "Litecoin",
        algorithm: "Scrypt",
        block_reward: 6.25,
        block_time_secs: 150,
    },
    CoinSpec {
        id: "DOGE",
        name: "Dogecoin",
        algorithm: "Scrypt",
        block_reward: 10_000.0,
        block_time_secs: 60,
    },
    CoinSpec {
        id: "BSV",
        name: "Bitcoin SV",
        algorithm: "SHA-256",
        block_reward: 3.125,
        block_time_secs: 600,
    },
];

/// Coins tracked when no explicit list is configured
pub const DEFAULT_TRACKED: &[&str] = &["BTC", "BCH", "XEC"];

impl CoinSpec {
    /// Look up a coin by ticker (case-insensitive)
    pub fn lookup(id: &str) -> Option<&'static CoinSpec> {
        COIN_TABLE.iter().find(|c| c.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Look up a coin by ticker, failing with `UnknownCoin`
    pub fn parse(id: &str) -> MonitorResult<&'static CoinSpec> {
        Self::lookup(id).ok_or_else(|| MonitorError::unknown_coin(id.trim()))
    }
}

impl fmt::Display for CoinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(CoinSpec::lookup("btc").map(|c| c.name), Some("Bitcoin"));
        assert_eq!(CoinSpec::lookup(" xec ").map(|c| c.block_time_secs), Some(537));
        assert!(CoinSpec::lookup("ETH").is_none());
    }

    #[test]
    fn test_parse_unknown_coin() {
        let err = CoinSpec::parse("NOPE").unwrap_err();
        assert!(matches!(err, MonitorError::UnknownCoin(ref id) if id == "NOPE"));
    }

    #[test]
    fn test_table_ids_are_unique() {
        for (i, a) in COIN_TABLE.iter().enumerate() {
            for b in &COIN_TABLE[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_default_tracked_are_known() {
        for id in DEFAULT_TRACKED {
            assert!(CoinSpec::lookup(id).is_some(), "{} missing from table", id);
        }
    }
}
