//! Monitor configuration
//!
//! Everything comes from environment variables with defaults matching the
//! BTC/BCH/XEC deployment. Malformed values fail at startup.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use mining_core::{CoinSpec, MonitorError, MonitorResult, DEFAULT_TRACKED};
use mining_sources::{SourceKind, StaticSource};

use crate::rate_limiter::DEFAULT_PACING_INTERVAL_MS;

/// Bounds for the per-request timeout
const MIN_REQUEST_TIMEOUT_SECS: u64 = 10;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// HTTP listening port
    pub port: u16,
    /// Coins to resolve each cycle, in output order
    pub tracked: Vec<&'static CoinSpec>,
    /// Minimum resolved coins for a cycle to publish
    pub min_accepted_coins: usize,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    /// Minimum spacing between calls to the same host
    pub pacing_interval: Duration,
    pub price_pre_call_delay: Duration,
    /// An alert is raised when the rounded change is below this
    pub alert_drop_threshold: Decimal,
    /// Per-coin fallback chains, keyed by coin id
    pub chains: HashMap<String, Vec<SourceKind>>,
    /// Placeholder values served by the `static` source
    pub static_source: StaticSource,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let tracked: Vec<&'static CoinSpec> = DEFAULT_TRACKED
            .iter()
            .filter_map(|id| CoinSpec::lookup(id))
            .collect();
        let chains = tracked
            .iter()
            .map(|c| (c.id.to_string(), SourceKind::default_chain(c.id)))
            .collect();

        Self {
            port: 3000,
            tracked,
            min_accepted_coins: 2,
            refresh_interval: Duration::from_secs(600),
            request_timeout: Duration::from_secs(MAX_REQUEST_TIMEOUT_SECS),
            pacing_interval: Duration::from_millis(DEFAULT_PACING_INTERVAL_MS),
            price_pre_call_delay: Duration::from_millis(500),
            alert_drop_threshold: Decimal::new(-5, 1),
            chains,
            static_source: StaticSource::new(),
        }
    }
}

impl MonitorConfig {
    /// Load from the process environment
    pub fn from_env() -> MonitorResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; missing or blank keys use defaults
    pub fn from_lookup<F>(lookup: F) -> MonitorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let tracked = match get("TRACKED_COINS") {
            Some(list) => parse_tracked(&list)?,
            None => defaults.tracked,
        };

        let mut chains = HashMap::new();
        for coin in &tracked {
            let key = format!("SOURCE_CHAIN_{}", coin.id);
            let chain = match get(&key) {
                Some(text) => SourceKind::parse_chain(&text)
                    .map_err(|e| MonitorError::config(format!("{}: {}", key, e)))?,
                None => SourceKind::default_chain(coin.id),
            };
            chains.insert(coin.id.to_string(), chain);
        }

        let static_source = match get("STATIC_PLACEHOLDERS") {
            Some(text) => StaticSource::from_placeholders(&text)
                .map_err(|e| MonitorError::config(format!("STATIC_PLACEHOLDERS: {}", e)))?,
            None => StaticSource::new(),
        };

        let request_timeout_secs = parse_or(&get, "REQUEST_TIMEOUT_SECS", MAX_REQUEST_TIMEOUT_SECS)?
            .clamp(MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS);

        let config = Self {
            port: parse_or(&get, "PORT", defaults.port)?,
            min_accepted_coins: parse_or(&get, "MIN_ACCEPTED_COINS", defaults.min_accepted_coins)?,
            refresh_interval: Duration::from_secs(parse_or(&get, "REFRESH_INTERVAL_SECS", 600u64)?),
            request_timeout: Duration::from_secs(request_timeout_secs),
            pacing_interval: Duration::from_millis(parse_or(
                &get,
                "PACING_INTERVAL_MS",
                DEFAULT_PACING_INTERVAL_MS,
            )?),
            price_pre_call_delay: Duration::from_millis(parse_or(&get, "PRICE_PRE_CALL_DELAY_MS", 500u64)?),
            alert_drop_threshold: parse_or(&get, "ALERT_DROP_THRESHOLD_PCT", defaults.alert_drop_threshold)?,
            tracked,
            chains,
            static_source,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings under which no cycle could ever publish
    pub fn validate(&self) -> MonitorResult<()> {
        if self.tracked.is_empty() {
            return Err(MonitorError::config("TRACKED_COINS must name at least one coin"));
        }
        if self.min_accepted_coins == 0 {
            return Err(MonitorError::config("MIN_ACCEPTED_COINS must be at least 1"));
        }
        if self.min_accepted_coins > self.tracked.len() {
            return Err(MonitorError::config(format!(
                "MIN_ACCEPTED_COINS ({}) exceeds the number of tracked coins ({})",
                self.min_accepted_coins,
                self.tracked.len()
            )));
        }
        if self.refresh_interval.is_zero() {
            return Err(MonitorError::config("REFRESH_INTERVAL_SECS must be positive"));
        }
        Ok(())
    }

    /// Fallback chain for a coin
    pub fn chain_for(&self, coin_id: &str) -> Vec<SourceKind> {
        self.chains
            .get(coin_id)
            .cloned()
            .unwrap_or_else(|| SourceKind::default_chain(coin_id))
    }

    pub fn tracked_ids(&self) -> Vec<&'static str> {
        self.tracked.iter().map(|c| c.id).collect()
    }
}

fn parse_tracked(list: &str) -> MonitorResult<Vec<&'static CoinSpec>> {
    let mut tracked: Vec<&'static CoinSpec> = Vec::new();
    for id in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let coin = CoinSpec::parse(id)?;
        if tracked.iter().any(|c| c.id == coin.id) {
            return Err(MonitorError::config(format!("Coin listed twice in TRACKED_COINS: {}", coin.id)));
        }
        tracked.push(coin);
    }
    Ok(tracked)
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> MonitorResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| MonitorError::config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
