//! The aggregation cycle
//!
//! One cycle fetches prices, resolves every tracked coin through its
//! fallback chain, computes difficulty deltas against the published
//! snapshot, and publishes the result only when enough coins resolved.
//! Drop alerts enter the ring as soon as they are detected.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use mining_core::{percent_change, Alert, CoinRecord, CoinSpec, MonitorError, MonitorResult, Snapshot};
use mining_sources::PriceSource;

use crate::config::MonitorConfig;
use crate::resolver::FallbackResolver;
use crate::store::SnapshotStore;

/// Outcome of one cycle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    /// Whether the snapshot was replaced
    pub accepted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `(coin id, source label)` for each resolved coin, in output order
    pub resolved: Vec<(String, String)>,
    /// Coins whose whole chain failed
    pub failed: Vec<String>,
    /// Alerts raised by this cycle
    pub alerts: Vec<Alert>,
    pub price_fallback: bool,
    #[serde(skip)]
    pub duration: Duration,
    /// Internal fault that aborted the cycle
    pub error: Option<String>,
}

impl CycleReport {
    /// Report for a cycle that died before producing results
    pub fn faulted(started_at: DateTime<Utc>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            accepted: false,
            started_at,
            finished_at: Utc::now(),
            resolved: Vec::new(),
            failed: Vec::new(),
            alerts: Vec::new(),
            price_fallback: false,
            duration,
            error: Some(error.into()),
        }
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }
}

/// Compare a fresh record against its predecessor.
///
/// Fills in `previous_difficulty` and `difficulty_change_pct` and returns
/// the rounded change when a usable predecessor existed.
pub fn apply_delta(record: &mut CoinRecord, previous: Option<&CoinRecord>) -> Option<Decimal> {
    let old = previous.map(|p| p.difficulty).filter(|d| *d > 0.0)?;
    let change = percent_change(old, record.difficulty)?;
    record.previous_difficulty = old;
    record.difficulty_change_pct = change;
    Some(change)
}

pub struct AggregationCycle {
    coins: Vec<&'static CoinSpec>,
    resolver: FallbackResolver,
    prices: Arc<dyn PriceSource>,
    store: Arc<SnapshotStore>,
    min_accepted: usize,
    alert_threshold: Decimal,
}

impl AggregationCycle {
    pub fn new(
        config: &MonitorConfig,
        resolver: FallbackResolver,
        prices: Arc<dyn PriceSource>,
        store: Arc<SnapshotStore>,
    ) -> Self {
        Self {
            coins: config.tracked.clone(),
            resolver,
            prices,
            store,
            min_accepted: config.min_accepted_coins,
            alert_threshold: config.alert_drop_threshold,
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn resolver(&self) -> &FallbackResolver {
        &self.resolver
    }

    /// Run one cycle on its own task.
    ///
    /// A returned error or a panic inside the cycle is logged and reported
    /// as a rejected cycle; the store is left untouched in both cases.
    pub async fn run_guarded(self: Arc<Self>) -> CycleReport {
        let started_at = Utc::now();
        let timer = Instant::now();

        let cycle = Arc::clone(&self);
        match tokio::spawn(async move { cycle.run().await }).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                error!("Aggregation cycle failed: {}", e);
                CycleReport::faulted(started_at, timer.elapsed(), e.to_string())
            }
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    "Aggregation cycle panicked".to_string()
                } else {
                    format!("Aggregation cycle aborted: {}", join_error)
                };
                error!("{}", message);
                CycleReport::faulted(started_at, timer.elapsed(), message)
            }
        }
    }

    /// Run one cycle in place
    pub async fn run(&self) -> MonitorResult<CycleReport> {
        let started_at = Utc::now();
        let timer = Instant::now();
        info!("Starting aggregation cycle for {} coins", self.coins.len());

        let prices = self.prices.fetch_prices(&self.coins).await;
        if prices.is_fallback() {
            warn!("{} unavailable, using fallback prices", self.prices.label());
        }

        let outcomes = join_all(self.coins.iter().map(|coin| self.resolver.resolve(coin))).await;

        let previous = self.store.snapshot();
        let mut records = Vec::new();
        let mut resolved = Vec::new();
        let mut failed = Vec::new();
        let mut alerts = Vec::new();
        let mut seen = HashSet::new();
        let now = Utc::now();

        for (coin, outcome) in self.coins.iter().zip(outcomes) {
            let mut record = match outcome {
                Ok(record) => record,
                Err(e) => {
                    warn!("Excluding {} from this cycle: {}", coin.id, e);
                    failed.push(coin.id.to_string());
                    continue;
                }
            };

            if record.id != coin.id {
                error!(
                    "{} returned a record for '{}' while resolving {}, excluding it",
                    record.data_source, record.id, coin.id
                );
                failed.push(coin.id.to_string());
                continue;
            }
            if !seen.insert(record.id.clone()) {
                return Err(MonitorError::internal(format!(
                    "Coin {} resolved twice in one cycle",
                    record.id
                )));
            }

            record.price = prices.price(coin.id);
            if let Some(change) = apply_delta(&mut record, previous.get(coin.id)) {
                if change < self.alert_threshold {
                    warn!("Difficulty drop for {}: {}%", record.name, change);
                    let alert = Alert::new(&record, change, now);
                    self.store.push_alert(alert.clone());
                    alerts.push(alert);
                }
            }

            info!(
                "Resolved {} from {} (difficulty={:.4e}, change={}%)",
                coin.id, record.data_source, record.difficulty, record.difficulty_change_pct
            );
            resolved.push((record.id.clone(), record.data_source.clone()));
            records.push(record);
        }

        let accepted = records.len() >= self.min_accepted;
        if accepted {
            self.store.publish(Snapshot::new(records, now));
            info!(
                "Cycle accepted: {}/{} coins, {} alerts",
                resolved.len(),
                self.coins.len(),
                alerts.len()
            );
        } else {
            error!(
                "Cycle rejected: only {}/{} coins resolved (need {}), keeping previous snapshot",
                resolved.len(),
                self.coins.len(),
                self.min_accepted
            );
        }

        Ok(CycleReport {
            accepted,
            started_at,
            finished_at: Utc::now(),
            resolved,
            failed,
            alerts,
            price_fallback: prices.is_fallback(),
            duration: timer.elapsed(),
            error: None,
        })
    }
}
