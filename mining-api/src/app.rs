//! Shared state and router assembly

use axum::{
    http::{header, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mining_services::{MonitorConfig, Scheduler, SnapshotStore};

use crate::routes;

/// Static facts about this deployment, served by `/`
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub cryptos: Vec<&'static str>,
    /// "BTC: Blockchain.info API > mempool.space API" style lines
    pub sources: Vec<String>,
    pub refresh_interval_secs: u64,
    pub min_accepted_coins: usize,
}

impl ServiceInfo {
    pub fn new(config: &MonitorConfig, scheduler: &Scheduler, price_label: &str) -> Self {
        let resolver = scheduler.cycle().resolver();
        let chain_text = |coin_id: &str| -> String {
            let labels = resolver.chain_labels(coin_id);
            if labels.is_empty() {
                "none".to_string()
            } else {
                labels.join(" > ")
            }
        };

        let mut sources: Vec<String> = config
            .tracked
            .iter()
            .map(|coin| format!("{}: {}", coin.id, chain_text(coin.id)))
            .collect();
        sources.push(format!("Prices: {}", price_label));

        Self {
            cryptos: config.tracked_ids(),
            sources,
            refresh_interval_secs: config.refresh_interval.as_secs(),
            min_accepted_coins: config.min_accepted_coins,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub scheduler: Arc<Scheduler>,
    pub info: Arc<ServiceInfo>,
}

impl AppState {
    pub fn new(scheduler: Arc<Scheduler>, info: ServiceInfo) -> Self {
        Self {
            store: scheduler.cycle().store().clone(),
            scheduler,
            info: Arc::new(info),
        }
    }
}

/// Build the full router with CORS for browser dashboards
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", routes::api_routes())
        .merge(routes::service_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    use mining_core::{CoinRecord, CoinSpec};
    use mining_services::{AggregationCycle, FallbackResolver, PacedSource};
    use mining_sources::{fallback_prices, PriceSource, PriceTable, SourceAdapter, SourceError};

    use super::*;

    /// Serves a fixed difficulty per coin, one entry consumed per call
    pub(crate) struct SequenceSource {
        difficulties: Vec<(&'static str, Vec<f64>)>,
        calls: AtomicUsize,
    }

    impl SequenceSource {
        pub(crate) fn new(difficulties: Vec<(&'static str, Vec<f64>)>) -> Self {
            Self {
                difficulties,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for SequenceSource {
        fn name(&self) -> &str {
            "sequence"
        }

        fn label(&self) -> &str {
            "Sequence API"
        }

        fn host(&self) -> &str {
            "sequence"
        }

        fn supports(&self, coin: &CoinSpec) -> bool {
            self.difficulties.iter().any(|(id, _)| *id == coin.id)
        }

        async fn fetch(&self, coin: &CoinSpec) -> Result<CoinRecord, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let series = self
                .difficulties
                .iter()
                .find(|(id, _)| *id == coin.id)
                .map(|(_, series)| series)
                .ok_or_else(|| SourceError::Unsupported(coin.id.to_string()))?;
            // Each cycle fetches every coin once
            let round = call / self.difficulties.len();
            match series.get(round.min(series.len() - 1)) {
                Some(d) if *d > 0.0 => Ok(CoinRecord::fetched(coin, *d, 1.0, "Sequence API")),
                _ => Err(SourceError::Http(503)),
            }
        }
    }

    pub(crate) struct OfflinePrices;

    #[async_trait]
    impl PriceSource for OfflinePrices {
        fn label(&self) -> &str {
            "Offline prices"
        }

        async fn fetch_prices(&self, coins: &[&'static CoinSpec]) -> PriceTable {
            fallback_prices(coins)
        }
    }

    /// State over BTC/BCH/XEC served by `source`, minimum 2 coins
    pub(crate) fn state_with(source: SequenceSource) -> AppState {
        let config = MonitorConfig::default();
        let source: Arc<dyn SourceAdapter> = Arc::new(source);
        let resolver = config.tracked.iter().fold(FallbackResolver::new(), |r, coin| {
            r.with_chain(coin.id, vec![PacedSource::unpaced(source.clone())])
        });
        let store = Arc::new(SnapshotStore::new());
        let cycle = AggregationCycle::new(&config, resolver, Arc::new(OfflinePrices), store);
        let scheduler = Arc::new(Scheduler::new(Arc::new(cycle), Duration::from_secs(600)));
        let info = ServiceInfo::new(&config, &scheduler, "Offline prices");
        AppState::new(scheduler, info)
    }

    pub(crate) async fn call(state: &AppState, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = build_router(state.clone())
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}
