//! Health and service description endpoints

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use mining_services::SchedulerStats;

use crate::app::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    last_update: Option<DateTime<Utc>>,
    coins_count: usize,
    /// "BTC (Blockchain.info API)" per published coin
    coins: Vec<String>,
    scheduler: SchedulerStats,
}

/// Always 200 while the process is up; staleness shows in `lastUpdate`
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot();

    Json(HealthResponse {
        status: "ok",
        last_update: snapshot.last_update,
        coins_count: snapshot.len(),
        coins: snapshot.coins.iter().map(|c| c.source_label()).collect(),
        scheduler: state.scheduler.stats(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceDescription {
    name: &'static str,
    version: &'static str,
    status: &'static str,
    cryptos: Vec<&'static str>,
    sources: Vec<String>,
    refresh_interval_secs: u64,
    min_accepted_coins: usize,
}

async fn describe(State(state): State<AppState>) -> Json<ServiceDescription> {
    Json(ServiceDescription {
        name: "Mining Monitor",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        cryptos: state.info.cryptos.clone(),
        sources: state.info.sources.clone(),
        refresh_interval_secs: state.info.refresh_interval_secs,
        min_accepted_coins: state.info.min_accepted_coins,
    })
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(describe))
}

#[cfg(test)]
mod tests {
    use crate::app::testing::{call, state_with, SequenceSource};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_before_first_cycle() {
        let state = state_with(SequenceSource::new(vec![("BTC", vec![1.0])]));
        let (status, body) = call(&state, "GET", "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["lastUpdate"].is_null());
        assert_eq!(body["coinsCount"], 0);
        assert_eq!(body["scheduler"]["state"], "idle");
        assert_eq!(body["scheduler"]["cyclesRun"], 0);
    }

    #[tokio::test]
    async fn test_health_lists_sources() {
        let state = state_with(SequenceSource::new(vec![
            ("BTC", vec![100.0]),
            ("BCH", vec![50.0]),
            ("XEC", vec![10.0]),
        ]));
        state.scheduler.refresh().await;

        let (_, body) = call(&state, "GET", "/health").await;
        assert_eq!(body["coinsCount"], 3);
        assert_eq!(body["coins"][0], "BTC (Sequence API)");
        assert_eq!(body["scheduler"]["cyclesRun"], 1);
        assert_eq!(body["scheduler"]["cyclesAccepted"], 1);
        assert!(body["scheduler"]["lastCycleAt"].is_string());
    }

    #[tokio::test]
    async fn test_describe() {
        let state = state_with(SequenceSource::new(vec![("BTC", vec![1.0])]));
        let (_, body) = call(&state, "GET", "/").await;

        assert_eq!(body["status"], "running");
        assert_eq!(body["cryptos"], serde_json::json!(["BTC", "BCH", "XEC"]));
        assert_eq!(body["sources"][0], "BTC: Sequence API");
        assert_eq!(body["sources"][3], "Prices: Offline prices");
        assert_eq!(body["refreshIntervalSecs"], 600);
        assert_eq!(body["minAcceptedCoins"], 2);
    }
}
