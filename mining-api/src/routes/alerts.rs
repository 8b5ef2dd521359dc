//! Difficulty drop alerts

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

use mining_core::Alert;
use mining_services::RECENT_ALERTS_LIMIT;

use crate::app::AppState;

#[derive(Debug, Serialize)]
struct AlertsResponse {
    success: bool,
    alerts: Vec<Alert>,
}

/// GET /api/alerts - The most recent alerts, oldest first
async fn get_alerts(State(state): State<AppState>) -> Json<AlertsResponse> {
    Json(AlertsResponse {
        success: true,
        alerts: state.store.recent_alerts(RECENT_ALERTS_LIMIT),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/alerts", get(get_alerts))
}
