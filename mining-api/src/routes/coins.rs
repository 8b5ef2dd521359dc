//! Coin snapshot endpoint

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use mining_core::CoinRecord;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CoinsResponse {
    success: bool,
    last_update: Option<DateTime<Utc>>,
    data: Vec<CoinRecord>,
}

/// GET /api/coins - The last accepted snapshot
async fn get_coins(State(state): State<AppState>) -> Json<CoinsResponse> {
    let snapshot = state.store.snapshot();
    Json(CoinsResponse {
        success: true,
        last_update: snapshot.last_update,
        data: snapshot.coins.clone(),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/coins", get(get_coins))
}
