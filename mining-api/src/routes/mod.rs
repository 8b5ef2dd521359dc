//! API route definitions

mod alerts;
mod coins;
mod health;
mod refresh;

use axum::Router;
use crate::app::AppState;

/// Routes under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(coins::routes())
        .merge(alerts::routes())
        .merge(refresh::routes())
}

/// Top-level health and description routes
pub fn service_routes() -> Router<AppState> {
    health::routes()
}
