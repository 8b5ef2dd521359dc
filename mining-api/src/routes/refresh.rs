//! Manual refresh

use axum::{extract::State, response::Json, routing::post, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    success: bool,
    last_update: Option<DateTime<Utc>>,
    coins_count: usize,
}

/// POST /api/refresh - Run one cycle and report whether it was accepted.
///
/// Waits behind a cycle that is already running rather than joining it.
async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    info!("Manual refresh requested");
    let report = state.scheduler.refresh().await;
    let snapshot = state.store.snapshot();

    Json(RefreshResponse {
        success: report.accepted,
        last_update: snapshot.last_update,
        coins_count: snapshot.len(),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/refresh", post(refresh))
}

#[cfg(test)]
mod tests {
    use crate::app::testing::{call, state_with, SequenceSource};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_accepted_refresh() {
        let state = state_with(SequenceSource::new(vec![
            ("BTC", vec![100.0]),
            ("BCH", vec![50.0]),
            ("XEC", vec![10.0]),
        ]));
        let (status, body) = call(&state, "POST", "/api/refresh").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["coinsCount"], 3);
        assert!(body["lastUpdate"].is_string());
    }

    #[tokio::test]
    async fn test_rejected_refresh_keeps_snapshot() {
        // Second cycle: only BTC resolves, below the minimum of 2
        let state = state_with(SequenceSource::new(vec![
            ("BTC", vec![100.0, 100.0]),
            ("BCH", vec![50.0, 0.0]),
            ("XEC", vec![10.0, 0.0]),
        ]));
        let (_, first) = call(&state, "POST", "/api/refresh").await;
        let (status, second) = call(&state, "POST", "/api/refresh").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["success"], false);
        assert_eq!(second["coinsCount"], 3);
        assert_eq!(second["lastUpdate"], first["lastUpdate"]);
    }

    #[tokio::test]
    async fn test_get_not_allowed() {
        let state = state_with(SequenceSource::new(vec![("BTC", vec![1.0])]));
        let response = crate::app::build_router(state)
            .oneshot(Request::builder().uri("/api/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
