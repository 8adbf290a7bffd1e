//! Alert history and injection.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use skywatch_core::{HistoryResponse, RawAlert};

use crate::loops::simulate_loop::random_alert;
use crate::state::MockState;

/// `GET /api/alert`
pub async fn list_alerts(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    if state.is_history_failing() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "history unavailable" })),
        )
            .into_response();
    }

    Json(HistoryResponse {
        data: Some(state.history_newest_first()),
    })
    .into_response()
}

/// `POST /api/simulate`
///
/// Stores and pushes the posted alert, or a random one when the body is empty.
pub async fn simulate_alert(State(state): State<Arc<MockState>>, body: Bytes) -> impl IntoResponse {
    let alert = if body.iter().all(u8::is_ascii_whitespace) {
        random_alert()
    } else {
        match serde_json::from_slice::<RawAlert>(&body) {
            Ok(raw) => raw.normalize(Utc::now()),
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("invalid alert: {}", err) })),
                )
                    .into_response();
            }
        }
    };

    let reached = state.publish_alert(alert.clone());
    tracing::info!("Injected {} alert {} ({} clients)", alert.kind, alert.id, reached);
    (
        StatusCode::CREATED,
        Json(json!({ "ok": true, "clients": reached, "alert": alert })),
    )
        .into_response()
}
