//! Processing-mode commands.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use skywatch_core::{ModeAction, ProcessingMode};

use crate::state::MockState;

/// Body of `POST /api/process/{mode}`. Fields are checked by hand so bad
/// input gets a 400 with a message.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub action: Option<String>,
    pub drone_id: Option<String>,
}

fn bad_request(message: String) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/// `POST /api/process/{detection|facerecognition}`
pub async fn process_command(
    State(state): State<Arc<MockState>>,
    Path(mode): Path<String>,
    Json(request): Json<ProcessRequest>,
) -> impl IntoResponse {
    let Ok(mode) = mode.parse::<ProcessingMode>() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown mode `{}`", mode) })),
        )
            .into_response();
    };

    let action = match request.action.as_deref() {
        Some("on") => ModeAction::On,
        Some("off") => ModeAction::Off,
        Some(other) => return bad_request(format!("unknown action `{}`", other)),
        None => return bad_request("missing action".to_string()),
    };
    let Some(drone_id) = request.drone_id.filter(|id| !id.trim().is_empty()) else {
        return bad_request("missing drone_id".to_string());
    };

    if state.is_mode_failing(mode) {
        tracing::warn!("Rejecting {} {:?} for {} (failure injected)", mode, action, drone_id);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": format!("{} processor unavailable", mode.label()) })),
        )
            .into_response();
    }

    state.record_command(mode, action, &drone_id);
    tracing::info!("{} {:?} for {}", mode.label(), action, drone_id);
    Json(json!({
        "ok": true,
        "mode": mode.endpoint(),
        "action": action,
        "drone_id": drone_id,
    }))
    .into_response()
}
