//! HTTP and WebSocket routes of the mock backend.

pub mod alerts;
pub mod process;
pub mod ws;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::MockState;

pub fn routes() -> Router<Arc<MockState>> {
    Router::new()
        .route("/api/alert", get(alerts::list_alerts))
        .route("/api/process/:mode", post(process::process_command))
        .route("/api/simulate", post(alerts::simulate_alert))
        .route("/", get(ws::ws_handler))
        .route("/ws", get(ws::ws_handler))
}

#[cfg(test)]
mod tests;
