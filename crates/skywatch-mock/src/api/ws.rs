//! Push channel: every published alert goes to every connected client.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use tokio::sync::broadcast::error::RecvError;

use skywatch_core::{Alert, PushEnvelope, RawAlert};

use crate::state::MockState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<MockState>>,
) -> axum::response::Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
        .into_response()
}

/// Encode an alert the way the push channel carries it.
pub fn encode_alert(alert: &Alert, legacy: bool) -> serde_json::Result<String> {
    if legacy {
        serde_json::to_string(&RawAlert::from_alert(alert))
    } else {
        serde_json::to_string(&PushEnvelope::alert(alert))
    }
}

async fn handle_socket(mut socket: WebSocket, state: Arc<MockState>) {
    let mut rx = state.tx.subscribe();
    state.client_connected();
    tracing::debug!("Push client connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(alert) => {
                        let text = match encode_alert(&alert, state.legacy_envelope()) {
                            Ok(text) => text,
                            Err(err) => {
                                tracing::warn!("Failed to encode alert {}: {}", alert.id, err);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("Push client lagged, {} alerts dropped", missed);
                        continue;
                    }
                    Err(_) => break,
                }
            }
        }
    }

    tracing::debug!("Push client disconnected");
}
