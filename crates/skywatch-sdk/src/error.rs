//! SDK error types.

use reqwest::StatusCode;
use skywatch_core::{ModeAction, ProcessingMode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} returned {status}")]
    Status {
        endpoint: String,
        status: StatusCode,
    },
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

#[derive(Debug, Error)]
pub enum ModeError {
    #[error("a mode change is already in flight")]
    Busy,
    #[error("turning {mode} {action:?} failed: {source}")]
    Command {
        mode: ProcessingMode,
        action: ModeAction,
        #[source]
        source: ClientError,
    },
}
