//! Push channel for live alerts.
//!
//! [`AlertStream`] is a single connection. [`run_alert_stream`] owns the
//! reconnect loop and reports everything it sees to the dashboard engine.

use chrono::Utc;
use futures_util::StreamExt;
use skywatch_core::{decode_push_message, Alert, ConnectionEvent};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::client::build_ws_url;
use crate::error::ClientError;
use crate::reconnect::ReconnectDelay;

/// What the stream task reports to the engine.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Connection(ConnectionEvent),
    Alert(Alert),
}

/// One open push channel connection.
pub struct AlertStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl AlertStream {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let url = build_ws_url(url)?;
        let (socket, _) = connect_async(url.as_str()).await?;
        Ok(Self { socket })
    }

    /// Read the next alert (returns None on close).
    ///
    /// Frames that are not JSON are logged and skipped; valid messages that
    /// carry no alert are skipped quietly.
    pub async fn next_alert(&mut self) -> Result<Option<Alert>, ClientError> {
        while let Some(msg) = self.socket.next().await {
            let text = match msg? {
                Message::Text(text) => text,
                Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(_) => {
                        tracing::warn!("Dropping non UTF-8 binary frame");
                        continue;
                    }
                },
                Message::Close(_) => return Ok(None),
                _ => continue,
            };

            match decode_push_message(&text, Utc::now()) {
                Ok(Some(alert)) => return Ok(Some(alert)),
                Ok(None) => tracing::debug!("Ignoring non-alert message"),
                Err(err) => tracing::warn!("Dropping undecodable push message: {}", err),
            }
        }
        Ok(None)
    }

    pub async fn close(mut self) {
        if let Err(err) = self.socket.close(None).await {
            tracing::debug!("Alert stream close failed: {}", err);
        }
    }
}

/// Keep a push channel open until `shutdown` fires.
///
/// Every dial, open and loss is reported as a [`ConnectionEvent`]. After a
/// loss the task waits the fixed reconnect delay and dials again, with no
/// retry limit. The task also ends when the engine drops its receiver.
pub async fn run_alert_stream(
    url: String,
    mut reconnect: ReconnectDelay,
    events: mpsc::Sender<StreamEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    'reconnect: loop {
        if events
            .send(StreamEvent::Connection(ConnectionEvent::Dial))
            .await
            .is_err()
        {
            break;
        }

        let connected = tokio::select! {
            _ = shutdown.recv() => break 'reconnect,
            result = AlertStream::connect(&url) => result,
        };

        match connected {
            Ok(mut stream) => {
                tracing::info!("Alert stream connected to {}", url);
                reconnect.reset();
                if events
                    .send(StreamEvent::Connection(ConnectionEvent::Opened))
                    .await
                    .is_err()
                {
                    stream.close().await;
                    break;
                }

                loop {
                    tokio::select! {
                        _ = shutdown.recv() => {
                            stream.close().await;
                            break 'reconnect;
                        }
                        next = stream.next_alert() => match next {
                            Ok(Some(alert)) => {
                                tracing::debug!("Alert {} ({}) from {}", alert.id, alert.kind, alert.source);
                                if events.send(StreamEvent::Alert(alert)).await.is_err() {
                                    break 'reconnect;
                                }
                            }
                            Ok(None) => {
                                tracing::info!("Alert stream closed by server");
                                break;
                            }
                            Err(err) => {
                                tracing::warn!("Alert stream error: {}", err);
                                break;
                            }
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!("Alert stream connect to {} failed: {}", url, err);
            }
        }

        if events
            .send(StreamEvent::Connection(ConnectionEvent::Lost))
            .await
            .is_err()
        {
            break;
        }

        let delay = reconnect.fail();
        tracing::info!(
            "Reconnecting alert stream in {:?} (attempt {})",
            delay,
            reconnect.attempts()
        );
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = sleep(delay) => {}
        }
    }

    tracing::info!("Alert stream task shutting down");
}
