//! Skywatch mock backend - serves alert history, mode commands and the push
//! channel from memory.

pub mod api;
pub mod config;
pub mod loops;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::MockConfig;
pub use loops::simulate_loop::random_alert;
pub use state::{DroneModes, MockState, ProcessRecord};

/// The full application with state injected.
pub fn app(state: Arc<MockState>) -> Router {
    api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(listener: TcpListener, state: Arc<MockState>) -> anyhow::Result<()> {
    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// Bind `addr` and serve in the background. Port 0 picks a free port; the
/// bound address is returned.
pub async fn spawn(
    addr: SocketAddr,
    state: Arc<MockState>,
) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(err) = serve(listener, state).await {
            tracing::error!("Mock backend stopped: {}", err);
        }
    });
    Ok((local, handle))
}
