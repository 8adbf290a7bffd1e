//! Skywatch mock backend - local stand-in for the alert API

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skywatch_mock::loops::simulate_loop::run_simulate_loop;
use skywatch_mock::{MockConfig, MockState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("skywatch_mock=debug".parse()?))
        .init();

    tracing::info!("Starting Skywatch mock backend...");

    let config = MockConfig::from_env();
    let state = Arc::new(MockState::new(&config));
    let (shutdown_tx, _) = broadcast::channel(1);

    if let Some(every) = config.simulate_interval {
        tokio::spawn(run_simulate_loop(state.clone(), every, shutdown_tx.subscribe()));
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, skywatch_mock::app(state))
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
            let _ = shutdown_tx.send(());
        })
        .await?;

    Ok(())
}
