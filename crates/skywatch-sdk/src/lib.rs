//! Skywatch SDK - client and dashboard engine for the alert backend
//!
//! Wraps the REST endpoints and the push channel, and drives the pure state
//! machines of `skywatch-core` from one tokio task.
//!
//! ```no_run
//! use skywatch_sdk::{Config, Dashboard};
//!
//! # async fn run() -> Result<(), skywatch_sdk::ClientError> {
//! let dashboard = Dashboard::new(Config::from_env())?;
//! dashboard.start();
//! dashboard.refresh_history().await;
//! println!("{} alerts", dashboard.snapshot().alerts.len());
//! dashboard.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod reconnect;
pub mod state;
pub mod stream;

pub use client::{build_ws_url, SkywatchClient};
pub use config::{Config, HistoryFailurePolicy};
pub use controller::ModeController;
pub use dashboard::{Dashboard, RefreshOutcome};
pub use error::{ClientError, ModeError};
pub use reconnect::ReconnectDelay;
pub use state::{DashboardSnapshot, DashboardState};
pub use stream::{run_alert_stream, AlertStream, StreamEvent};
