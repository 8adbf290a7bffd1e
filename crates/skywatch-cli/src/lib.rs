//! Skywatch CLI - command line tools for the alert dashboard.
//!
//! Binaries:
//! - skywatch-monitor: headless dashboard printing the live view
//! - skywatch-mode: switch or disable the drone's processing mode
//! - send_alert: inject an alert into the mock backend

pub mod args;
pub mod render;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the fmt subscriber (on stderr, so stdout stays for output) with
/// `default_directive` unless `RUST_LOG` says otherwise.
pub fn init_tracing(default_directive: &str, json: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(default_directive.parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}
