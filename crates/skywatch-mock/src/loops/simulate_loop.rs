//! Periodic random alerts, for running a dashboard without real drones.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::sync::broadcast;
use tokio::time::interval;

use skywatch_core::{Alert, AlertKind, AlertSource};

use crate::state::MockState;

pub const SIMULATED_DRONE_ID: &str = "drone-1";

/// A person or animal alert from a random source with confidence in
/// `[0.7, 1.0)`.
pub fn random_alert() -> Alert {
    let mut rng = rand::rng();
    let (kind, message) = if rng.random_bool(0.5) {
        (AlertKind::Person, "Person detected in restricted area")
    } else {
        (AlertKind::Animal, "Animal spotted near perimeter")
    };
    let source = if rng.random_bool(0.5) {
        AlertSource::Onboard
    } else {
        AlertSource::Offboard
    };

    Alert::new(kind, message, Utc::now())
        .with_source(source)
        .with_confidence(rng.random_range(0.7..1.0))
        .with_drone(SIMULATED_DRONE_ID)
}

pub async fn run_simulate_loop(
    state: Arc<MockState>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(every);
    // The first tick completes immediately.
    ticker.tick().await;
    tracing::info!("Simulating an alert every {:?}", every);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Simulate loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let alert = random_alert();
                let reached = state.publish_alert(alert.clone());
                tracing::debug!("Simulated {} alert {} ({} clients)", alert.kind, alert.id, reached);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockConfig;

    #[test]
    fn random_alerts_look_like_real_ones() {
        for _ in 0..50 {
            let alert = random_alert();
            assert!(matches!(alert.kind, AlertKind::Person | AlertKind::Animal));
            let confidence = alert.confidence.unwrap();
            assert!((0.7..1.0).contains(&confidence));
            assert_eq!(alert.drone_id.as_deref(), Some(SIMULATED_DRONE_ID));
            assert!(alert.id.starts_with("alert-"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loop_publishes_on_each_tick() {
        let state = Arc::new(MockState::new(&MockConfig::default()));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(run_simulate_loop(
            state.clone(),
            Duration::from_secs(5),
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(state.alerts_newest_first().len(), 2);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
