//! The dashboard: alert list, live alert, connection and mode state behind
//! one object.
//!
//! [`Dashboard::start`] spawns two tasks. The stream task keeps the push
//! channel open; the engine task owns every timer (batch flush, live-alert
//! expiry) and applies stream events to the shared [`DashboardState`].
//! Everything else is a plain method call. The state mutex is never held
//! across an await.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, TimeZone, Utc};
use tokio::sync::{broadcast, mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::sleep_until;

use skywatch_core::{
    Alert, ConnectionStatus, DateFilter, ModeState, ProcessingMode, SourceFilter,
};

use crate::client::SkywatchClient;
use crate::config::Config;
use crate::controller::ModeController;
use crate::error::{ClientError, ModeError};
use crate::reconnect::ReconnectDelay;
use crate::state::{DashboardSnapshot, DashboardState};
use crate::stream::{run_alert_stream, StreamEvent};

const EVENT_BUFFER: usize = 256;

/// Result of [`Dashboard::refresh_history`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// History replaced the list; number of alerts kept.
    Loaded(usize),
    /// The fetch failed; the list was handled per the failure policy.
    Failed(String),
    /// A newer refresh started before this one finished; its result was
    /// dropped.
    Superseded,
}

pub struct Dashboard {
    config: Config,
    client: SkywatchClient,
    modes: ModeController,
    state: Arc<Mutex<DashboardState>>,
    wake: Arc<Notify>,
    shutdown: broadcast::Sender<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl Dashboard {
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let client = SkywatchClient::from_config(&config)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: Config, client: SkywatchClient) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            modes: ModeController::new(client.clone(), config.mode_policy),
            state: Arc::new(Mutex::new(DashboardState::new(&config))),
            wake: Arc::new(Notify::new()),
            client,
            config,
            shutdown,
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &SkywatchClient {
        &self.client
    }

    /// Spawn the engine and the push channel. Calling it again is a no-op.
    pub fn start(&self) {
        let Some(events) = self.start_engine() else {
            return;
        };

        let reconnect = ReconnectDelay::fixed(self.config.reconnect_delay);
        let handle = tokio::spawn(run_alert_stream(
            self.config.ws_url.clone(),
            reconnect,
            events,
            self.shutdown.subscribe(),
        ));
        self.tasks_lock().push(handle);
        tracing::info!("Dashboard started (stream {})", self.config.ws_url);
    }

    /// Spawn only the engine. Returns the sender feeding it, or `None` if
    /// already started.
    fn start_engine(&self) -> Option<mpsc::Sender<StreamEvent>> {
        if self.started.swap(true, Ordering::AcqRel) {
            return None;
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let handle = tokio::spawn(run_engine(
            self.state.clone(),
            self.wake.clone(),
            rx,
            self.shutdown.subscribe(),
        ));
        self.tasks_lock().push(handle);
        Some(tx)
    }

    /// Feed an alert as if it arrived on the push channel.
    pub fn ingest(&self, alert: Alert) -> bool {
        let shown = self.lock().receive(alert, now(), Utc::now());
        self.wake.notify_one();
        shown
    }

    /// Replace the list with the backend's history.
    ///
    /// When calls overlap only the most recently started one touches the
    /// list and the loading flag; the others return `Superseded`.
    pub async fn refresh_history(&self) -> RefreshOutcome {
        let generation = self.lock().begin_refresh();

        match self.client.fetch_history().await {
            Ok(alerts) => {
                let mut state = self.lock();
                if !state.complete_refresh(generation, alerts) {
                    tracing::debug!("Discarding history from superseded refresh {}", generation);
                    return RefreshOutcome::Superseded;
                }
                let kept = state.alerts().len();
                tracing::info!("Loaded {} alerts from history", kept);
                RefreshOutcome::Loaded(kept)
            }
            Err(err) => {
                tracing::error!("Error fetching alerts: {}", err);
                let message = err.to_string();
                let applied = self.lock().fail_refresh(
                    generation,
                    self.config.history_failure,
                    message.clone(),
                );
                if applied {
                    RefreshOutcome::Failed(message)
                } else {
                    RefreshOutcome::Superseded
                }
            }
        }
    }

    pub fn set_date_filter(&self, filter: DateFilter) {
        self.lock().set_date_filter(filter);
    }

    pub fn set_source_filter(&self, filter: SourceFilter) {
        self.lock().set_source_filter(filter);
        self.wake.notify_one();
    }

    pub fn set_paused(&self, paused: bool) {
        self.lock().set_paused(paused);
        self.wake.notify_one();
        tracing::info!("Live alerts {}", if paused { "paused" } else { "resumed" });
    }

    /// Flip the pause flag and return the new value.
    pub fn toggle_pause(&self) -> bool {
        let paused = !self.lock().is_paused();
        self.set_paused(paused);
        paused
    }

    pub fn dismiss_current_alert(&self) -> Option<Alert> {
        let dismissed = self.lock().dismiss_current();
        self.wake.notify_one();
        dismissed
    }

    pub fn clear_error(&self) {
        self.lock().clear_error();
    }

    pub fn status(&self) -> ConnectionStatus {
        self.lock().status()
    }

    pub fn current_alert(&self) -> Option<Alert> {
        self.lock().current_alert().cloned()
    }

    /// The whole list, unfiltered, newest first.
    pub fn alerts(&self) -> Vec<Alert> {
        self.lock().alerts().as_slice().to_vec()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot_at(&Local::now())
    }

    /// Snapshot with the time windows anchored at `reference_now`.
    pub fn snapshot_at<Tz: TimeZone>(&self, reference_now: &DateTime<Tz>) -> DashboardSnapshot {
        let mode = self.modes.state();
        let switching = self.modes.is_switching();
        self.lock().snapshot(mode, switching, reference_now)
    }

    pub fn modes(&self) -> &ModeController {
        &self.modes
    }

    pub fn mode_state(&self) -> ModeState {
        self.modes.state()
    }

    pub async fn switch_mode(&self, target: ProcessingMode) -> Result<ModeState, ModeError> {
        self.modes.switch_mode(target).await
    }

    pub async fn turn_off_all_modes(&self) -> Result<ModeState, ModeError> {
        self.modes.turn_off_all_modes().await
    }

    /// Stop the push channel and the engine, merge any pending batch and
    /// drop the live alert. Later alerts are ignored.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(());

        let tasks = std::mem::take(&mut *self.tasks_lock());
        for task in tasks {
            if let Err(err) = task.await {
                tracing::warn!("Dashboard task ended abnormally: {}", err);
            }
        }

        self.lock().shut_down();
        tracing::info!("Dashboard shut down");
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        lock_state(&self.state)
    }

    fn tasks_lock(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}

fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until_deadline(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

fn lock_state(state: &Mutex<DashboardState>) -> MutexGuard<'_, DashboardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_engine(
    state: Arc<Mutex<DashboardState>>,
    wake: Arc<Notify>,
    mut events: mpsc::Receiver<StreamEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let lock = || lock_state(&state);
    let mut events_open = true;

    loop {
        let deadline = lock().next_deadline();

        tokio::select! {
            _ = shutdown.recv() => {
                // Alerts already handed over by the stream task still count.
                let mut drained = 0;
                while let Ok(event) = events.try_recv() {
                    if let StreamEvent::Alert(alert) = event {
                        lock().receive(alert, now(), Utc::now());
                        drained += 1;
                    }
                }
                tracing::info!("Dashboard engine shutting down ({} queued alerts kept)", drained);
                break;
            }
            event = events.recv(), if events_open => match event {
                Some(StreamEvent::Alert(alert)) => {
                    lock().receive(alert, now(), Utc::now());
                }
                Some(StreamEvent::Connection(event)) => {
                    lock().apply_connection_event(event);
                }
                None => events_open = false,
            },
            _ = wake.notified() => {}
            _ = sleep_until_deadline(deadline) => {
                lock().on_timer(now());
            }
        }
    }
}
