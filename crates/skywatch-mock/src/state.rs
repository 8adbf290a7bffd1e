//! In-memory backend state shared by the handlers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use dashmap::{DashMap, DashSet};
use serde::Serialize;
use tokio::sync::broadcast;

use chrono::Utc;
use skywatch_core::{Alert, ModeAction, ProcessingMode, RawAlert};

use crate::config::MockConfig;

/// Alerts kept for `GET /api/alert`.
pub const MAX_STORED_ALERTS: usize = 500;

/// Processing flags for one drone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DroneModes {
    pub detection: bool,
    pub face_recognition: bool,
}

impl DroneModes {
    fn apply(&mut self, mode: ProcessingMode, action: ModeAction) {
        let on = action == ModeAction::On;
        match mode {
            ProcessingMode::Detection => self.detection = on,
            ProcessingMode::FaceRecognition => self.face_recognition = on,
        }
    }
}

/// One accepted process command, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessRecord {
    pub mode: ProcessingMode,
    pub action: ModeAction,
    pub drone_id: String,
}

pub struct MockState {
    /// Wire records as `GET /api/alert` serves them, oldest first.
    alerts: Mutex<Vec<RawAlert>>,
    pub tx: broadcast::Sender<Alert>,
    modes: DashMap<String, DroneModes>,
    commands: Mutex<Vec<ProcessRecord>>,
    failing_modes: DashSet<ProcessingMode>,
    fail_history: AtomicBool,
    legacy_envelope: AtomicBool,
    ws_connections: AtomicUsize,
}

impl MockState {
    pub fn new(config: &MockConfig) -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            alerts: Mutex::new(Vec::new()),
            tx,
            modes: DashMap::new(),
            commands: Mutex::new(Vec::new()),
            failing_modes: DashSet::new(),
            fail_history: AtomicBool::new(false),
            legacy_envelope: AtomicBool::new(config.legacy_envelope),
            ws_connections: AtomicUsize::new(0),
        }
    }

    /// Store an alert without pushing it.
    pub fn seed_alert(&self, alert: Alert) {
        self.seed_raw(RawAlert::from_alert(&alert));
    }

    /// Store a record exactly as given; missing fields stay missing on the wire.
    pub fn seed_raw(&self, record: RawAlert) {
        let mut alerts = self.alerts.lock().unwrap_or_else(PoisonError::into_inner);
        alerts.push(record);
        if alerts.len() > MAX_STORED_ALERTS {
            let excess = alerts.len() - MAX_STORED_ALERTS;
            alerts.drain(..excess);
        }
    }

    /// Store an alert and push it to every connected client.
    /// Returns the number of clients it reached.
    pub fn publish_alert(&self, alert: Alert) -> usize {
        self.seed_alert(alert.clone());
        self.tx.send(alert).unwrap_or(0)
    }

    /// Stored records, newest first.
    pub fn history_newest_first(&self) -> Vec<RawAlert> {
        let alerts = self.alerts.lock().unwrap_or_else(PoisonError::into_inner);
        alerts.iter().rev().cloned().collect()
    }

    /// Stored alerts normalized the way a client would see them, newest first.
    pub fn alerts_newest_first(&self) -> Vec<Alert> {
        let received_at = Utc::now();
        self.history_newest_first()
            .into_iter()
            .map(|record| record.normalize(received_at))
            .collect()
    }

    pub fn record_command(&self, mode: ProcessingMode, action: ModeAction, drone_id: &str) {
        self.modes
            .entry(drone_id.to_string())
            .or_default()
            .apply(mode, action);
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ProcessRecord {
                mode,
                action,
                drone_id: drone_id.to_string(),
            });
    }

    pub fn drone_modes(&self, drone_id: &str) -> DroneModes {
        self.modes
            .get(drone_id)
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }

    pub fn commands(&self) -> Vec<ProcessRecord> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make `POST /api/process/{mode}` answer 503.
    pub fn set_mode_failing(&self, mode: ProcessingMode, failing: bool) {
        if failing {
            self.failing_modes.insert(mode);
        } else {
            self.failing_modes.remove(&mode);
        }
    }

    pub fn is_mode_failing(&self, mode: ProcessingMode) -> bool {
        self.failing_modes.contains(&mode)
    }

    /// Make `GET /api/alert` answer 500.
    pub fn set_history_failing(&self, failing: bool) {
        self.fail_history.store(failing, Ordering::Relaxed);
    }

    pub fn is_history_failing(&self) -> bool {
        self.fail_history.load(Ordering::Relaxed)
    }

    pub fn set_legacy_envelope(&self, legacy: bool) {
        self.legacy_envelope.store(legacy, Ordering::Relaxed);
    }

    pub fn legacy_envelope(&self) -> bool {
        self.legacy_envelope.load(Ordering::Relaxed)
    }

    pub(crate) fn client_connected(&self) {
        self.ws_connections.fetch_add(1, Ordering::SeqCst);
    }

    /// Push channel connections accepted so far.
    pub fn ws_connections(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }
}
