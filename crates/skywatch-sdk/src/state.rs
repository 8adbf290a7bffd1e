//! Dashboard state: the alert list and everything derived from it.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::time::Instant;

use skywatch_core::{
    filter_alerts, ActiveMode, Alert, AlertBatcher, AlertList, AlertSummary, ConnectionEvent,
    ConnectionStatus, DateFilter, LivePresenter, ModeState, SourceFilter,
};

use crate::config::{Config, HistoryFailurePolicy};

/// Everything the dashboard mutates, owned by one [`crate::Dashboard`].
#[derive(Debug, Clone)]
pub struct DashboardState {
    alerts: AlertList,
    batcher: AlertBatcher,
    presenter: LivePresenter,
    date_filter: DateFilter,
    source_filter: SourceFilter,
    status: ConnectionStatus,
    loading: bool,
    refresh_generation: u64,
    last_error: Option<String>,
}

impl DashboardState {
    /// Empty list, disconnected, default filters.
    pub fn new(config: &Config) -> Self {
        Self {
            alerts: AlertList::with_capacity(config.max_alerts),
            batcher: AlertBatcher::new(config.batch_interval),
            presenter: LivePresenter::new(config.live_alert_ttl),
            date_filter: DateFilter::default(),
            source_filter: SourceFilter::default(),
            status: ConnectionStatus::default(),
            loading: false,
            refresh_generation: 0,
            last_error: None,
        }
    }

    pub fn alerts(&self) -> &AlertList {
        &self.alerts
    }

    pub fn current_alert(&self) -> Option<&Alert> {
        self.presenter.current()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn pending_len(&self) -> usize {
        self.batcher.pending_len()
    }

    pub fn received_count(&self) -> u64 {
        self.batcher.total_flushed()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Route a newly received alert to the batcher and the presenter.
    /// Returns `true` if it became the live alert. Dropped after shutdown.
    pub fn receive(&mut self, alert: Alert, now: Instant, wall_clock: DateTime<Utc>) -> bool {
        if self.status == ConnectionStatus::Shutdown {
            tracing::debug!("Dropping alert {} received after shutdown", alert.id);
            return false;
        }
        let shown = self
            .presenter
            .offer(&alert, self.source_filter, now, wall_clock);
        self.batcher.ingest(alert, now);
        shown
    }

    /// Earliest instant at which a timer needs servicing.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.batcher.deadline(), self.presenter.expires_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Service whichever timers are due. Returns the number of alerts flushed.
    pub fn on_timer(&mut self, now: Instant) -> usize {
        let flushed = self.batcher.flush_if_due(&mut self.alerts, now);
        if flushed > 0 {
            tracing::debug!("Flushed {} alerts ({} listed)", flushed, self.alerts.len());
        }
        if let Some(expired) = self.presenter.expire(now) {
            tracing::debug!("Live alert {} expired", expired.id);
        }
        flushed
    }

    pub fn apply_connection_event(&mut self, event: ConnectionEvent) -> ConnectionStatus {
        let next = self.status.apply(event);
        if next != self.status {
            tracing::info!("Alert stream {} -> {}", self.status, next);
        }
        self.status = next;
        next
    }

    pub fn date_filter(&self) -> DateFilter {
        self.date_filter
    }

    pub fn set_date_filter(&mut self, filter: DateFilter) {
        self.date_filter = filter;
    }

    pub fn source_filter(&self) -> SourceFilter {
        self.source_filter
    }

    /// Change the source filter, dropping a live alert it no longer admits.
    pub fn set_source_filter(&mut self, filter: SourceFilter) {
        self.source_filter = filter;
        if let Some(cleared) = self.presenter.on_source_filter_changed(filter) {
            tracing::debug!("Cleared live alert {} after source filter change", cleared.id);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.presenter.is_paused()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.presenter.set_paused(paused);
    }

    pub fn dismiss_current(&mut self) -> Option<Alert> {
        self.presenter.dismiss()
    }

    /// Mark a history fetch as started and return its generation. Only the
    /// newest generation may apply its result.
    pub fn begin_refresh(&mut self) -> u64 {
        self.refresh_generation += 1;
        self.loading = true;
        self.refresh_generation
    }

    /// Apply a successful fetch. Returns `false`, leaving everything as is,
    /// when a newer fetch has started since.
    pub fn complete_refresh(&mut self, generation: u64, alerts: Vec<Alert>) -> bool {
        if generation != self.refresh_generation {
            return false;
        }
        self.replace_history(alerts);
        true
    }

    /// Apply a failed fetch; stale generations are ignored as above.
    pub fn fail_refresh(
        &mut self,
        generation: u64,
        policy: HistoryFailurePolicy,
        message: String,
    ) -> bool {
        if generation != self.refresh_generation {
            return false;
        }
        self.history_failed(policy, message);
        true
    }

    pub fn replace_history(&mut self, alerts: Vec<Alert>) {
        self.alerts.replace(alerts);
        self.loading = false;
        self.last_error = None;
    }

    pub fn history_failed(&mut self, policy: HistoryFailurePolicy, message: String) {
        if policy == HistoryFailurePolicy::Clear {
            self.alerts.clear();
        }
        self.loading = false;
        self.last_error = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Teardown: merge whatever is pending, then drop all timers.
    pub fn shut_down(&mut self) {
        self.batcher.flush(&mut self.alerts);
        self.presenter.clear();
        self.status = self.status.apply(ConnectionEvent::Shutdown);
    }

    /// Derived view relative to `reference_now`.
    pub fn snapshot<Tz: TimeZone>(
        &self,
        mode: ModeState,
        mode_switching: bool,
        reference_now: &DateTime<Tz>,
    ) -> DashboardSnapshot {
        let alerts = filter_alerts(
            self.alerts.as_slice(),
            self.date_filter,
            self.source_filter,
            reference_now,
        );
        let summary = AlertSummary::from_alerts(&alerts);
        DashboardSnapshot {
            alerts,
            summary,
            total_alerts: self.alerts.len(),
            current_alert: self.presenter.current().cloned(),
            status: self.status,
            date_filter: self.date_filter,
            source_filter: self.source_filter,
            paused: self.presenter.is_paused(),
            mode,
            active_mode: mode.active(),
            mode_switching,
            loading: self.loading,
            received_count: self.batcher.total_flushed(),
            pending_count: self.batcher.pending_len(),
            last_alert_at: self.presenter.last_alert_at(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Read-only view handed to front ends.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// Alerts passing both filters, newest first
    pub alerts: Vec<Alert>,
    pub summary: AlertSummary,
    /// Size of the unfiltered list
    pub total_alerts: usize,
    pub current_alert: Option<Alert>,
    pub status: ConnectionStatus,
    pub date_filter: DateFilter,
    pub source_filter: SourceFilter,
    pub paused: bool,
    pub mode: ModeState,
    pub active_mode: ActiveMode,
    pub mode_switching: bool,
    pub loading: bool,
    /// Alerts merged from the live stream so far
    pub received_count: u64,
    pub pending_count: usize,
    pub last_alert_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use skywatch_core::{AlertKind, AlertSource};
    use std::time::Duration;

    fn state() -> DashboardState {
        DashboardState::new(&Config::default())
    }

    fn alert(id: &str, source: AlertSource) -> Alert {
        Alert::new(AlertKind::Animal, "m", Utc::now())
            .with_id(id)
            .with_source(source)
    }

    #[test]
    fn initial_state() {
        let state = state();
        assert!(state.alerts().is_empty());
        assert_eq!(state.status(), ConnectionStatus::Disconnected);
        assert!(state.current_alert().is_none());
        assert!(state.next_deadline().is_none());
        let snapshot = state.snapshot(ModeState::default(), false, &Utc::now());
        assert_eq!(snapshot.active_mode, ActiveMode::Detection);
        assert_eq!(snapshot.date_filter, DateFilter::Today);
        assert_eq!(snapshot.source_filter, SourceFilter::All);
    }

    #[test]
    fn offboard_alert_is_listed_but_not_live_under_onboard_filter() {
        let start = Instant::now();
        let mut state = state();
        state.set_source_filter(SourceFilter::Onboard);

        assert!(!state.receive(alert("off", AlertSource::Offboard), start, Utc::now()));
        assert!(state.current_alert().is_none());

        state.on_timer(start + Duration::from_secs(2));
        assert!(state.alerts().get("off").is_some());
        assert!(state.current_alert().is_none());
        assert_eq!(state.received_count(), 1);
    }

    #[test]
    fn next_deadline_is_the_earliest_timer() {
        let start = Instant::now();
        let mut state = state();
        state.receive(alert("a", AlertSource::Onboard), start, Utc::now());
        assert_eq!(state.next_deadline(), Some(start + Duration::from_secs(2)));

        state.on_timer(start + Duration::from_secs(2));
        assert_eq!(state.next_deadline(), Some(start + Duration::from_secs(10)));

        state.on_timer(start + Duration::from_secs(10));
        assert!(state.next_deadline().is_none());
        assert!(state.current_alert().is_none());
    }

    #[test]
    fn history_failure_policies() {
        let mut cleared = state();
        cleared.replace_history(vec![alert("h", AlertSource::Onboard)]);
        cleared.begin_refresh();
        cleared.history_failed(HistoryFailurePolicy::Clear, "boom".into());
        assert!(cleared.alerts().is_empty());
        assert!(!cleared.is_loading());
        assert_eq!(cleared.last_error(), Some("boom"));

        let mut kept = state();
        kept.replace_history(vec![alert("h", AlertSource::Onboard)]);
        kept.history_failed(HistoryFailurePolicy::KeepLastKnown, "boom".into());
        assert_eq!(kept.alerts().len(), 1);

        kept.replace_history(Vec::new());
        assert!(kept.last_error().is_none());
    }

    #[test]
    fn only_the_newest_refresh_applies() {
        let mut state = state();
        let older = state.begin_refresh();
        let newer = state.begin_refresh();

        assert!(!state.complete_refresh(older, vec![alert("stale", AlertSource::Onboard)]));
        assert!(state.alerts().is_empty());
        assert!(state.is_loading());

        assert!(state.complete_refresh(newer, vec![alert("fresh", AlertSource::Onboard)]));
        assert!(state.alerts().get("fresh").is_some());
        assert!(!state.is_loading());

        let failed = state.begin_refresh();
        let winner = state.begin_refresh();
        assert!(!state.fail_refresh(failed, HistoryFailurePolicy::Clear, "late".into()));
        assert_eq!(state.alerts().len(), 1);
        assert!(state.last_error().is_none());
        assert!(state.is_loading());

        assert!(state.complete_refresh(winner, Vec::new()));
        assert!(!state.is_loading());
    }

    #[test]
    fn shut_down_merges_pending_and_is_terminal() {
        let start = Instant::now();
        let mut state = state();
        state.apply_connection_event(ConnectionEvent::Dial);
        state.receive(alert("p", AlertSource::Onboard), start, Utc::now());

        state.shut_down();
        assert_eq!(state.alerts().len(), 1);
        assert_eq!(state.pending_len(), 0);
        assert!(state.next_deadline().is_none());
        assert_eq!(state.status(), ConnectionStatus::Shutdown);
        assert_eq!(
            state.apply_connection_event(ConnectionEvent::Dial),
            ConnectionStatus::Shutdown
        );

        assert!(!state.receive(alert("late", AlertSource::Onboard), start, Utc::now()));
        assert_eq!(state.pending_len(), 0);
    }

    #[test]
    fn snapshot_filters_and_summarizes() {
        let start = Instant::now();
        let mut state = state();
        state.replace_history(vec![
            alert("on", AlertSource::Onboard),
            alert("off", AlertSource::Offboard),
        ]);
        state.receive(alert("pending", AlertSource::Onboard), start, Utc::now());
        state.set_source_filter(SourceFilter::Offboard);

        let snapshot = state.snapshot(ModeState::default(), true, &Utc::now());
        assert_eq!(snapshot.alerts.len(), 1);
        assert_eq!(snapshot.alerts[0].id, "off");
        assert_eq!(snapshot.summary.offboard, 1);
        assert_eq!(snapshot.total_alerts, 2);
        assert_eq!(snapshot.pending_count, 1);
        assert!(snapshot.current_alert.is_none());
        assert!(snapshot.mode_switching);
    }
}
