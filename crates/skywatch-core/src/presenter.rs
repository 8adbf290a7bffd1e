//! Live alert presentation.
//!
//! At most one alert is "live" at a time. Each live alert carries its own
//! expiry, so the expiry of an alert that has since been replaced or
//! dismissed can never clear whatever is live now.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

use crate::filters::SourceFilter;
use crate::models::Alert;

/// How long an alert stays live unless replaced.
pub const LIVE_ALERT_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct LiveAlert {
    alert: Alert,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct LivePresenter {
    current: Option<LiveAlert>,
    paused: bool,
    ttl: Duration,
    last_alert_at: Option<DateTime<Utc>>,
}

impl Default for LivePresenter {
    fn default() -> Self {
        Self::new(LIVE_ALERT_TTL)
    }
}

impl LivePresenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: None,
            paused: false,
            ttl,
            last_alert_at: None,
        }
    }

    pub fn current(&self) -> Option<&Alert> {
        self.current.as_ref().map(|live| &live.alert)
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.current.as_ref().map(|live| live.expires_at)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Wall-clock time the most recent live alert was shown.
    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        self.last_alert_at
    }

    /// Offer a freshly received alert. Returns `true` if it became live.
    pub fn offer(
        &mut self,
        alert: &Alert,
        filter: SourceFilter,
        now: Instant,
        wall_clock: DateTime<Utc>,
    ) -> bool {
        if self.paused || !filter.accepts(alert.source) {
            return false;
        }

        self.current = Some(LiveAlert {
            alert: alert.clone(),
            expires_at: now + self.ttl,
        });
        self.last_alert_at = Some(wall_clock);
        true
    }

    /// Clear the live alert if its own expiry has passed.
    pub fn expire(&mut self, now: Instant) -> Option<Alert> {
        let due = self
            .current
            .as_ref()
            .is_some_and(|live| now >= live.expires_at);
        if due {
            self.dismiss()
        } else {
            None
        }
    }

    /// Drop the live alert if it no longer passes `filter`.
    pub fn on_source_filter_changed(&mut self, filter: SourceFilter) -> Option<Alert> {
        let rejected = self
            .current
            .as_ref()
            .is_some_and(|live| !filter.accepts(live.alert.source));
        if rejected {
            self.dismiss()
        } else {
            None
        }
    }

    /// User dismissal.
    pub fn dismiss(&mut self) -> Option<Alert> {
        self.current.take().map(|live| live.alert)
    }

    /// Pausing also hides whatever is live.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        if paused {
            self.current = None;
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertKind, AlertSource};

    fn alert(id: &str, source: AlertSource) -> Alert {
        Alert::new(AlertKind::Person, "m", Utc::now())
            .with_id(id)
            .with_source(source)
    }

    #[test]
    fn paused_presenter_never_shows() {
        let mut presenter = LivePresenter::default();
        presenter.set_paused(true);
        let shown = presenter.offer(
            &alert("x", AlertSource::Onboard),
            SourceFilter::All,
            Instant::now(),
            Utc::now(),
        );
        assert!(!shown);
        assert!(presenter.current().is_none());
        assert!(presenter.last_alert_at().is_none());
    }

    #[test]
    fn newer_alert_survives_older_expiry() {
        let start = Instant::now();
        let mut presenter = LivePresenter::default();
        presenter.offer(&alert("x", AlertSource::Onboard), SourceFilter::All, start, Utc::now());
        presenter.offer(
            &alert("y", AlertSource::Onboard),
            SourceFilter::All,
            start + Duration::from_secs(4),
            Utc::now(),
        );

        // X's ten seconds are up; Y still has four to go.
        assert!(presenter.expire(start + Duration::from_secs(10)).is_none());
        assert_eq!(presenter.current().map(|a| a.id.as_str()), Some("y"));

        let expired = presenter.expire(start + Duration::from_secs(14));
        assert_eq!(expired.map(|a| a.id), Some("y".to_string()));
        assert!(presenter.current().is_none());
    }

    #[test]
    fn source_filter_gates_and_clears() {
        let start = Instant::now();
        let mut presenter = LivePresenter::default();

        let offboard = alert("off", AlertSource::Offboard);
        assert!(!presenter.offer(&offboard, SourceFilter::Onboard, start, Utc::now()));
        assert!(presenter.current().is_none());

        assert!(presenter.offer(&offboard, SourceFilter::All, start, Utc::now()));
        assert!(presenter.on_source_filter_changed(SourceFilter::Offboard).is_none());
        assert!(presenter.current().is_some());
        assert!(presenter.on_source_filter_changed(SourceFilter::Onboard).is_some());
        assert!(presenter.current().is_none());
    }

    #[test]
    fn dismissal_is_not_undone_by_expiry() {
        let start = Instant::now();
        let mut presenter = LivePresenter::default();
        presenter.offer(&alert("x", AlertSource::Onboard), SourceFilter::All, start, Utc::now());
        assert!(presenter.dismiss().is_some());
        assert!(presenter.expire(start + Duration::from_secs(30)).is_none());
        assert!(presenter.current().is_none());
        assert!(presenter.expires_at().is_none());
    }

    #[test]
    fn pausing_hides_the_live_alert() {
        let mut presenter = LivePresenter::default();
        presenter.offer(
            &alert("x", AlertSource::Onboard),
            SourceFilter::All,
            Instant::now(),
            Utc::now(),
        );
        presenter.set_paused(true);
        assert!(presenter.current().is_none());
        presenter.set_paused(false);
        assert!(!presenter.is_paused());
    }
}
