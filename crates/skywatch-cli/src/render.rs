//! Plain-text rendering of dashboard snapshots.

use std::fmt::{Display, Write};

use chrono::TimeZone;
use skywatch_core::display::{format_confidence, format_timestamp};
use skywatch_core::{Alert, AlertSummary};
use skywatch_sdk::DashboardSnapshot;

/// One list row: time, kind, confidence, source, drone, message and detail path.
pub fn alert_line<Tz: TimeZone>(alert: &Alert, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let mut line = format!(
        "{:<22} {:<8} {:>4}  {:<8}",
        format_timestamp(&alert.timestamp.with_timezone(tz)),
        alert.kind.as_str().to_uppercase(),
        format_confidence(alert.confidence).unwrap_or_default(),
        alert.source.as_str(),
    );
    if let Some(drone_id) = &alert.drone_id {
        let _ = write!(line, " {}", drone_id);
    }
    let _ = write!(line, "  {}  ({})", alert.message, alert.detail_path());
    line
}

pub fn summary_line(summary: &AlertSummary) -> String {
    format!(
        "{} alerts: {} person, {} animal | {} onboard, {} offboard",
        summary.total, summary.person, summary.animal, summary.onboard, summary.offboard
    )
}

/// Status bar: connection, mode, filters and counters.
pub fn header(snapshot: &DashboardSnapshot) -> String {
    let mut header = format!(
        "[{}] mode: {}{} | {} / {} | received {} (pending {})",
        snapshot.status.label(),
        snapshot.active_mode.label(),
        if snapshot.mode_switching { " (switching)" } else { "" },
        snapshot.date_filter.label(),
        snapshot.source_filter.label(),
        snapshot.received_count,
        snapshot.pending_count,
    );
    if snapshot.paused {
        header.push_str(" | PAUSED");
    }
    if snapshot.loading {
        header.push_str(" | loading");
    }
    header
}

/// Full screen: header, optional live banner and error, summary, newest
/// `limit` rows.
pub fn render_snapshot<Tz: TimeZone>(snapshot: &DashboardSnapshot, tz: &Tz, limit: usize) -> String
where
    Tz::Offset: Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(snapshot));
    if let Some(error) = &snapshot.last_error {
        let _ = writeln!(out, "! {}", error);
    }
    if let Some(alert) = &snapshot.current_alert {
        let _ = writeln!(out, ">> LIVE: {}", alert_line(alert, tz));
    }
    let _ = writeln!(out, "{}", summary_line(&snapshot.summary));
    if snapshot.alerts.is_empty() {
        let _ = writeln!(out, "   (no alerts)");
    }
    for alert in snapshot.alerts.iter().take(limit) {
        let _ = writeln!(out, "   {}", alert_line(alert, tz));
    }
    if snapshot.alerts.len() > limit {
        let _ = writeln!(out, "   ... {} more", snapshot.alerts.len() - limit);
    }
    out
}
