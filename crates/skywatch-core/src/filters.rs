//! Display filters over the alert list.
//!
//! Both predicates are pure. Source is evaluated before the time window;
//! the two are independent so the order never changes the result.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::models::{Alert, AlertKind, AlertSource};

/// Relative date range selected for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    #[default]
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    All,
}

impl DateFilter {
    pub const ALL: [DateFilter; 5] = [
        DateFilter::Today,
        DateFilter::Yesterday,
        DateFilter::Last7Days,
        DateFilter::Last30Days,
        DateFilter::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateFilter::Today => "today",
            DateFilter::Yesterday => "yesterday",
            DateFilter::Last7Days => "last7days",
            DateFilter::Last30Days => "last30days",
            DateFilter::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateFilter::Today => "Today",
            DateFilter::Yesterday => "Yesterday",
            DateFilter::Last7Days => "Last 7 days",
            DateFilter::Last30Days => "Last 30 days",
            DateFilter::All => "All time",
        }
    }
}

impl FromStr for DateFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == wanted)
            .ok_or_else(|| ParseError::DateFilter(s.to_string()))
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capture origin selected for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFilter {
    #[default]
    All,
    Onboard,
    Offboard,
}

impl SourceFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFilter::All => "all",
            SourceFilter::Onboard => "onboard",
            SourceFilter::Offboard => "offboard",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceFilter::All => "All Sources",
            SourceFilter::Onboard => "Onboard",
            SourceFilter::Offboard => "Offboard",
        }
    }

    /// The single source this filter selects, if it selects one.
    pub fn source(&self) -> Option<AlertSource> {
        match self {
            SourceFilter::All => None,
            SourceFilter::Onboard => Some(AlertSource::Onboard),
            SourceFilter::Offboard => Some(AlertSource::Offboard),
        }
    }

    pub fn accepts(&self, source: AlertSource) -> bool {
        self.source().map_or(true, |wanted| wanted == source)
    }
}

impl FromStr for SourceFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SourceFilter::All),
            "onboard" => Ok(SourceFilter::Onboard),
            "offboard" => Ok(SourceFilter::Offboard),
            _ => Err(ParseError::SourceFilter(s.to_string())),
        }
    }
}

impl fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `true` when the alert passes the source filter.
pub fn matches_source(alert: &Alert, filter: SourceFilter) -> bool {
    filter.accepts(alert.source)
}

/// `true` when `timestamp` falls in `window` relative to `reference_now`.
///
/// Calendar days are taken in the reference instant's time zone, for both
/// the alert and the reference. The rolling windows have an inclusive lower
/// bound at local midnight and no upper bound.
pub fn matches_window<Tz: TimeZone>(
    timestamp: &DateTime<Utc>,
    window: DateFilter,
    reference_now: &DateTime<Tz>,
) -> bool {
    let local = timestamp.with_timezone(&reference_now.timezone()).naive_local();
    let today = reference_now.date_naive();

    match window {
        DateFilter::Today => local.date() == today,
        DateFilter::Yesterday => today
            .checked_sub_days(Days::new(1))
            .is_some_and(|yesterday| local.date() == yesterday),
        DateFilter::Last7Days => at_or_after_days_back(local, today, 7),
        DateFilter::Last30Days => at_or_after_days_back(local, today, 30),
        DateFilter::All => true,
    }
}

fn at_or_after_days_back(local: NaiveDateTime, today: NaiveDate, days: u64) -> bool {
    today
        .checked_sub_days(Days::new(days))
        .and_then(|start| start.and_hms_opt(0, 0, 0))
        .map_or(true, |midnight| local >= midnight)
}

/// Apply both filters, keeping list order.
pub fn filter_alerts<Tz: TimeZone>(
    alerts: &[Alert],
    date: DateFilter,
    source: SourceFilter,
    reference_now: &DateTime<Tz>,
) -> Vec<Alert> {
    alerts
        .iter()
        .filter(|alert| matches_source(alert, source))
        .filter(|alert| matches_window(&alert.timestamp, date, reference_now))
        .cloned()
        .collect()
}

/// Counts shown alongside the filtered list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    pub person: usize,
    pub animal: usize,
    pub onboard: usize,
    pub offboard: usize,
}

impl AlertSummary {
    pub fn from_alerts<'a>(alerts: impl IntoIterator<Item = &'a Alert>) -> Self {
        let mut summary = Self::default();
        for alert in alerts {
            summary.total += 1;
            match alert.kind {
                AlertKind::Person => summary.person += 1,
                AlertKind::Animal => summary.animal += 1,
                AlertKind::Unknown(_) => {}
            }
            match alert.source {
                AlertSource::Onboard => summary.onboard += 1,
                AlertSource::Offboard => summary.offboard += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn alert_at(ts: DateTime<Utc>, source: AlertSource) -> Alert {
        Alert::new(AlertKind::Person, "m", ts).with_source(source)
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn all_source_filter_matches_everything() {
        for source in [AlertSource::Onboard, AlertSource::Offboard] {
            assert!(matches_source(&alert_at(Utc::now(), source), SourceFilter::All));
        }
    }

    #[test]
    fn specific_source_filter_requires_equality() {
        let onboard = alert_at(Utc::now(), AlertSource::Onboard);
        assert!(matches_source(&onboard, SourceFilter::Onboard));
        assert!(!matches_source(&onboard, SourceFilter::Offboard));
    }

    #[test]
    fn today_compares_calendar_dates() {
        let now = utc(2024, 3, 10, 15, 0);
        assert!(matches_window(&utc(2024, 3, 10, 0, 0), DateFilter::Today, &now));
        assert!(matches_window(&utc(2024, 3, 10, 23, 59), DateFilter::Today, &now));
        assert!(!matches_window(&utc(2024, 3, 9, 23, 59), DateFilter::Today, &now));
        assert!(!matches_window(&utc(2024, 3, 11, 0, 0), DateFilter::Today, &now));
    }

    #[test]
    fn today_holds_for_every_minute_of_the_reference_day() {
        let now = utc(2024, 3, 10, 12, 0);
        let start = utc(2024, 3, 9, 0, 0);
        for step in 0..(3 * 24 * 4) {
            let ts = start + Duration::minutes(15 * step);
            let same_day = ts.date_naive() == now.date_naive();
            assert_eq!(matches_window(&ts, DateFilter::Today, &now), same_day, "{ts}");
        }
    }

    #[test]
    fn calendar_days_follow_the_reference_zone() {
        // 23:30 UTC on the 9th is already the 10th at UTC+2.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = plus_two.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        assert!(matches_window(&utc(2024, 3, 9, 23, 30), DateFilter::Today, &now));
        assert!(matches_window(&utc(2024, 3, 9, 21, 30), DateFilter::Yesterday, &now));
    }

    #[test]
    fn yesterday_is_previous_calendar_day() {
        let now = utc(2024, 3, 1, 8, 0);
        assert!(matches_window(&utc(2024, 2, 29, 12, 0), DateFilter::Yesterday, &now));
        assert!(!matches_window(&utc(2024, 3, 1, 1, 0), DateFilter::Yesterday, &now));
        assert!(!matches_window(&utc(2024, 2, 28, 12, 0), DateFilter::Yesterday, &now));
    }

    #[test]
    fn rolling_windows_start_at_midnight_and_have_no_upper_bound() {
        let now = utc(2024, 3, 10, 18, 0);
        assert!(matches_window(&utc(2024, 3, 3, 0, 0), DateFilter::Last7Days, &now));
        assert!(!matches_window(&utc(2024, 3, 2, 23, 59), DateFilter::Last7Days, &now));
        assert!(matches_window(&utc(2024, 2, 9, 0, 0), DateFilter::Last30Days, &now));
        assert!(!matches_window(&utc(2024, 2, 8, 23, 59), DateFilter::Last30Days, &now));
        assert!(matches_window(&utc(2030, 1, 1, 0, 0), DateFilter::Last7Days, &now));
        assert!(matches_window(&utc(1999, 1, 1, 0, 0), DateFilter::All, &now));
    }

    #[test]
    fn filter_alerts_keeps_order_and_applies_both() {
        let now = utc(2024, 3, 10, 18, 0);
        let alerts = vec![
            alert_at(utc(2024, 3, 10, 17, 0), AlertSource::Offboard).with_id("a"),
            alert_at(utc(2024, 3, 10, 16, 0), AlertSource::Onboard).with_id("b"),
            alert_at(utc(2024, 3, 9, 16, 0), AlertSource::Onboard).with_id("c"),
            alert_at(utc(2024, 3, 10, 9, 0), AlertSource::Onboard).with_id("d"),
        ];

        let ids: Vec<_> = filter_alerts(&alerts, DateFilter::Today, SourceFilter::Onboard, &now)
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["b", "d"]);
    }

    #[test]
    fn summary_counts_kinds_and_sources() {
        let now = Utc::now();
        let alerts = vec![
            Alert::new(AlertKind::Person, "m", now),
            Alert::new(AlertKind::Animal, "m", now).with_source(AlertSource::Offboard),
            Alert::new(AlertKind::Unknown("drone".into()), "m", now),
        ];
        let summary = AlertSummary::from_alerts(&alerts);
        assert_eq!(
            summary,
            AlertSummary {
                total: 3,
                person: 1,
                animal: 1,
                onboard: 2,
                offboard: 1,
            }
        );
    }

    #[test]
    fn filters_parse_and_label() {
        assert_eq!("last7days".parse::<DateFilter>().unwrap(), DateFilter::Last7Days);
        assert_eq!(DateFilter::Last30Days.label(), "Last 30 days");
        assert!("week".parse::<DateFilter>().is_err());
        assert_eq!("OFFBOARD".parse::<SourceFilter>().unwrap(), SourceFilter::Offboard);
        assert_eq!(SourceFilter::All.label(), "All Sources");
    }

    #[test]
    fn date_filter_serializes_like_the_dashboard() {
        assert_eq!(
            serde_json::to_string(&DateFilter::Last7Days).unwrap(),
            "\"last7days\""
        );
    }
}
