//! Formatting shared by every front end.

use chrono::{DateTime, TimeZone};

/// Confidence as a whole percentage.
///
/// Values below 1 are fractions, anything else is already a percentage.
/// Zero and absent confidences have nothing to show.
pub fn confidence_percent(confidence: Option<f64>) -> Option<u32> {
    let value = confidence.filter(|c| c.is_finite() && *c != 0.0)?;
    let percent = if value < 1.0 { value * 100.0 } else { value };
    Some(percent.round().max(0.0) as u32)
}

pub fn format_confidence(confidence: Option<f64>) -> Option<String> {
    confidence_percent(confidence).map(|percent| format!("{percent}%"))
}

/// `Jan 5, 10:04:05 AM`
pub fn format_timestamp<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    timestamp.format("%b %-d, %I:%M:%S %p").to_string()
}
