//! Core data models for the Skywatch alert stream.
//!
//! Upstream payloads are loosely typed (fields go missing, ids arrive as
//! numbers, timestamps come in several formats), so every wire field is read
//! through [`RawAlert`] and normalized into an [`Alert`] exactly once.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Image reference used when the backend sends none.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=300&width=400";

/// What was detected.
///
/// Unrecognized values are kept verbatim so new detector classes flow
/// through filtering and display untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertKind {
    Person,
    Animal,
    Unknown(String),
}

impl AlertKind {
    pub fn as_str(&self) -> &str {
        match self {
            AlertKind::Person => "person",
            AlertKind::Animal => "animal",
            AlertKind::Unknown(other) => other,
        }
    }
}

impl From<String> for AlertKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "person" => AlertKind::Person,
            "animal" => AlertKind::Animal,
            _ => AlertKind::Unknown(value),
        }
    }
}

impl From<AlertKind> for String {
    fn from(kind: AlertKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the detection ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    /// On the drone itself
    #[default]
    Onboard,
    /// Ground-side processing
    Offboard,
}

impl AlertSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSource::Onboard => "onboard",
            AlertSource::Offboard => "offboard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "onboard" => Some(AlertSource::Onboard),
            "offboard" => Some(AlertSource::Offboard),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AlertSource::Onboard => "Onboard",
            AlertSource::Offboard => "Offboard",
        }
    }
}

impl fmt::Display for AlertSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detection event, immutable once normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub image: String,
    pub timestamp: DateTime<Utc>,
    /// Either a fraction in [0, 1] or a percentage in [0, 100]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drone_id: Option<String>,
    #[serde(default)]
    pub source: AlertSource,
}

impl Alert {
    /// Build an alert with defaults for every optional field.
    pub fn new(kind: AlertKind, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: generate_alert_id(),
            kind,
            message: message.into(),
            image: PLACEHOLDER_IMAGE.to_string(),
            timestamp,
            confidence: None,
            drone_id: None,
            source: AlertSource::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_source(mut self, source: AlertSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_drone(mut self, drone_id: impl Into<String>) -> Self {
        self.drone_id = Some(drone_id.into());
        self
    }

    /// Path of the external detail view for this alert.
    pub fn detail_path(&self) -> String {
        format!("/alert/{}", self.id)
    }
}

/// Fresh id for an alert that arrived without one.
pub fn generate_alert_id() -> String {
    format!("alert-{}", Uuid::new_v4())
}

/// Alert payload exactly as the backend sends it.
///
/// Every field is optional and loosely typed; [`RawAlert::normalize`] applies
/// the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAlert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Value>,
    #[serde(
        rename = "createdAt",
        alias = "created_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Value>,
    #[serde(alias = "droneId", skip_serializing_if = "Option::is_none")]
    pub drone_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

impl RawAlert {
    /// Wire form of an already normalized alert, as the history endpoint
    /// would return it.
    pub fn from_alert(alert: &Alert) -> Self {
        Self {
            id: Some(Value::String(alert.id.clone())),
            kind: Some(Value::String(alert.kind.to_string())),
            message: Some(Value::String(alert.message.clone())),
            image: Some(Value::String(alert.image.clone())),
            created_at: Some(Value::String(alert.timestamp.to_rfc3339())),
            timestamp: None,
            confidence: alert.confidence.map(Value::from),
            drone_id: alert.drone_id.clone().map(Value::String),
            source: Some(Value::String(alert.source.to_string())),
        }
    }

    /// Apply defaults and produce an [`Alert`].
    ///
    /// `received_at` is used when neither `createdAt` nor `timestamp` holds a
    /// readable time.
    pub fn normalize(self, received_at: DateTime<Utc>) -> Alert {
        let id = self
            .id
            .as_ref()
            .and_then(value_as_text)
            .unwrap_or_else(generate_alert_id);

        let kind = self
            .kind
            .as_ref()
            .and_then(value_as_text)
            .map(AlertKind::from)
            .unwrap_or_else(|| AlertKind::Unknown(String::new()));

        let message = self
            .message
            .as_ref()
            .and_then(value_as_text)
            .unwrap_or_default();

        let image = self
            .image
            .as_ref()
            .and_then(value_as_text)
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

        let timestamp = self
            .created_at
            .as_ref()
            .and_then(parse_timestamp)
            .or_else(|| self.timestamp.as_ref().and_then(parse_timestamp))
            .unwrap_or(received_at);

        let confidence = self.confidence.as_ref().and_then(value_as_number);
        let drone_id = self.drone_id.as_ref().and_then(value_as_text);
        let source = self
            .source
            .as_ref()
            .and_then(Value::as_str)
            .and_then(AlertSource::parse)
            .unwrap_or_default();

        Alert {
            id,
            kind,
            message,
            image,
            timestamp,
            confidence,
            drone_id,
            source,
        }
    }
}

/// Non-empty text from a string or number value.
fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Read a backend timestamp.
///
/// Accepts RFC 3339, naive ISO date-times (read as UTC), bare dates (UTC
/// midnight), and epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
                return Some(parsed.with_timezone(&Utc));
            }
            for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                    return Some(Utc.from_utc_datetime(&naive));
                }
            }
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        }
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}
