//! Wire shapes for the history endpoint and the push channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;
use crate::models::{Alert, AlertSource, RawAlert};

/// Body of `GET {api}/alert`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub data: Option<Vec<RawAlert>>,
}

impl HistoryResponse {
    /// Normalize every entry; a missing `data` array is an empty history.
    pub fn into_alerts(self, received_at: DateTime<Utc>) -> Vec<Alert> {
        self.data
            .unwrap_or_default()
            .into_iter()
            .map(|raw| raw.normalize(received_at))
            .collect()
    }
}

/// Push message envelope: `{ "type": "alert", "source": ..., "data": {...} }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<AlertSource>,
    pub data: RawAlert,
}

impl PushEnvelope {
    pub const ALERT: &'static str = "alert";

    pub fn alert(alert: &Alert) -> Self {
        let mut data = RawAlert::from_alert(alert);
        // The live channel carries `timestamp`, the source rides on the envelope.
        data.timestamp = data.created_at.take();
        data.source = None;
        Self {
            kind: Self::ALERT.to_string(),
            source: Some(alert.source),
            data,
        }
    }
}

/// Decode one push-channel text frame.
///
/// Returns `Ok(None)` for well-formed messages that carry no alert. Both the
/// enveloped form and the older flat form (the alert payload itself, no
/// envelope) are accepted.
pub fn decode_push_message(
    text: &str,
    received_at: DateTime<Utc>,
) -> Result<Option<Alert>, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(map) = &value else {
        return Ok(None);
    };

    if map.get("type").and_then(Value::as_str) == Some(PushEnvelope::ALERT) {
        let Some(data) = map.get("data").filter(|data| data.is_object()) else {
            return Ok(None);
        };
        let raw: RawAlert = serde_json::from_value(data.clone())?;
        let mut alert = raw.normalize(received_at);
        if let Some(source) = map
            .get("source")
            .and_then(Value::as_str)
            .and_then(AlertSource::parse)
        {
            alert.source = source;
        }
        return Ok(Some(alert));
    }

    if map.contains_key("message") {
        let raw: RawAlert = serde_json::from_value(value)?;
        return Ok(Some(raw.normalize(received_at)));
    }

    Ok(None)
}
