//! Dashboard configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use skywatch_core::{ModeSwitchPolicy, ParseError};

/// What a failed history refresh does to the local list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryFailurePolicy {
    /// Empty the list.
    #[default]
    Clear,
    /// Leave the last successfully loaded list in place.
    KeepLastKnown,
}

impl FromStr for HistoryFailurePolicy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clear" => Ok(HistoryFailurePolicy::Clear),
            "keep" | "keep-last-known" => Ok(HistoryFailurePolicy::KeepLastKnown),
            _ => Err(ParseError::HistoryPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base of the REST API, e.g. `http://localhost:5000/api`
    pub api_url: String,
    /// Push channel URL
    pub ws_url: String,
    /// Drone addressed by mode commands
    pub drone_id: String,
    pub batch_interval: Duration,
    pub live_alert_ttl: Duration,
    pub reconnect_delay: Duration,
    pub max_alerts: usize,
    pub request_timeout: Duration,
    pub mode_policy: ModeSwitchPolicy,
    pub history_failure: HistoryFailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            ws_url: "ws://localhost:5000".to_string(),
            drone_id: "drone-1".to_string(),
            batch_interval: skywatch_core::BATCH_INTERVAL,
            live_alert_ttl: skywatch_core::LIVE_ALERT_TTL,
            reconnect_delay: Duration::from_secs(3),
            max_alerts: skywatch_core::MAX_ALERTS,
            request_timeout: Duration::from_secs(10),
            mode_policy: ModeSwitchPolicy::default(),
            history_failure: HistoryFailurePolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env::var("SKYWATCH_API_URL").unwrap_or(defaults.api_url),
            ws_url: env::var("SKYWATCH_WS_URL").unwrap_or(defaults.ws_url),
            drone_id: env::var("SKYWATCH_DRONE_ID").unwrap_or(defaults.drone_id),
            batch_interval: env_millis("SKYWATCH_BATCH_MS").unwrap_or(defaults.batch_interval),
            live_alert_ttl: env_millis("SKYWATCH_LIVE_ALERT_MS")
                .unwrap_or(defaults.live_alert_ttl),
            reconnect_delay: env_millis("SKYWATCH_RECONNECT_MS")
                .unwrap_or(defaults.reconnect_delay),
            max_alerts: env_parse("SKYWATCH_MAX_ALERTS").unwrap_or(defaults.max_alerts),
            request_timeout: env_parse("SKYWATCH_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            mode_policy: env_parse("SKYWATCH_MODE_POLICY").unwrap_or(defaults.mode_policy),
            history_failure: env_parse("SKYWATCH_HISTORY_FAILURE")
                .unwrap_or(defaults.history_failure),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_timings() {
        let config = Config::default();
        assert_eq!(config.batch_interval, Duration::from_secs(2));
        assert_eq!(config.live_alert_ttl, Duration::from_secs(10));
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
        assert_eq!(config.max_alerts, 100);
        assert_eq!(config.mode_policy, ModeSwitchPolicy::ActivateOnly);
        assert_eq!(config.history_failure, HistoryFailurePolicy::Clear);
    }

    #[test]
    fn history_policy_parses() {
        assert_eq!(
            "keep".parse::<HistoryFailurePolicy>().unwrap(),
            HistoryFailurePolicy::KeepLastKnown
        );
        assert!("retry".parse::<HistoryFailurePolicy>().is_err());
    }
}
