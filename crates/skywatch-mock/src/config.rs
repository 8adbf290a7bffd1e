//! Mock backend configuration from environment.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub port: u16,
    /// Emit a random alert this often; `None` disables the generator.
    pub simulate_interval: Option<Duration>,
    /// Push flat alert objects instead of `{type, source, data}` envelopes.
    pub legacy_envelope: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            simulate_interval: None,
            legacy_envelope: false,
        }
    }
}

impl MockConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("SKYWATCH_MOCK_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
            simulate_interval: env::var("SKYWATCH_MOCK_SIMULATE_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            legacy_envelope: env::var("SKYWATCH_MOCK_LEGACY_ENVELOPE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}
