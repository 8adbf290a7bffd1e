//! Reconnect timing for the push channel: the same delay before every retry.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconnectDelay {
    delay: Duration,
    attempts: u32,
}

impl ReconnectDelay {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay: delay.max(Duration::from_millis(1)),
            attempts: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Retries since the last successful connection.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Called once a connection opens.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Delay before the next dial after a failure or a lost connection.
    pub fn fail(&mut self) -> Duration {
        self.attempts = self.attempts.saturating_add(1);
        self.delay
    }
}
