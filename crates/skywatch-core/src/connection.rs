//! Push channel connection states.
//!
//! ```text
//!   Dial        Opened        Lost
//! ───────► Connecting ───► Connected ───► Disconnected ──Dial──► Connecting ...
//!
//!   Shutdown from any state ──► Shutdown (terminal)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    #[default]
    Disconnected,
    /// Torn down; no further reconnects.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection attempt starts.
    Dial,
    /// The handshake completed.
    Opened,
    /// The attempt failed or an open connection dropped.
    Lost,
    Shutdown,
}

impl ConnectionStatus {
    /// Next state after `event`. Events that make no sense in the current
    /// state leave it unchanged.
    pub fn apply(self, event: ConnectionEvent) -> ConnectionStatus {
        use ConnectionEvent as E;
        use ConnectionStatus as S;

        match (self, event) {
            (S::Shutdown, _) => S::Shutdown,
            (_, E::Shutdown) => S::Shutdown,
            (S::Disconnected, E::Dial) => S::Connecting,
            (S::Connecting, E::Opened) => S::Connected,
            (S::Connecting | S::Connected, E::Lost) => S::Disconnected,
            (state, _) => state,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Shutdown => "shutdown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Shutdown => "Shutdown",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
