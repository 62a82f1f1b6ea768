//! Public types for the connection manager.

use std::time::Duration;

use airview_protocol::constants::RECONNECT_DELAY;

/// Connection state of the telemetry link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no dial in progress.
    Disconnected,
    /// WebSocket handshake in progress.
    Connecting,
    /// Live connection, frames flowing.
    Connected,
    /// A transport error occurred. Usually followed by `Disconnected`
    /// and a scheduled reconnect.
    Error,
}

/// Reconnection policy after an unintended disconnect.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Fixed delay before re-dialing.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: RECONNECT_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_equality() {
        assert_eq!(ConnectionState::Connected, ConnectionState::Connected);
        assert_ne!(ConnectionState::Connecting, ConnectionState::Connected);
    }

    #[test]
    fn default_delay_is_three_seconds() {
        assert_eq!(ReconnectConfig::default().delay, Duration::from_secs(3));
    }
}
