//! Protocol-wide constants.

use std::time::Duration;

/// Default telemetry endpoint (Node-RED WebSocket out node on the kiosk LAN).
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:1880/ws/compressor";

/// Maximum number of snapshots retained in the rolling history.
pub const HISTORY_CAPACITY: usize = 50;

/// Fixed delay before re-dialing after an unintended disconnect.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// No frame within this window means the dashboard shows stale data.
pub const STALE_THRESHOLD: Duration = Duration::from_secs(5);

/// Interval between keepalive pings sent to the telemetry source.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(15);

/// If nothing arrives within this window after a ping, the connection
/// is considered dead and torn down.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// Upper bound on a single inbound frame. Telemetry frames are tiny;
/// anything bigger is garbage.
pub const WS_MAX_MESSAGE_SIZE: usize = 64 * 1024;
