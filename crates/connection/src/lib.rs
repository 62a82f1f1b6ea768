//! Streaming telemetry client for the compressor dashboard.
//!
//! Maintains a single WebSocket connection to the telemetry endpoint,
//! decodes inbound frames, publishes them to data subscribers, and
//! reconnects automatically after unintended disconnects.

pub mod manager;
pub(crate) mod pumps;
pub(crate) mod reconnection;
pub mod subscribers;
pub mod types;
pub mod ws_client;

pub use manager::ConnectionManager;
pub use subscribers::{Subscribers, Subscription};
pub use types::{ConnectionState, ReconnectConfig};
pub use ws_client::{WsClient, WsError};
