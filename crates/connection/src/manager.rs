//! Connection manager owning the telemetry WebSocket lifecycle.
//!
//! At most one live connection at a time. Subscribers get connection-state
//! transitions and decoded telemetry frames; unintended disconnects are
//! retried after a fixed delay until [`disconnect`](ConnectionManager::disconnect)
//! is called.

use std::sync::atomic::Ordering;

use tracing::debug;

use airview_protocol::TelemetryFrame;

use crate::reconnection::{
    WsContext, cancel_pending_reconnect, connect_inner, set_state,
};
use crate::subscribers::Subscription;
use crate::types::{ConnectionState, ReconnectConfig};

/// Owns the single streaming connection to the telemetry endpoint.
///
/// Explicitly constructed and injected — there is no process-wide
/// instance. Cheap to share via [`Clone`]: clones operate on the same
/// connection.
#[derive(Clone)]
pub struct ConnectionManager {
    ctx: WsContext,
}

impl ConnectionManager {
    /// Creates a manager with the standard 3 s reconnect delay.
    pub fn new() -> Self {
        Self::with_config(ReconnectConfig::default())
    }

    pub fn with_config(reconnect: ReconnectConfig) -> Self {
        Self {
            ctx: WsContext::new(reconnect),
        }
    }

    /// Connects to `url`.
    ///
    /// No-op when already connected or connecting to the same URL.
    /// Otherwise any existing session is torn down first. A failed dial
    /// leaves the state at [`ConnectionState::Error`] with a reconnect
    /// scheduled; failures are not returned because retrying is the
    /// manager's job.
    pub async fn connect(&self, url: &str) {
        connect_inner(self.ctx.clone(), url.to_string()).await;
    }

    /// Closes the connection and stops all reconnect attempts.
    ///
    /// Idempotent. After this returns no status or data callback fires
    /// until [`connect`](Self::connect) is called again, even for network
    /// events still in flight.
    pub async fn disconnect(&self) {
        self.ctx.intentional_close.store(true, Ordering::Relaxed);
        cancel_pending_reconnect(&self.ctx.reconnect_cancel);

        let client = self.ctx.ws_client.lock().await.take();
        if let Some(client) = client {
            // Callbacks go first: a close event racing this call must
            // find nothing to invoke.
            client.clear_callbacks().await;
            client.close().await;
            set_state(&self.ctx, ConnectionState::Disconnected);
            debug!("disconnected from telemetry source");
        } else if *self.ctx.state.read().unwrap() != ConnectionState::Disconnected {
            set_state(&self.ctx, ConnectionState::Disconnected);
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.ctx.state.read().unwrap()
    }

    /// The currently configured endpoint URL, empty before first connect.
    pub fn endpoint_url(&self) -> String {
        self.ctx.url.read().unwrap().clone()
    }

    /// Whether a reconnect timer is pending.
    pub fn reconnect_pending(&self) -> bool {
        self.ctx
            .reconnect_cancel
            .lock()
            .map(|g| g.is_some())
            .unwrap_or(false)
    }

    /// Registers a listener for connection-state transitions.
    pub fn subscribe_status(
        &self,
        callback: impl Fn(&ConnectionState) + Send + Sync + 'static,
    ) -> Subscription {
        self.ctx.status_subs.subscribe(callback)
    }

    /// Registers a listener for decoded telemetry frames.
    pub fn subscribe_data(
        &self,
        callback: impl Fn(&TelemetryFrame) + Send + Sync + 'static,
    ) -> Subscription {
        self.ctx.data_subs.subscribe(callback)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn starts_disconnected() {
        let mgr = ConnectionManager::new();
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
        assert!(!mgr.reconnect_pending());
        assert_eq!(mgr.endpoint_url(), "");
    }

    #[tokio::test]
    async fn disconnect_when_not_connected_is_noop() {
        let mgr = ConnectionManager::new();
        mgr.disconnect().await;
        mgr.disconnect().await;
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn failed_connect_sets_error_and_schedules_reconnect() {
        let mgr = ConnectionManager::new();
        let states = Arc::new(Mutex::new(Vec::new()));
        let s = states.clone();
        let _sub = mgr.subscribe_status(move |state: &ConnectionState| {
            s.lock().unwrap().push(*state);
        });

        mgr.connect("ws://127.0.0.1:1/ws/compressor").await;

        assert_eq!(mgr.state(), ConnectionState::Error);
        assert!(mgr.reconnect_pending());
        assert_eq!(
            *states.lock().unwrap(),
            vec![ConnectionState::Connecting, ConnectionState::Error]
        );

        mgr.disconnect().await;
        assert!(!mgr.reconnect_pending());
    }

    #[tokio::test]
    async fn disconnect_cancels_pending_reconnect() {
        let mgr = ConnectionManager::with_config(ReconnectConfig {
            delay: Duration::from_millis(50),
        });
        mgr.connect("ws://127.0.0.1:1/ws/compressor").await;
        assert!(mgr.reconnect_pending());

        mgr.disconnect().await;
        assert!(!mgr.reconnect_pending());

        // The timer never fires: no further dial, no state change.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
        assert!(!mgr.reconnect_pending());
    }

    #[tokio::test]
    async fn unsubscribed_listener_is_silent() {
        let mgr = ConnectionManager::new();
        let count = Arc::new(Mutex::new(0u32));
        let c = count.clone();
        let sub = mgr.subscribe_status(move |_| {
            *c.lock().unwrap() += 1;
        });
        sub.unsubscribe();

        mgr.connect("ws://127.0.0.1:1/ws/compressor").await;
        mgr.disconnect().await;

        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn connect_records_configured_url() {
        let mgr = ConnectionManager::new();
        mgr.connect("ws://127.0.0.1:1/ws/compressor").await;
        assert_eq!(mgr.endpoint_url(), "ws://127.0.0.1:1/ws/compressor");
        mgr.disconnect().await;
    }
}
