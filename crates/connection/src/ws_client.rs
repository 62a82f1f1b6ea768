//! WebSocket client for one telemetry session.
//!
//! The stream is receive-only at the application level: inbound text
//! frames are decoded into [`TelemetryFrame`]s, and the only outbound
//! traffic is keepalive pings, pong replies, and the close frame.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use futures_util::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite;

use airview_protocol::TelemetryFrame;
use airview_protocol::constants::WS_MAX_MESSAGE_SIZE;

/// Errors from the WebSocket client.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),
}

/// Callback invoked with each decoded telemetry frame.
pub(crate) type FrameCallback = Arc<Mutex<Option<Box<dyn Fn(TelemetryFrame) + Send + Sync>>>>;

/// Callback invoked once when the session ends, for any reason.
pub(crate) type DisconnectCallback = Arc<Mutex<Option<Box<dyn Fn() + Send + Sync>>>>;

/// A live WebSocket session to the telemetry endpoint.
pub struct WsClient {
    write_tx: mpsc::Sender<tungstenite::Message>,
    on_frame: FrameCallback,
    on_disconnect: DisconnectCallback,
    /// Set by the read pump when the session ended on a transport error
    /// (read failure or keepalive timeout) rather than a clean close.
    transport_error: Arc<AtomicBool>,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
    _ping_handle: tokio::task::JoinHandle<()>,
    cancel: tokio_util::sync::CancellationToken,
}

impl WsClient {
    /// Dials the endpoint and completes the WebSocket handshake.
    pub async fn connect(url: &str) -> Result<Self, WsError> {
        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false).await?;
        let (write, read) = ws_stream.split();

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(64);
        let on_frame: FrameCallback = Arc::new(Mutex::new(None));
        let on_disconnect: DisconnectCallback = Arc::new(Mutex::new(None));
        let transport_error = Arc::new(AtomicBool::new(false));
        let cancel = tokio_util::sync::CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write::write_pump(write, write_rx, cancel))
        };

        let read_handle = {
            let on_frame = on_frame.clone();
            let on_disconnect = on_disconnect.clone();
            let transport_error = transport_error.clone();
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::read::read_pump(
                read,
                on_frame,
                on_disconnect,
                transport_error,
                write_tx,
                cancel,
            ))
        };

        let ping_handle = {
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::ping::ping_pump(write_tx, cancel))
        };

        Ok(Self {
            write_tx,
            on_frame,
            on_disconnect,
            transport_error,
            _read_handle: read_handle,
            _write_handle: write_handle,
            _ping_handle: ping_handle,
            cancel,
        })
    }

    /// Sets the callback for decoded telemetry frames.
    pub(crate) async fn set_frame_callback(&self, cb: Box<dyn Fn(TelemetryFrame) + Send + Sync>) {
        *self.on_frame.lock().await = Some(cb);
    }

    /// Sets the callback for session end.
    pub(crate) async fn set_disconnect_callback(&self, cb: Box<dyn Fn() + Send + Sync>) {
        *self.on_disconnect.lock().await = Some(cb);
    }

    /// Drops both callbacks. Events arriving afterwards go nowhere, which
    /// is what an intentional disconnect relies on.
    pub(crate) async fn clear_callbacks(&self) {
        *self.on_frame.lock().await = None;
        *self.on_disconnect.lock().await = None;
    }

    /// Flag set when the session died on a transport error.
    pub(crate) fn transport_error(&self) -> Arc<AtomicBool> {
        self.transport_error.clone()
    }

    /// Gracefully closes the session.
    pub async fn close(&self) {
        self.cancel.cancel();
        let _ = self.write_tx.send(tungstenite::Message::Close(None)).await;
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
        self._ping_handle.abort();
    }
}
