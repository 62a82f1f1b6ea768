//! WebSocket read pump — decodes and dispatches inbound frames.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use airview_protocol::TelemetryFrame;
use airview_protocol::constants::{WS_MAX_MESSAGE_SIZE, WS_PONG_WAIT};

use crate::ws_client::{DisconnectCallback, FrameCallback};

/// Reads messages from the WebSocket and dispatches decoded frames.
///
/// A pong deadline detects dead connections: if nothing arrives within
/// [`WS_PONG_WAIT`] the link is considered dead and the loop exits with
/// the transport-error flag set, which feeds the reconnect path.
pub(crate) async fn read_pump<S>(
    mut read: S,
    on_frame: FrameCallback,
    on_disconnect: DisconnectCallback,
    transport_error: Arc<AtomicBool>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let pong_deadline = tokio::time::sleep(WS_PONG_WAIT);
    tokio::pin!(pong_deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            () = &mut pong_deadline => {
                warn!("keepalive timeout, closing connection");
                transport_error.store(true, Ordering::Relaxed);
                break;
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        // Any inbound traffic proves the link is alive.
                        pong_deadline.as_mut().reset(tokio::time::Instant::now() + WS_PONG_WAIT);

                        match msg {
                            tungstenite::Message::Text(text) => {
                                handle_text_frame(&text, &on_frame).await;
                            }
                            tungstenite::Message::Ping(data) => {
                                trace!("received ping, sending pong");
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Pong(_) => {
                                trace!("received pong");
                            }
                            tungstenite::Message::Close(_) => {
                                debug!("received close frame");
                                break;
                            }
                            _ => {} // Binary — the protocol is text-only.
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        transport_error.store(true, Ordering::Relaxed);
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    if let Some(cb) = on_disconnect.lock().await.as_ref() {
        cb();
    }
}

/// Decodes one text frame. Malformed frames are logged and dropped; they
/// never reach subscribers and never affect connection health.
async fn handle_text_frame(text: &str, on_frame: &FrameCallback) {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        warn!("frame too large ({} bytes), dropping", text.len());
        return;
    }

    let frame: TelemetryFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            warn!("failed to decode telemetry frame: {e}");
            return;
        }
    };

    // The dashboard needs a timestamp on every frame to judge staleness.
    let frame = frame.with_timestamp();

    let guard = on_frame.lock().await;
    if let Some(cb) = guard.as_ref() {
        cb(frame);
    } else {
        trace!("no frame callback set, dropping frame");
    }
}
