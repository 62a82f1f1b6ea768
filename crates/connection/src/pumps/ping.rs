//! Keepalive pings.

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;

use airview_protocol::constants::WS_PING_PERIOD;

/// Queues a ping every [`WS_PING_PERIOD`] so a dead link is noticed even
/// when the telemetry source goes quiet. The read pump enforces the
/// matching pong deadline; this task only feeds the outbound channel and
/// stops once that channel or the session is gone.
pub(crate) async fn ping_pump(
    outbound: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(WS_PING_PERIOD);
    // The first tick completes immediately; the session just opened, so
    // swallow it and start the cadence one period out.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let ping = tungstenite::Message::Ping(Vec::new().into());
        if outbound.send(ping).await.is_err() {
            break;
        }
    }
}
