//! Outbound half of the socket.
//!
//! The telemetry stream is receive-only, so the only traffic here is
//! control frames: pong replies queued by the read pump, keepalive pings
//! from the ping pump, and the close frame sent on the way out.

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub(crate) async fn write_pump<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = outbound.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };
        if let Err(e) = sink.send(msg).await {
            warn!("WebSocket write error: {e}");
            break;
        }
    }

    // Best effort: the peer may already be gone.
    let _ = sink.send(tungstenite::Message::Close(None)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::sink;

    fn capture_sink() -> (
        std::pin::Pin<Box<impl SinkExt<tungstenite::Message, Error = tungstenite::Error>>>,
        mpsc::Receiver<tungstenite::Message>,
    ) {
        let (tx, rx) = mpsc::channel::<tungstenite::Message>(16);
        let sink = sink::unfold(tx, |tx, msg: tungstenite::Message| async move {
            let _ = tx.send(msg).await;
            Ok::<_, tungstenite::Error>(tx)
        });
        (Box::pin(sink), rx)
    }

    #[tokio::test]
    async fn write_pump_sends_close_on_cancel() {
        let (sink, mut sent) = capture_sink();
        let cancel = CancellationToken::new();

        let (_outbound_tx, outbound_rx) = mpsc::channel(16);
        let c = cancel.clone();
        let handle = tokio::spawn(async move {
            write_pump(sink, outbound_rx, c).await;
        });

        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("should stop")
            .expect("no panic");

        let close_msg = sent.recv().await;
        assert!(matches!(close_msg, Some(tungstenite::Message::Close(_))));
    }

    #[tokio::test]
    async fn write_pump_forwards_queued_messages() {
        let (sink, mut sent) = capture_sink();
        let cancel = CancellationToken::new();

        let (outbound_tx, outbound_rx) = mpsc::channel(16);
        let handle = tokio::spawn(write_pump(sink, outbound_rx, cancel));

        outbound_tx
            .send(tungstenite::Message::Pong(vec![1].into()))
            .await
            .unwrap();

        let msg = sent.recv().await;
        assert!(matches!(msg, Some(tungstenite::Message::Pong(_))));

        drop(outbound_tx);
        let _ = tokio::time::timeout(std::time::Duration::from_secs(2), handle).await;
    }
}
