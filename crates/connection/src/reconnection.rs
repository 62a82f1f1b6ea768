//! Connection lifecycle shared between the manager and the reconnect timer.
//!
//! The disconnect callback runs inside the read pump task, so everything
//! it touches lives in the clonable [`WsContext`] instead of behind
//! `&ConnectionManager`.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use airview_protocol::TelemetryFrame;

use crate::subscribers::Subscribers;
use crate::types::{ConnectionState, ReconnectConfig};
use crate::ws_client::WsClient;

/// Shared connection state.
#[derive(Clone)]
pub(crate) struct WsContext {
    /// Currently configured endpoint. The reconnect timer reads this at
    /// fire time, so a URL change while a retry is pending wins.
    pub(crate) url: Arc<std::sync::RwLock<String>>,
    pub(crate) ws_client: Arc<Mutex<Option<WsClient>>>,
    pub(crate) state: Arc<std::sync::RwLock<ConnectionState>>,
    pub(crate) status_subs: Subscribers<ConnectionState>,
    pub(crate) data_subs: Subscribers<TelemetryFrame>,
    /// Cancel token for the pending reconnect timer, if any. One slot:
    /// at most one timer is ever pending.
    pub(crate) reconnect_cancel: Arc<std::sync::Mutex<Option<CancellationToken>>>,
    /// Set while a close is user-initiated, so the disconnect callback
    /// won't schedule a reconnect.
    pub(crate) intentional_close: Arc<AtomicBool>,
    pub(crate) reconnect: ReconnectConfig,
}

impl WsContext {
    pub(crate) fn new(reconnect: ReconnectConfig) -> Self {
        Self {
            url: Arc::new(std::sync::RwLock::new(String::new())),
            ws_client: Arc::new(Mutex::new(None)),
            state: Arc::new(std::sync::RwLock::new(ConnectionState::Disconnected)),
            status_subs: Subscribers::new(),
            data_subs: Subscribers::new(),
            reconnect_cancel: Arc::new(std::sync::Mutex::new(None)),
            intentional_close: Arc::new(AtomicBool::new(false)),
            reconnect,
        }
    }
}

/// Updates the connection state and notifies status subscribers.
pub(crate) fn set_state(ctx: &WsContext, new_state: ConnectionState) {
    *ctx.state.write().unwrap() = new_state;
    ctx.status_subs.emit(&new_state);
}

/// Cancels the pending reconnect timer, if any.
pub(crate) fn cancel_pending_reconnect(
    reconnect_cancel: &std::sync::Mutex<Option<CancellationToken>>,
) {
    if let Ok(mut guard) = reconnect_cancel.lock()
        && let Some(token) = guard.take()
    {
        token.cancel();
    }
}

/// Schedules a reconnect after the configured delay. Single-flight: if a
/// timer is already pending this is a no-op. Returns whether a new timer
/// was scheduled.
pub(crate) fn schedule_reconnect(ctx: &WsContext) -> bool {
    let token = {
        let Ok(mut guard) = ctx.reconnect_cancel.lock() else {
            return false;
        };
        if guard.is_some() {
            return false;
        }
        let token = CancellationToken::new();
        *guard = Some(token.clone());
        token
    };

    let ctx = ctx.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("reconnect cancelled");
                return;
            }
            _ = tokio::time::sleep(ctx.reconnect.delay) => {}
        }

        // Release the slot before dialing so a failed attempt can
        // schedule the next timer.
        if let Ok(mut guard) = ctx.reconnect_cancel.lock() {
            *guard = None;
        }
        if token.is_cancelled() {
            return;
        }

        // Read the URL now, not at schedule time: a connect() issued
        // while the timer was pending retargets the retry.
        let url = ctx.url.read().unwrap().clone();
        info!(%url, "reconnecting");
        connect_inner(ctx.clone(), url).await;
    });
    true
}

/// Wires the data and disconnect callbacks onto a fresh client.
pub(crate) async fn setup_ws_callbacks(client: &WsClient, ctx: &WsContext) {
    let data_subs = ctx.data_subs.clone();
    client
        .set_frame_callback(Box::new(move |frame| {
            data_subs.emit(&frame);
        }))
        .await;

    let transport_error = client.transport_error();
    let ctx_dc = ctx.clone();
    client
        .set_disconnect_callback(Box::new(move || {
            if ctx_dc.intentional_close.load(Ordering::Relaxed) {
                set_state(&ctx_dc, ConnectionState::Disconnected);
                return;
            }

            // Drop the dead client so nothing holds the old socket.
            if let Ok(mut guard) = ctx_dc.ws_client.try_lock() {
                *guard = None;
            }

            if transport_error.load(Ordering::Relaxed) {
                set_state(&ctx_dc, ConnectionState::Error);
            }
            set_state(&ctx_dc, ConnectionState::Disconnected);
            schedule_reconnect(&ctx_dc);
        }))
        .await;
}

/// Tears down any live session and dials `url`.
///
/// Boxed future: the reconnect timer spawned from the disconnect callback
/// calls back into this function, which would otherwise make the future
/// type recursive.
pub(crate) fn connect_inner(
    ctx: WsContext,
    url: String,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        // Already connected or dialing the same endpoint: nothing to do.
        {
            let state = *ctx.state.read().unwrap();
            let same_url = *ctx.url.read().unwrap() == url;
            if same_url
                && matches!(
                    state,
                    ConnectionState::Connected | ConnectionState::Connecting
                )
            {
                return;
            }
        }

        // Tear down the previous session. The flag keeps its close event
        // from scheduling a reconnect against the old URL.
        ctx.intentional_close.store(true, Ordering::Relaxed);
        cancel_pending_reconnect(&ctx.reconnect_cancel);
        if let Some(client) = ctx.ws_client.lock().await.take() {
            client.clear_callbacks().await;
            client.close().await;
        }

        *ctx.url.write().unwrap() = url.clone();
        ctx.intentional_close.store(false, Ordering::Relaxed);
        set_state(&ctx, ConnectionState::Connecting);

        match WsClient::connect(&url).await {
            Ok(client) => {
                // A disconnect() issued while the dial was in flight wins.
                // The flag is checked under the client lock, which
                // disconnect() also takes: either it set the flag before
                // this check (the new session is dropped unseen), or it
                // blocks here until the session is installed and then
                // tears it down before returning.
                let mut guard = ctx.ws_client.lock().await;
                if ctx.intentional_close.load(Ordering::Relaxed) {
                    drop(guard);
                    client.close().await;
                    debug!(%url, "dial finished after disconnect, dropping session");
                    return;
                }
                setup_ws_callbacks(&client, &ctx).await;
                *guard = Some(client);
                set_state(&ctx, ConnectionState::Connected);
                info!(%url, "connected to telemetry source");
            }
            Err(e) => {
                if ctx.intentional_close.load(Ordering::Relaxed) {
                    debug!(%url, "dial failed after disconnect, staying down");
                    return;
                }
                warn!(%url, error = %e, "connection failed");
                set_state(&ctx, ConnectionState::Error);
                schedule_reconnect(&ctx);
            }
        }
    })
}
