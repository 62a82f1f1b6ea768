//! Headless kiosk runner.
//!
//! Wires the settings store, connection manager, and aggregator together
//! and logs once a second what a graphical dashboard would draw: clock,
//! connection state, gauge values, and data staleness. The rendering
//! layer proper is a separate consumer of the same outputs.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use airview_connection::ConnectionManager;
use airview_protocol::{TelemetrySnapshot, limits};
use airview_settings::{SettingsStore, default_settings_path};
use airview_telemetry::Aggregator;

#[derive(Parser)]
#[command(name = "airview-kiosk", version, about)]
struct Args {
    /// Telemetry endpoint URL. Overrides and persists the stored setting.
    #[arg(long)]
    url: Option<String>,

    /// Settings file path. Defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let settings_path = args
        .config
        .or_else(default_settings_path)
        .context("could not resolve a settings path")?;
    let settings = SettingsStore::new(settings_path)?;
    if let Some(url) = &args.url {
        settings.set_endpoint_url(url)?;
    }
    let url = settings.endpoint_url();

    let aggregator = Arc::new(Mutex::new(Aggregator::new()));
    let manager = ConnectionManager::new();

    let _status_sub = manager.subscribe_status(|state| {
        info!(?state, "connection state changed");
    });
    let agg = aggregator.clone();
    let _data_sub = manager.subscribe_data(move |frame| {
        let mut agg = agg.lock().unwrap();
        let snapshot = agg.observe(frame);
        debug!(timestamp = snapshot.timestamp, "frame merged");
    });

    info!(%url, "starting kiosk");
    manager.connect(&url).await;

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let (snapshot, stale, since) = {
                    let agg = aggregator.lock().unwrap();
                    (agg.current().clone(), agg.is_stale(), agg.since_last_received())
                };
                render_line(&manager, &snapshot, stale, since);
            }
        }
    }

    info!("shutting down");
    manager.disconnect().await;
    Ok(())
}

fn render_line(
    manager: &ConnectionManager,
    snapshot: &TelemetrySnapshot,
    stale: bool,
    since: Option<Duration>,
) {
    let clock = Local::now().format("%a %d.%m.%Y %H:%M:%S");
    let data_age = match since {
        None => "no data received yet".to_string(),
        Some(d) if stale => format!("last data {:.0} s ago (STALE)", d.as_secs_f64()),
        Some(_) => "live".to_string(),
    };

    info!(
        state = ?manager.state(),
        "{clock} | {} | {data_age}",
        gauge_summary(snapshot),
    );
}

/// One-line gauge readout driven by the display limits table. Absent
/// fields render as a dash, never as a fabricated value.
fn gauge_summary(snap: &TelemetrySnapshot) -> String {
    let status = snap
        .status
        .map(|s| format!("{s:?}").to_uppercase())
        .unwrap_or_else(|| "—".to_string());

    let readings = [
        ("pressure", snap.pressure),
        ("flow", snap.flow),
        ("temperature", snap.temperature),
        ("power", snap.power),
        ("voltage", snap.voltage),
        ("current", snap.current),
    ];

    let mut parts = vec![status];
    for (field, value) in readings {
        let Some(limit) = limits::limit_for(field) else {
            continue;
        };
        parts.push(match value {
            Some(v) => format!("{} {v:.1} {}", limit.label, limit.unit),
            None => format!("{} —", limit.label),
        });
    }
    parts.push(match snap.total_hours {
        Some(h) => format!("Hours {h:.1} h"),
        None => "Hours —".to_string(),
    });

    parts.join(" | ")
}
