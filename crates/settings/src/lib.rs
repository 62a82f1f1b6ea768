//! Persisted kiosk settings.
//!
//! A single JSON file in the platform config directory holds the
//! user-configured telemetry endpoint. Settings are cached in memory and
//! rewritten on every change so they survive kiosk restarts.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use airview_protocol::constants::DEFAULT_ENDPOINT;

/// Errors from settings persistence.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    endpoint_url: Option<String>,
}

/// Durable store for kiosk settings.
pub struct SettingsStore {
    path: PathBuf,
    settings: RwLock<Settings>,
}

impl SettingsStore {
    /// Opens the store, loading existing settings from disk. A missing
    /// file means defaults.
    pub fn new(path: PathBuf) -> Result<Self, SettingsError> {
        let settings = load_settings(&path)?;
        Ok(Self {
            path,
            settings: RwLock::new(settings),
        })
    }

    /// The configured endpoint URL, falling back to the default.
    pub fn endpoint_url(&self) -> String {
        self.settings
            .read()
            .unwrap()
            .endpoint_url
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Stores a new endpoint URL and persists it.
    pub fn set_endpoint_url(&self, url: &str) -> Result<(), SettingsError> {
        {
            let mut settings = self.settings.write().unwrap();
            settings.endpoint_url = Some(url.to_string());
        }
        self.persist()
    }

    fn persist(&self) -> Result<(), SettingsError> {
        let settings = self.settings.read().unwrap();
        let json = serde_json::to_string_pretty(&*settings)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        debug!("persisted settings to {:?}", self.path);
        Ok(())
    }
}

fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let data = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&data)?;
    debug!("loaded settings from {:?}", path);
    Ok(settings)
}

/// Returns the default settings file path.
pub fn default_settings_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("airview").join("settings.json"))
}

/// Returns the platform-specific config directory.
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config"))
    }
}
