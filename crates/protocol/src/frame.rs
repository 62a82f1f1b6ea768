//! Telemetry frame and snapshot types.
//!
//! The compressor PLC publishes whatever subset of fields it has on hand,
//! so every wire field is optional. [`TelemetrySnapshot::merged`] folds a
//! partial frame into the last known state without blanking the fields the
//! frame left out.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Operating status reported by the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompressorStatus {
    Running,
    Stopped,
    Alarm,
    Idle,
}

/// A partial telemetry update as received on the wire.
///
/// Any subset of fields may be present; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryFrame {
    /// Source timestamp in epoch milliseconds. Filled in at receipt time
    /// by the transport when the source omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Discharge pressure [bar].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    /// Air flow [m³/min].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<f64>,
    /// Oil/air temperature [°C].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Electrical power draw [kW].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    /// Supply voltage [V].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    /// Motor current [A].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CompressorStatus>,
    /// Cumulative runtime counter [h].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_hours: Option<f64>,
}

impl TelemetryFrame {
    /// Ensures the frame carries a timestamp, synthesizing the current
    /// wall-clock time when the source omitted it.
    pub fn with_timestamp(mut self) -> Self {
        if self.timestamp.is_none() {
            self.timestamp = Some(now_ms());
        }
        self
    }
}

/// The latest known state of the compressor.
///
/// `timestamp` is refreshed on every merge so consumers can detect
/// staleness; every other field keeps its last received value until a
/// frame overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CompressorStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_hours: Option<f64>,
}

impl TelemetrySnapshot {
    /// An all-absent snapshot stamped with the current wall-clock time.
    pub fn empty() -> Self {
        Self {
            timestamp: now_ms(),
            pressure: None,
            flow: None,
            temperature: None,
            power: None,
            voltage: None,
            current: None,
            status: None,
            total_hours: None,
        }
    }

    /// Folds a partial frame into this snapshot.
    ///
    /// Fields present in `frame` overwrite; fields absent carry over.
    /// The timestamp is never carried over: it takes the frame's value
    /// or the current wall-clock time.
    pub fn merged(&self, frame: &TelemetryFrame) -> Self {
        Self {
            timestamp: frame.timestamp.unwrap_or_else(now_ms),
            pressure: frame.pressure.or(self.pressure),
            flow: frame.flow.or(self.flow),
            temperature: frame.temperature.or(self.temperature),
            power: frame.power.or(self.power),
            voltage: frame.voltage.or(self.voltage),
            current: frame.current.or(self.current),
            status: frame.status.or(self.status),
            total_hours: frame.total_hours.or(self.total_hours),
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_deserializes_partial_json() {
        let frame: TelemetryFrame = serde_json::from_str(r#"{"pressure": 7.2}"#).unwrap();
        assert_eq!(frame.pressure, Some(7.2));
        assert_eq!(frame.temperature, None);
        assert_eq!(frame.timestamp, None);
        assert_eq!(frame.status, None);
    }

    #[test]
    fn frame_deserializes_full_json() {
        let json = r#"{
            "timestamp": 1700000000000,
            "pressure": 7.2,
            "flow": 12.5,
            "temperature": 85.0,
            "power": 55.0,
            "voltage": 400.0,
            "current": 98.0,
            "status": "RUNNING",
            "totalHours": 12345.5
        }"#;
        let frame: TelemetryFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.timestamp, Some(1_700_000_000_000));
        assert_eq!(frame.status, Some(CompressorStatus::Running));
        assert_eq!(frame.total_hours, Some(12345.5));
    }

    #[test]
    fn frame_rejects_unknown_status() {
        let result = serde_json::from_str::<TelemetryFrame>(r#"{"status": "EXPLODING"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn status_roundtrips_as_uppercase() {
        for (status, text) in [
            (CompressorStatus::Running, "\"RUNNING\""),
            (CompressorStatus::Stopped, "\"STOPPED\""),
            (CompressorStatus::Alarm, "\"ALARM\""),
            (CompressorStatus::Idle, "\"IDLE\""),
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), text);
            assert_eq!(
                serde_json::from_str::<CompressorStatus>(text).unwrap(),
                status
            );
        }
    }

    #[test]
    fn with_timestamp_fills_missing() {
        let frame = TelemetryFrame::default().with_timestamp();
        assert!(frame.timestamp.is_some());
    }

    #[test]
    fn with_timestamp_keeps_existing() {
        let frame = TelemetryFrame {
            timestamp: Some(42),
            ..Default::default()
        };
        assert_eq!(frame.with_timestamp().timestamp, Some(42));
    }

    #[test]
    fn merged_overwrites_present_fields_only() {
        let prev = TelemetrySnapshot {
            pressure: Some(6.0),
            temperature: Some(80.0),
            status: Some(CompressorStatus::Running),
            ..TelemetrySnapshot::empty()
        };
        let frame = TelemetryFrame {
            timestamp: Some(1000),
            pressure: Some(7.2),
            ..Default::default()
        };

        let merged = prev.merged(&frame);

        assert_eq!(merged.timestamp, 1000);
        assert_eq!(merged.pressure, Some(7.2));
        assert_eq!(merged.temperature, Some(80.0));
        assert_eq!(merged.status, Some(CompressorStatus::Running));
        assert_eq!(merged.flow, None);
    }

    #[test]
    fn merged_refreshes_timestamp_when_frame_omits_it() {
        let prev = TelemetrySnapshot {
            timestamp: 1,
            ..TelemetrySnapshot::empty()
        };
        let merged = prev.merged(&TelemetryFrame::default());
        assert!(merged.timestamp > 1);
    }

    #[test]
    fn empty_snapshot_has_no_measurements() {
        let snap = TelemetrySnapshot::empty();
        assert!(snap.pressure.is_none());
        assert!(snap.status.is_none());
        assert!(snap.total_hours.is_none());
        assert!(snap.timestamp > 0);
    }
}
