//! Shared telemetry types for the AirView compressor dashboard.
//!
//! Defines the partial wire frame, the merged snapshot, the compressor
//! status enum, and the display limits used by gauge rendering.

pub mod constants;
pub mod frame;
pub mod limits;

pub use frame::{CompressorStatus, TelemetryFrame, TelemetrySnapshot};
pub use limits::{METRIC_LIMITS, MetricLimit};
