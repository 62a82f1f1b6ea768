//! Display ranges for the analog gauges.
//!
//! Purely presentational: the core never validates or clamps readings
//! against these, it only hands them to whatever draws the dials.

/// Display range and unit for one analog metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricLimit {
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
    pub label: &'static str,
}

impl MetricLimit {
    /// Position of `value` within the display range, clamped to `0.0..=1.0`.
    pub fn fraction(&self, value: f64) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Gauge ranges per metric, in wire-field order.
pub const METRIC_LIMITS: &[(&str, MetricLimit)] = &[
    ("pressure", MetricLimit { min: 0.0, max: 15.0, unit: "bar", label: "Pressure" }),
    ("flow", MetricLimit { min: 0.0, max: 20.0, unit: "m³/min", label: "Flow" }),
    ("temperature", MetricLimit { min: 0.0, max: 120.0, unit: "°C", label: "Temperature" }),
    ("power", MetricLimit { min: 0.0, max: 100.0, unit: "kW", label: "Power" }),
    ("voltage", MetricLimit { min: 380.0, max: 420.0, unit: "V", label: "Voltage" }),
    ("current", MetricLimit { min: 0.0, max: 200.0, unit: "A", label: "Current" }),
];

/// Looks up the display limit for a wire field name.
pub fn limit_for(field: &str) -> Option<&'static MetricLimit> {
    METRIC_LIMITS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, limit)| limit)
}
