use std::time::{Duration, Instant};

use airview_protocol::constants::{HISTORY_CAPACITY, STALE_THRESHOLD};
use airview_protocol::{TelemetryFrame, TelemetrySnapshot};

use crate::history::HistoryBuffer;

/// Turns a stream of partial telemetry frames into a current snapshot and
/// a bounded, arrival-ordered history.
///
/// The PLC publishes different field subsets at different rates (digital
/// status far less often than the analog readings), so each frame is
/// merged field-by-field into the previous snapshot instead of replacing
/// it. Presentation reads [`current`](Self::current) and
/// [`history`](Self::history); only [`observe`](Self::observe) mutates.
#[derive(Debug, Clone)]
pub struct Aggregator {
    current: TelemetrySnapshot,
    history: HistoryBuffer,
    last_received: Option<Instant>,
}

impl Aggregator {
    /// Creates an aggregator with the standard 50-snapshot history.
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            current: TelemetrySnapshot::empty(),
            history: HistoryBuffer::new(capacity),
            last_received: None,
        }
    }

    /// Merges a partial frame into the current snapshot and appends the
    /// result to the history. Returns the new current snapshot.
    pub fn observe(&mut self, frame: &TelemetryFrame) -> &TelemetrySnapshot {
        self.current = self.current.merged(frame);
        self.history.push(self.current.clone());
        self.last_received = Some(Instant::now());
        &self.current
    }

    /// The latest merged snapshot.
    pub fn current(&self) -> &TelemetrySnapshot {
        &self.current
    }

    /// The rolling history, oldest → newest.
    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// When the last frame was observed, if any.
    pub fn last_received(&self) -> Option<Instant> {
        self.last_received
    }

    /// Time since the last observed frame.
    pub fn since_last_received(&self) -> Option<Duration> {
        self.last_received.map(|t| t.elapsed())
    }

    /// Whether no frame has arrived within the stale threshold.
    /// An aggregator that never saw a frame is not stale, it is empty —
    /// presentation distinguishes "no data yet" from "data stopped".
    pub fn is_stale(&self) -> bool {
        self.last_received
            .is_some_and(|t| t.elapsed() > STALE_THRESHOLD)
    }

    /// Clears the history and reinitializes the current snapshot to the
    /// all-absent state. Used on an explicit session restart.
    pub fn reset(&mut self) {
        self.current = TelemetrySnapshot::empty();
        self.history.clear();
        self.last_received = None;
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}
