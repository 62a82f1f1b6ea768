use std::collections::VecDeque;

use airview_protocol::TelemetrySnapshot;

/// Bounded, insertion-ordered history of merged snapshots.
///
/// Strict FIFO: once full, each push evicts the oldest snapshot. Iteration
/// runs oldest → newest, which is the order the charts draw in.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    snapshots: VecDeque<TelemetrySnapshot>,
    capacity: usize,
}

impl HistoryBuffer {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be > 0");
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a snapshot, evicting the oldest when at capacity.
    pub fn push(&mut self, snapshot: TelemetrySnapshot) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// Iterates oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = &TelemetrySnapshot> {
        self.snapshots.iter()
    }

    /// The most recently appended snapshot, if any.
    pub fn latest(&self) -> Option<&TelemetrySnapshot> {
        self.snapshots.back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
