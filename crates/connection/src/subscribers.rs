//! Publish/subscribe registry with unsubscribe handles.
//!
//! Status and data listeners are plain callbacks kept in insertion order.
//! A panicking listener is logged and skipped so it cannot suppress
//! delivery to the listeners registered after it.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Ordered list of subscribers for one event kind.
pub struct Subscribers<T> {
    entries: Arc<Mutex<Vec<(u64, Callback<T>)>>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for Subscribers<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

impl<T: 'static> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

// 'static because the unsubscribe closure owns a handle to the entry
// list, which stores callbacks over `T`.
impl<T: 'static> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registers a callback. The returned handle unregisters it; dropping
    /// the handle leaves the subscription alive.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .unwrap()
            .push((id, Arc::new(callback)));

        let entries = self.entries.clone();
        Subscription {
            cancel: Box::new(move || {
                entries.lock().unwrap().retain(|(eid, _)| *eid != id);
            }),
        }
    }

    /// Delivers `value` to every subscriber in insertion order.
    ///
    /// The list is snapshotted before delivery, so a callback may
    /// subscribe or unsubscribe without deadlocking.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();

        for cb in snapshot {
            if std::panic::catch_unwind(AssertUnwindSafe(|| cb(value))).is_err() {
                warn!("subscriber panicked, continuing with remaining subscribers");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`Subscribers::subscribe`].
#[must_use = "call unsubscribe() to unregister; dropping the handle keeps the subscription alive"]
pub struct Subscription {
    cancel: Box<dyn FnOnce() + Send>,
}

impl Subscription {
    /// Unregisters the callback. Later events will not reach it.
    pub fn unsubscribe(self) {
        (self.cancel)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_insertion_order() {
        let subs: Subscribers<i32> = Subscribers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            let _ = subs.subscribe(move |v: &i32| {
                seen.lock().unwrap().push(format!("{tag}{v}"));
            });
        }

        subs.emit(&1);

        assert_eq!(*seen.lock().unwrap(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let subs: Subscribers<i32> = Subscribers::new();
        let count = Arc::new(AtomicU64::new(0));

        let c = count.clone();
        let sub = subs.subscribe(move |_| {
            c.fetch_add(1, Ordering::Relaxed);
        });

        subs.emit(&1);
        sub.unsubscribe();
        subs.emit(&2);

        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert!(subs.is_empty());
    }

    #[test]
    fn unsubscribe_leaves_other_subscribers() {
        let subs: Subscribers<i32> = Subscribers::new();
        let count = Arc::new(AtomicU64::new(0));

        let first = subs.subscribe(|_| {});
        let c = count.clone();
        let _second = subs.subscribe(move |_| {
            c.fetch_add(1, Ordering::Relaxed);
        });

        first.unsubscribe();
        subs.emit(&1);

        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn panicking_subscriber_does_not_suppress_later_ones() {
        let subs: Subscribers<i32> = Subscribers::new();
        let reached = Arc::new(AtomicU64::new(0));

        let _bad = subs.subscribe(|_| panic!("listener bug"));
        let r = reached.clone();
        let _good = subs.subscribe(move |_| {
            r.fetch_add(1, Ordering::Relaxed);
        });

        subs.emit(&1);

        assert_eq!(reached.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn callback_may_unsubscribe_another_during_emit() {
        let subs: Subscribers<i32> = Subscribers::new();
        let victim = Arc::new(Mutex::new(None));

        let v = victim.clone();
        let _first = subs.subscribe(move |_: &i32| {
            if let Some(sub) = v.lock().unwrap().take() {
                let sub: Subscription = sub;
                sub.unsubscribe();
            }
        });
        let count = Arc::new(AtomicU64::new(0));
        let c = count.clone();
        let second = subs.subscribe(move |_| {
            c.fetch_add(1, Ordering::Relaxed);
        });
        *victim.lock().unwrap() = Some(second);

        // The snapshot was taken before delivery, so the victim still
        // receives this event but none afterwards.
        subs.emit(&1);
        subs.emit(&2);

        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert_eq!(subs.len(), 1);
    }
}
