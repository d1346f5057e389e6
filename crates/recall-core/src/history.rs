#![forbid(unsafe_code)]

//! LIFO caretaker of snapshots.
//!
//! [`History<T>`] is a mutex-protected stack. Every method takes `&self`, so
//! a history can be shared across threads directly, though the supported
//! entry point is [`StateManager`](crate::StateManager), whose own lock
//! already serializes access.
//!
//! There is no depth limit and no eviction; the stack grows until the caller
//! clears it.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tracing::trace;

use crate::snapshot::Snapshot;

/// A LIFO stack of [`Snapshot<T>`].
///
/// # Invariants
///
/// 1. `push` and `pop` are each atomic with respect to concurrent callers.
/// 2. `pop` only returns snapshots previously pushed, in reverse push order.
/// 3. `clear` removes entries only; it never touches any originator.
pub struct History<T> {
    entries: Mutex<Vec<Snapshot<T>>>,
}

impl<T> History<T> {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty history with room for `capacity` entries.
    ///
    /// This is an allocation hint, not a limit.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Push a snapshot on top of the stack.
    pub fn push(&self, snapshot: Snapshot<T>) {
        let mut entries = self.lock();
        let bytes = snapshot.len();
        entries.push(snapshot);
        trace!(depth = entries.len(), bytes, "history push");
    }

    /// Remove and return the most recently pushed snapshot.
    ///
    /// Returns `None` when the history is empty.
    pub fn pop(&self) -> Option<Snapshot<T>> {
        let mut entries = self.lock();
        let snapshot = entries.pop();
        trace!(depth = entries.len(), hit = snapshot.is_some(), "history pop");
        snapshot
    }

    /// The most recently pushed snapshot, left in place.
    #[must_use]
    pub fn peek(&self) -> Option<Snapshot<T>> {
        self.lock().last().cloned()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut entries = self.lock();
        let dropped = entries.len();
        entries.clear();
        trace!(dropped, "history clear");
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the history holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Every critical section leaves the Vec consistent, so a poisoned lock
    // still guards valid data.
    fn lock(&self) -> MutexGuard<'_, Vec<Snapshot<T>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for History<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("depth", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn snap(v: i64) -> Snapshot<i64> {
        Snapshot::capture(&v).unwrap()
    }

    #[test]
    fn new_history_is_empty() {
        let history = History::<i64>::new();
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
        assert!(history.pop().is_none());
        assert!(history.peek().is_none());
    }

    #[test]
    fn pop_returns_reverse_push_order() {
        let history = History::new();
        for v in 1..=3 {
            history.push(snap(v));
        }
        assert_eq!(history.pop().unwrap().decode().unwrap(), 3);
        assert_eq!(history.pop().unwrap().decode().unwrap(), 2);
        assert_eq!(history.pop().unwrap().decode().unwrap(), 1);
        assert!(history.pop().is_none());
    }

    #[test]
    fn peek_does_not_remove() {
        let history = History::new();
        history.push(snap(7));
        assert_eq!(history.peek().unwrap().decode().unwrap(), 7);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn clear_removes_all() {
        let history = History::new();
        history.push(snap(1));
        history.push(snap(2));
        history.clear();
        assert!(history.is_empty());
        assert!(history.pop().is_none());
    }

    #[test]
    fn capacity_is_not_a_limit() {
        let history = History::with_capacity(2);
        for v in 0..10 {
            history.push(snap(v));
        }
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn concurrent_push_then_pop_loses_nothing() {
        let history = Arc::new(History::new());
        let threads = 8;
        let per_thread = 250;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let history = Arc::clone(&history);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..per_thread {
                        history.push(snap((t * per_thread + i) as i64));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(history.len(), threads * per_thread);

        let mut seen: Vec<i64> = std::iter::from_fn(|| history.pop())
            .map(|s| s.decode().unwrap())
            .collect();
        seen.sort_unstable();
        let expected: Vec<i64> = (0..(threads * per_thread) as i64).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn concurrent_pops_hand_out_each_entry_once() {
        let history = Arc::new(History::new());
        for v in 0..1000 {
            history.push(snap(v));
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let history = Arc::clone(&history);
                thread::spawn(move || {
                    let mut got = Vec::new();
                    while let Some(s) = history.pop() {
                        got.push(s.decode().unwrap());
                    }
                    got
                })
            })
            .collect();

        let mut all: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..1000).collect::<Vec<i64>>());
    }

    #[test]
    fn debug_reports_depth() {
        let history = History::new();
        history.push(snap(1));
        assert!(format!("{history:?}").contains("depth: 1"));
    }
}
