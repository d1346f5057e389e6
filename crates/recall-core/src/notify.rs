#![forbid(unsafe_code)]

//! Thread-safe change notification with RAII subscriptions.
//!
//! # Design
//!
//! [`Notifier<E>`] keeps its subscribers as `Weak` references to
//! `Arc<dyn Fn(&E)>` callbacks. [`subscribe`](Notifier::subscribe) hands the
//! strong `Arc` back inside a [`Subscription`] guard; dropping the guard is
//! the only way to unsubscribe. Dead entries are pruned lazily on the next
//! [`notify`](Notifier::notify).
//!
//! The subscriber list has its own small lock, held only while the list is
//! read or edited. Callbacks run after that lock is released, so a callback
//! may subscribe new listeners or drop its own guard without deadlocking.
//!
//! # Failure Modes
//!
//! - **Panicking callback**: the panic propagates to whoever called
//!   `notify`; callbacks registered after it are skipped for that event.
//! - **Subscriber leak**: guards stored forever keep their callbacks alive.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

type CallbackArc<E> = Arc<dyn Fn(&E) + Send + Sync>;
type CallbackWeak<E> = Weak<dyn Fn(&E) + Send + Sync>;

/// Property name carried by every [`PropertyChange`] the crate emits.
pub const STATE_PROPERTY: &str = "state";

/// Payload of a state-changed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange<T> {
    /// Originator version after the change. Strictly increasing per
    /// originator, so subscribers can order or discard late deliveries.
    pub version: u64,
    /// The newly accepted value.
    pub value: T,
}

/// Payload of a generic property-changed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyChange {
    /// Name of the property that changed.
    pub name: &'static str,
    /// Originator version after the change.
    pub version: u64,
}

/// An ordered list of subscribers for events of type `E`.
///
/// # Invariants
///
/// 1. Live subscribers are called in registration order.
/// 2. A callback whose [`Subscription`] was dropped before `notify` starts
///    is never called by that `notify`.
pub struct Notifier<E> {
    subscribers: Mutex<Vec<CallbackWeak<E>>>,
}

impl<E> Notifier<E> {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register `callback`. It stays registered while the returned guard lives.
    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> Subscription
    where
        E: 'static,
    {
        let strong: CallbackArc<E> = Arc::new(callback);
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::downgrade(&strong));
        // `Arc<dyn Fn(&E)>` cannot coerce to `dyn Any` directly, so box the
        // Arc itself to erase the event type.
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Deliver `event` to every live subscriber and prune dead ones.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&self, event: &E) -> usize {
        // Collect first so the list lock is not held during callbacks.
        let callbacks: Vec<CallbackArc<E>> = {
            let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(|w| w.upgrade()).collect()
        };
        for cb in &callbacks {
            cb(event);
        }
        callbacks.len()
    }

    /// Number of registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping it releases the only strong reference to the callback, so the
/// notifier's `Weak` entry stops upgrading.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn std::any::Any + Send + Sync>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
