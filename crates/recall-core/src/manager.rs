#![forbid(unsafe_code)]

//! Atomic save/update/undo over an originator and its history.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── StateManager<T> ────────────────────────────┐
//! │  Mutex ┌──────────────┐  snapshot()  ┌──────────────┐                   │
//! │ ──────►│ Originator<T>│ ───────────► │  History<T>  │  push / pop       │
//! │        │  state, ver  │ ◄─────────── │  [s0 s1 s2]  │                   │
//! │        └──────┬───────┘  restore()   └──────────────┘                   │
//! │               │ PropertyChange, StateChange                             │
//! │               ▼                                                         │
//! │        forwarding subscriptions ──► outbox (AfterUnlock)                │
//! │                                 └─► manager notifiers (UnderLock)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation runs inside one critical section: `get_state`, `save`,
//! `update`, `update_with`, `undo`, and `clear_history` are totally ordered
//! with respect to each other across all threads. In particular the
//! save-then-set of [`update`](StateManager::update) never interleaves with
//! another operation, so an undo always restores the value that existed
//! immediately before the matching update.
//!
//! # Notifications
//!
//! At construction the manager subscribes once to its originator and
//! re-publishes both event kinds to its own subscribers. When they are
//! delivered depends on [`NotifyPolicy`]:
//!
//! - `AfterUnlock` (default): events are queued during the critical section
//!   and delivered after the lock is released. Callbacks may call back into
//!   the manager. Two threads finishing at the same time may deliver in
//!   either order; [`StateChange::version`] disambiguates.
//! - `UnderLock`: events are delivered inside the critical section, in
//!   application order. A callback that calls back into the manager
//!   deadlocks.
//!
//! Callbacks must not panic. A panic inside the critical section poisons the
//! lock; the manager recovers the guard on the next call. An
//! [`update_with`](StateManager::update_with) closure that panics leaves
//! state and history untouched. A callback that panics under `UnderLock`
//! runs after its change was committed, so the change stands. Events the
//! panicking operation had already queued are delivered by the next
//! `save`, `update`, `update_with`, or `undo`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, debug_span, warn};
use web_time::Instant;

use crate::config::{ManagerConfig, NotifyPolicy};
use crate::error::{Result, StateError};
use crate::history::History;
use crate::notify::{Notifier, PropertyChange, StateChange, Subscription};
use crate::originator::Originator;
use crate::snapshot::Snapshot;

/// An event raised inside the critical section, waiting for delivery.
enum Pending<T> {
    Property(PropertyChange),
    State(StateChange<T>),
}

type Outbox<T> = Arc<Mutex<Vec<Pending<T>>>>;

/// Facade serializing save/update/undo over one [`Originator`] and one [`History`].
///
/// # Invariants
///
/// 1. Operations are linearizable: their internal read-modify-write steps
///    never interleave.
/// 2. History depth grows by one per `save` and per `update` with
///    `save_previous`, and shrinks by one per successful `undo`.
/// 3. `undo` on an empty history returns `Ok(false)` and fires nothing.
/// 4. Subscribers receive each accepted change exactly once.
pub struct StateManager<T> {
    originator: Mutex<Originator<T>>,
    history: History<T>,
    config: ManagerConfig,
    outbox: Outbox<T>,
    on_property_changed: Arc<Notifier<PropertyChange>>,
    on_state_changed: Arc<Notifier<StateChange<T>>>,
    _forwarding: [Subscription; 2],
}

impl<T> StateManager<T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Send + 'static,
{
    /// Track `initial` with the default configuration.
    ///
    /// # Errors
    ///
    /// [`StateError::Construction`] if `initial` cannot be captured.
    pub fn new(initial: T) -> Result<Self> {
        Self::with_config(initial, ManagerConfig::default())
    }

    /// Track `initial` with an explicit configuration.
    ///
    /// # Errors
    ///
    /// [`StateError::Construction`] if `initial` cannot be captured.
    pub fn with_config(initial: T, config: ManagerConfig) -> Result<Self> {
        let history = History::with_capacity(config.history_capacity);
        Self::from_parts(Originator::new(initial), history, config)
    }

    /// Wrap an existing originator and history.
    ///
    /// The manager takes exclusive ownership of both. Subscriptions already
    /// registered on the originator keep firing, under the same policy as
    /// the originator itself: synchronously, inside the critical section.
    ///
    /// # Errors
    ///
    /// [`StateError::Construction`] if the originator's current value cannot
    /// be captured. Nothing is built in that case.
    pub fn from_parts(
        originator: Originator<T>,
        history: History<T>,
        config: ManagerConfig,
    ) -> Result<Self> {
        if let Err(err) = Snapshot::capture(originator.state()) {
            return Err(match err {
                StateError::Encode(e) => StateError::Construction(e),
                other => other,
            });
        }

        let outbox: Outbox<T> = Arc::new(Mutex::new(Vec::new()));
        let on_property_changed = Arc::new(Notifier::new());
        let on_state_changed = Arc::new(Notifier::new());

        let _forwarding = match config.notify {
            NotifyPolicy::UnderLock => {
                let props = Arc::clone(&on_property_changed);
                let states = Arc::clone(&on_state_changed);
                [
                    originator.subscribe_property(move |change| {
                        props.notify(change);
                    }),
                    originator.subscribe(move |change| {
                        states.notify(change);
                    }),
                ]
            }
            NotifyPolicy::AfterUnlock => {
                let props = Arc::clone(&outbox);
                let states = Arc::clone(&outbox);
                [
                    originator.subscribe_property(move |change| {
                        lock_recover(&props).push(Pending::Property(*change));
                    }),
                    originator.subscribe(move |change| {
                        lock_recover(&states).push(Pending::State(change.clone()));
                    }),
                ]
            }
        };

        debug!(
            label = %config.label,
            notify = ?config.notify,
            depth = history.len(),
            "state manager created"
        );

        Ok(Self {
            originator: Mutex::new(originator),
            history,
            config,
            outbox,
            on_property_changed,
            on_state_changed,
            _forwarding,
        })
    }

    // ====================================================================
    // Operations
    // ====================================================================

    /// A copy of the current value, read under the lock.
    #[must_use]
    pub fn get_state(&self) -> T {
        self.lock().state().clone()
    }

    /// Borrow the current value under the lock without cloning.
    ///
    /// `f` runs inside the critical section and must not call back into
    /// this manager.
    pub fn with_state<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(self.lock().state())
    }

    /// Push a snapshot of the current value onto the history.
    ///
    /// # Errors
    ///
    /// [`StateError::Encode`] if the value cannot be captured; the history
    /// is unchanged.
    pub fn save(&self) -> Result<()> {
        self.run("save", |originator, history| {
            history.push(originator.snapshot()?);
            Ok(())
        })
    }

    /// Replace the current value, first saving it when `save_previous` is set.
    ///
    /// The save and the replacement form one atomic step. With
    /// `save_previous` the history grows even when `value` equals the
    /// current value (no notification fires in that case).
    ///
    /// # Errors
    ///
    /// [`StateError::Encode`] if the previous value cannot be captured;
    /// neither the history nor the state changes.
    pub fn update(&self, value: T, save_previous: bool) -> Result<()> {
        self.run("update", |originator, history| {
            if save_previous {
                history.push(originator.snapshot()?);
            }
            originator.set_state(value);
            Ok(())
        })
    }

    /// Mutate the current value in place, first saving it when
    /// `save_previous` is set.
    ///
    /// Returns `Ok(true)` if the value changed. `f` runs inside the critical
    /// section and must not call back into this manager.
    ///
    /// # Errors
    ///
    /// [`StateError::Encode`] if the previous value cannot be captured; `f`
    /// is not called.
    ///
    /// # Panics
    ///
    /// A panic in `f` propagates. Neither the state nor the history changes
    /// and nothing fires.
    pub fn update_with(&self, f: impl FnOnce(&mut T), save_previous: bool) -> Result<bool> {
        self.run("update_with", |originator, history| {
            let previous = if save_previous {
                Some(originator.snapshot()?)
            } else {
                None
            };
            let changed = originator.modify(f);
            if let Some(snapshot) = previous {
                history.push(snapshot);
            }
            Ok(changed)
        })
    }

    /// Restore the most recently saved value.
    ///
    /// Returns `Ok(true)` if a snapshot was popped and restored, `Ok(false)`
    /// if the history was empty (state untouched, nothing fires).
    ///
    /// # Errors
    ///
    /// [`StateError::Decode`] if the popped snapshot is corrupt. It is pushed
    /// back, so the history depth is unchanged, and the state is untouched.
    pub fn undo(&self) -> Result<bool> {
        self.run("undo", |originator, history| {
            let Some(snapshot) = history.pop() else {
                return Ok(false);
            };
            if let Err(err) = originator.restore(&snapshot) {
                history.push(snapshot);
                return Err(err);
            }
            Ok(true)
        })
    }

    /// Drop every saved snapshot. The current value is unaffected.
    pub fn clear_history(&self) {
        let _span = debug_span!("recall.manager", op = "clear_history", label = %self.config.label)
            .entered();
        let _guard = self.lock();
        self.history.clear();
    }

    // ====================================================================
    // Query
    // ====================================================================

    /// Number of saved snapshots.
    #[must_use]
    pub fn history_len(&self) -> usize {
        let _guard = self.lock();
        self.history.len()
    }

    /// Whether [`undo`](Self::undo) would restore something.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        let _guard = self.lock();
        !self.history.is_empty()
    }

    /// Number of accepted changes since the originator was created.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.lock().version()
    }

    /// The configuration this manager was built with.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // ====================================================================
    // Subscriptions
    // ====================================================================

    /// Subscribe to accepted value changes (direct update, in-place update,
    /// or undo-triggered restore).
    pub fn subscribe(
        &self,
        callback: impl Fn(&StateChange<T>) + Send + Sync + 'static,
    ) -> Subscription {
        self.on_state_changed.subscribe(callback)
    }

    /// Subscribe to property-changed notifications for generic change tracking.
    pub fn subscribe_property(
        &self,
        callback: impl Fn(&PropertyChange) + Send + Sync + 'static,
    ) -> Subscription {
        self.on_property_changed.subscribe(callback)
    }

    // ====================================================================
    // Internals
    // ====================================================================

    fn lock(&self) -> MutexGuard<'_, Originator<T>> {
        lock_recover(&self.originator)
    }

    /// Run `f` inside the critical section, then deliver what it raised.
    fn run<R>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Originator<T>, &History<T>) -> Result<R>,
    ) -> Result<R> {
        let _span = debug_span!("recall.manager", op, label = %self.config.label).entered();

        let (result, pending) = {
            let mut originator = self.lock();
            let result = f(&mut originator, &self.history);
            // Drained before unlocking: each operation takes exactly its own events.
            let pending = std::mem::take(&mut *lock_recover(&self.outbox));
            (result, pending)
        };

        if let Err(err) = &result {
            warn!(kind = err.kind(), error = %err, "state operation failed");
        }
        self.deliver(pending);
        result
    }

    fn deliver(&self, pending: Vec<Pending<T>>) {
        if pending.is_empty() {
            return;
        }
        let start = Instant::now();
        let mut delivered = 0;
        for event in &pending {
            delivered += match event {
                Pending::Property(change) => self.on_property_changed.notify(change),
                Pending::State(change) => self.on_state_changed.notify(change),
            };
        }
        debug!(
            events = pending.len(),
            delivered,
            duration_us = start.elapsed().as_micros() as u64,
            "notifications delivered"
        );
    }
}

impl<T: fmt::Debug> fmt::Debug for StateManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("StateManager");
        s.field("label", &self.config.label)
            .field("notify", &self.config.notify);
        // try_lock: Debug may run from an UnderLock callback on this thread.
        match self.originator.try_lock() {
            Ok(originator) => s.field("state", originator.state()),
            Err(TryLockError::Poisoned(poisoned)) => {
                s.field("state", poisoned.get_ref().state())
            }
            Err(TryLockError::WouldBlock) => s.field("state", &"<locked>"),
        };
        s.field("history_depth", &self.history.len()).finish()
    }
}

// Critical sections leave their data consistent before any callback runs,
// so a poisoned guard still protects valid data.
fn lock_recover<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
