#![forbid(unsafe_code)]

//! The single owner of a live, mutable state value.
//!
//! An [`Originator<T>`] holds exactly one `T`, produces [`Snapshot`]s of it,
//! and accepts snapshots back through [`restore`](Originator::restore).
//! Every accepted change bumps a version counter and fires two
//! notifications, in this order:
//!
//! 1. [`PropertyChange`] naming [`STATE_PROPERTY`]
//! 2. [`StateChange`] carrying the new value
//!
//! Setting a value equal to the current one (by `PartialEq`) is a no-op:
//! no version bump, no notification.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::notify::{Notifier, PropertyChange, STATE_PROPERTY, StateChange, Subscription};
use crate::snapshot::Snapshot;

/// Live state plus its change notifiers.
///
/// # Invariants
///
/// 1. `state()` reflects the latest value accepted by `set_state`,
///    `modify`, or `restore`.
/// 2. `version()` increments by exactly 1 per accepted change.
/// 3. Notifications fire synchronously on the caller's thread.
pub struct Originator<T> {
    state: T,
    version: u64,
    on_property_changed: Notifier<PropertyChange>,
    on_state_changed: Notifier<StateChange<T>>,
}

impl<T: fmt::Debug> fmt::Debug for Originator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Originator")
            .field("state", &self.state)
            .field("version", &self.version)
            .field(
                "subscriber_count",
                &(self.on_state_changed.subscriber_count()
                    + self.on_property_changed.subscriber_count()),
            )
            .finish()
    }
}

impl<T> Originator<T> {
    /// The current value.
    #[must_use]
    pub fn state(&self) -> &T {
        &self.state
    }

    /// Number of accepted changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T: Clone + PartialEq + 'static> Originator<T> {
    /// Create an originator around `state`. The initial version is 0.
    #[must_use]
    pub fn new(state: T) -> Self {
        Self {
            state,
            version: 0,
            on_property_changed: Notifier::new(),
            on_state_changed: Notifier::new(),
        }
    }

    /// Replace the current value.
    ///
    /// Returns `true` if the value differed and subscribers were notified.
    pub fn set_state(&mut self, value: T) -> bool {
        if self.state == value {
            return false;
        }
        self.state = value;
        self.accept_change();
        true
    }

    /// Mutate a copy of the current value, then commit it like
    /// [`set_state`](Self::set_state).
    ///
    /// An unchanged result produces no notification. If `f` panics the
    /// current value is untouched.
    pub fn modify(&mut self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.state.clone();
        f(&mut next);
        self.set_state(next)
    }

    /// Subscribe to [`StateChange`] events.
    pub fn subscribe(
        &self,
        callback: impl Fn(&StateChange<T>) + Send + Sync + 'static,
    ) -> Subscription {
        self.on_state_changed.subscribe(callback)
    }

    /// Subscribe to [`PropertyChange`] events.
    pub fn subscribe_property(
        &self,
        callback: impl Fn(&PropertyChange) + Send + Sync + 'static,
    ) -> Subscription {
        self.on_property_changed.subscribe(callback)
    }

    fn accept_change(&mut self) {
        self.version += 1;
        self.on_property_changed.notify(&PropertyChange {
            name: STATE_PROPERTY,
            version: self.version,
        });
        self.on_state_changed.notify(&StateChange {
            version: self.version,
            value: self.state.clone(),
        });
    }
}

impl<T: Serialize + DeserializeOwned + Clone + PartialEq + 'static> Originator<T> {
    /// Capture the current value.
    ///
    /// # Errors
    ///
    /// [`StateError::Encode`](crate::StateError::Encode) if `T` cannot be serialized.
    pub fn snapshot(&self) -> Result<Snapshot<T>> {
        Snapshot::capture(&self.state)
    }

    /// Replace the current value with the one decoded from `snapshot`.
    ///
    /// Goes through the same path as [`set_state`](Self::set_state): returns
    /// `Ok(false)` without notifying if the decoded value equals the current one.
    ///
    /// # Errors
    ///
    /// [`StateError::Decode`](crate::StateError::Decode) if the payload is
    /// corrupt. The current value is left untouched.
    pub fn restore(&mut self, snapshot: &Snapshot<T>) -> Result<bool> {
        let value = snapshot.decode()?;
        Ok(self.set_state(value))
    }
}
