#![forbid(unsafe_code)]

//! Immutable, deep-copied captures of a state value.
//!
//! A [`Snapshot<T>`] never aliases the live value it was taken from. Capture
//! serializes the value with `serde_json` into a shared, read-only byte
//! buffer; [`decode`](Snapshot::decode) parses a fresh `T` out of it. Mutating
//! the original after capture cannot reach the snapshot, whatever shape `T`
//! has (plain values, `Vec`s, `Rc`-free graphs of owned data).
//!
//! # Memory Model
//!
//! The payload lives in an `Arc<[u8]>`. Cloning a snapshot clones the `Arc`,
//! not the bytes, so the same snapshot can sit in a history and in a
//! bookmark table at the cost of a single encoding.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, StateError};

/// An encoded capture of a `T` at one instant.
///
/// # Invariants
///
/// 1. The payload is never mutated after construction.
/// 2. `decode()` is a pure function of the payload.
/// 3. For a snapshot produced by [`capture`](Self::capture), `decode()`
///    yields a value equal to the captured one.
pub struct Snapshot<T> {
    payload: Arc<[u8]>,
    // `fn() -> T` keeps the snapshot Send + Sync no matter what T is:
    // it only ever hands out freshly decoded values.
    _marker: PhantomData<fn() -> T>,
}

impl<T> Snapshot<T> {
    /// Wrap an externally held payload.
    ///
    /// No validation happens here; a malformed payload surfaces as
    /// [`StateError::Decode`] on the first [`decode`](Self::decode).
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            payload: Arc::from(bytes),
            _marker: PhantomData,
        }
    }

    /// The encoded payload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty. Never true for captured snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl<T: Serialize> Snapshot<T> {
    /// Capture `value` by encoding it.
    ///
    /// # Errors
    ///
    /// [`StateError::Encode`] if `T`'s `Serialize` impl refuses the value
    /// (for example a map whose keys are not strings).
    pub fn capture(value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value).map_err(StateError::Encode)?;
        Ok(Self::from_bytes(bytes))
    }
}

impl<T: DeserializeOwned> Snapshot<T> {
    /// Decode a fresh value out of the payload.
    ///
    /// # Errors
    ///
    /// [`StateError::Decode`] if the payload is not a valid encoding of `T`.
    pub fn decode(&self) -> Result<T> {
        serde_json::from_slice(&self.payload).map_err(StateError::Decode)
    }
}

// Manual Clone: shares the payload and needs no `T: Clone`.
impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            payload: Arc::clone(&self.payload),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Snapshot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.payload == other.payload
    }
}

impl<T> Eq for Snapshot<T> {}

impl<T> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("type", &std::any::type_name::<T>())
            .field("bytes", &self.payload.len())
            .finish()
    }
}
