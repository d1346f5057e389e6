#![forbid(unsafe_code)]

//! Error types for snapshot capture and state management.
//!
//! Every failure here is a programmer or configuration error: the state type
//! cannot be serialized, or an encoded payload was tampered with. Nothing is
//! transient, so nothing is retried. An empty history is *not* an error;
//! [`StateManager::undo`](crate::StateManager::undo) reports it as `Ok(false)`.

use std::fmt;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors raised while capturing, restoring, or constructing tracked state.
#[derive(Debug)]
pub enum StateError {
    /// The value could not be serialized into a snapshot payload.
    Encode(serde_json::Error),
    /// A snapshot payload could not be parsed back into a value.
    Decode(serde_json::Error),
    /// The initial value handed to a manager cannot be captured.
    Construction(serde_json::Error),
}

impl StateError {
    /// Short, stable name of the variant for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Encode(_) => "encode",
            Self::Decode(_) => "decode",
            Self::Construction(_) => "construction",
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "snapshot encoding failed: {e}"),
            Self::Decode(e) => write!(f, "snapshot decoding failed: {e}"),
            Self::Construction(e) => write!(f, "initial state cannot be captured: {e}"),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) | Self::Decode(e) | Self::Construction(e) => Some(e),
        }
    }
}
