#![forbid(unsafe_code)]

//! Recall Core
//!
//! Snapshot-based undo for arbitrary serializable state.
//!
//! # Key Components
//!
//! - [`Snapshot`] - Immutable, deep-copied capture of a value
//! - [`Originator`] - Owner of the live value; emits change notifications
//! - [`History`] - Thread-safe LIFO stack of snapshots
//! - [`StateManager`] - Facade making save/update/undo atomic and observable
//! - [`ManagerConfig`] - Span label, notification policy, history preallocation
//!
//! # Example
//!
//! ```
//! use recall_core::StateManager;
//!
//! let manager = StateManager::new(1u32)?;
//! manager.update(15, true)?;
//! manager.update(30, true)?;
//!
//! assert!(manager.undo()?);
//! assert_eq!(manager.get_state(), 15);
//! assert!(manager.undo()?);
//! assert_eq!(manager.get_state(), 1);
//! assert!(!manager.undo()?);
//! # Ok::<(), recall_core::StateError>(())
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod manager;
pub mod notify;
pub mod originator;
pub mod snapshot;

pub use config::{ConfigError, ManagerConfig, NotifyPolicy};
pub use error::{Result, StateError};
pub use history::History;
pub use manager::StateManager;
pub use notify::{Notifier, PropertyChange, STATE_PROPERTY, StateChange, Subscription};
pub use originator::Originator;
pub use snapshot::Snapshot;
