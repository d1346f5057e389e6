#![forbid(unsafe_code)]

//! Configuration for [`StateManager`](crate::StateManager).
//!
//! # Loading
//!
//! ```toml
//! # recall.toml
//! label = "reader"
//! notify = "after_unlock"
//! history_capacity = 64
//! ```
//!
//! ```rust,ignore
//! let config = ManagerConfig::from_toml_file("recall.toml")?; // feature = "config-toml"
//! let config = ManagerConfig::from_json_str(json)?;
//! ```
//!
//! Missing fields take their defaults, so an empty document is valid.

#[cfg(feature = "config-toml")]
use std::path::Path;

use serde::{Deserialize, Serialize};

/// When subscribers of a manager see a change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// Queue events inside the critical section, deliver them once the lock
    /// is released. Callbacks may call back into the manager. Deliveries
    /// from different threads may interleave; order them by version.
    #[default]
    AfterUnlock,
    /// Deliver events while the lock is held, so every subscriber sees
    /// changes in exactly the order they were applied. Calling back into the
    /// manager from a callback deadlocks.
    UnderLock,
}

/// Tunables for a [`StateManager`](crate::StateManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Name recorded on every tracing span the manager opens.
    pub label: String,
    /// Notification delivery policy.
    pub notify: NotifyPolicy,
    /// Initial history allocation. Not a depth limit.
    pub history_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            label: "state".to_string(),
            notify: NotifyPolicy::AfterUnlock,
            history_capacity: 16,
        }
    }
}

impl ManagerConfig {
    /// Default configuration under a different span label.
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Set the notification policy.
    #[must_use]
    pub fn with_notify(mut self, notify: NotifyPolicy) -> Self {
        self.notify = notify;
        self
    }

    /// Set the initial history allocation.
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Check the configuration for values that make no sense.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] listing every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        if self.label.trim().is_empty() {
            errors.push("label must not be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "config-toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    #[cfg(feature = "config-toml")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a manager configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// TOML parse error.
    #[cfg(feature = "config-toml")]
    Toml(toml::de::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            #[cfg(feature = "config-toml")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            #[cfg(feature = "config-toml")]
            Self::Toml(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
