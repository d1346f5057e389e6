use recall_core::{ConfigError, StateError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("no bookmark saved for '{title}'")]
    MissingBookmark { title: String },

    #[error("bookmark for '{bookmark}' does not belong to '{book}'")]
    ForeignBookmark { bookmark: String, book: String },
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }
}
