#![forbid(unsafe_code)]

//! Reading-tracker walkthroughs built on `recall-core`.
//!
//! Three scenarios, each writing a plain-text transcript:
//!
//! - `book`: page tracking with saved and unsaved jumps, then undo.
//! - `reading`: verse-by-verse progress with back navigation.
//! - `bookmarks`: one bookmark per title, refused when restored into
//!   the wrong book.

pub mod cli;
pub mod error;
pub mod model;
pub mod scenario;
pub mod shelf;

pub use cli::{Cli, Commands, run, run_from_env};
pub use error::{DemoError, Result};
