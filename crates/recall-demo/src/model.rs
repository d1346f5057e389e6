//! Reading positions tracked by the scenarios.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A reader's place in a book: chapter and verse plus the physical page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub chapter: u32,
    pub verse: u32,
    pub page: u32,
}

impl Book {
    /// Open `title` at chapter 1, verse 1, page 1.
    #[must_use]
    pub fn open(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            chapter: 1,
            verse: 1,
            page: 1,
        }
    }

    /// The same position on another page.
    #[must_use]
    pub fn at_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' {}:{}, page {}",
            self.title, self.chapter, self.verse, self.page
        )
    }
}

/// Verse-level reading progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

impl Passage {
    #[must_use]
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self {
            book: book.into(),
            chapter,
            verse,
        }
    }

    /// The following verse in the same chapter. Stays put at `u32::MAX`.
    #[must_use]
    pub fn next_verse(&self) -> Self {
        Self {
            verse: self.verse.saturating_add(1),
            ..self.clone()
        }
    }
}

impl fmt::Display for Passage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
    }
}
