//! Per-title bookmarks.
//!
//! A [`BookmarkShelf`] keeps at most one [`Snapshot`] per book title. Saving
//! a second bookmark for the same title replaces the first. Restoring checks
//! the title inside the reader's critical section, so a bookmark can never
//! land in a different book even if the reader is shared across threads.

use std::collections::HashMap;

use recall_core::{Snapshot, StateManager};
use tracing::debug;

use crate::error::{DemoError, Result};
use crate::model::Book;

#[derive(Debug, Default)]
pub struct BookmarkShelf {
    marks: HashMap<String, Snapshot<Book>>,
}

impl BookmarkShelf {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bookmark the reader's current position and return it.
    pub fn mark(&mut self, reader: &StateManager<Book>) -> Result<Book> {
        let current = reader.get_state();
        let snapshot = Snapshot::capture(&current)?;
        debug!(
            title = %current.title,
            page = current.page,
            bytes = snapshot.len(),
            "bookmark saved"
        );
        self.marks.insert(current.title.clone(), snapshot);
        Ok(current)
    }

    #[must_use]
    pub fn get(&self, title: &str) -> Option<&Snapshot<Book>> {
        self.marks.get(title)
    }

    /// Saved titles in sorted order.
    #[must_use]
    pub fn titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = self.marks.keys().map(String::as_str).collect();
        titles.sort_unstable();
        titles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Move `reader` back to the bookmark saved under `title`.
    ///
    /// The jump is not recorded in the reader's undo history.
    ///
    /// # Errors
    ///
    /// - [`DemoError::MissingBookmark`] if nothing is saved under `title`.
    /// - [`DemoError::ForeignBookmark`] if the reader has a different book
    ///   open. The reader is left untouched.
    /// - [`DemoError::State`] if the bookmark cannot be decoded.
    pub fn restore(&self, title: &str, reader: &StateManager<Book>) -> Result<Book> {
        let snapshot = self.marks.get(title).ok_or_else(|| DemoError::MissingBookmark {
            title: title.to_string(),
        })?;
        let mark = snapshot.decode()?;

        let mut foreign = None;
        reader.update_with(
            |current| {
                if current.title == mark.title {
                    *current = mark.clone();
                } else {
                    foreign = Some(current.title.clone());
                }
            },
            false,
        )?;

        match foreign {
            Some(book) => Err(DemoError::ForeignBookmark {
                bookmark: mark.title,
                book,
            }),
            None => {
                debug!(title = %mark.title, page = mark.page, "bookmark restored");
                Ok(mark)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(title: &str) -> StateManager<Book> {
        StateManager::new(Book::open(title)).unwrap()
    }

    #[test]
    fn restore_returns_to_marked_page() {
        let mut shelf = BookmarkShelf::new();
        let genesis = reader("Genesis");
        genesis.update(Book::open("Genesis").at_page(40), true).unwrap();
        shelf.mark(&genesis).unwrap();
        genesis.update(Book::open("Genesis").at_page(65), true).unwrap();

        let restored = shelf.restore("Genesis", &genesis).unwrap();
        assert_eq!(restored.page, 40);
        assert_eq!(genesis.get_state().page, 40);
        // Restoring is a jump, not an undoable step.
        assert_eq!(genesis.history_len(), 2);
    }

    #[test]
    fn marking_again_replaces_the_bookmark() {
        let mut shelf = BookmarkShelf::new();
        let genesis = reader("Genesis");
        shelf.mark(&genesis).unwrap();
        genesis.update(Book::open("Genesis").at_page(9), false).unwrap();
        shelf.mark(&genesis).unwrap();

        assert_eq!(shelf.len(), 1);
        let saved: Book = shelf.get("Genesis").unwrap().decode().unwrap();
        assert_eq!(saved.page, 9);
    }

    #[test]
    fn foreign_bookmark_is_refused() {
        let mut shelf = BookmarkShelf::new();
        let genesis = reader("Genesis");
        let exodus = reader("Exodus");
        genesis.update(Book::open("Genesis").at_page(40), false).unwrap();
        shelf.mark(&genesis).unwrap();
        exodus.update(Book::open("Exodus").at_page(123), false).unwrap();
        let version = exodus.version();

        let err = shelf.restore("Genesis", &exodus).unwrap_err();
        assert!(matches!(
            err,
            DemoError::ForeignBookmark { ref bookmark, ref book }
                if bookmark == "Genesis" && book == "Exodus"
        ));
        assert_eq!(exodus.get_state().page, 123);
        assert_eq!(exodus.version(), version);
    }

    #[test]
    fn missing_bookmark_is_reported() {
        let shelf = BookmarkShelf::new();
        let err = shelf.restore("Leviticus", &reader("Leviticus")).unwrap_err();
        assert!(matches!(err, DemoError::MissingBookmark { ref title } if title == "Leviticus"));
        assert!(shelf.is_empty());
    }

    #[test]
    fn titles_are_sorted() {
        let mut shelf = BookmarkShelf::new();
        for title in ["Numbers", "Exodus", "Genesis"] {
            shelf.mark(&reader(title)).unwrap();
        }
        assert_eq!(shelf.titles(), vec!["Exodus", "Genesis", "Numbers"]);
    }
}
