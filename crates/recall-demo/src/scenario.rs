//! Scenario walkthroughs.
//!
//! Each scenario drives one or more [`StateManager`]s and writes a
//! transcript to the supplied writer. Change notifications are collected by
//! an [`EventLog`] and flushed after the step that caused them, so the
//! transcript reads in causal order under either notification policy.

use std::io::Write;
use std::sync::{Arc, Mutex};

use recall_core::{ManagerConfig, StateManager, Subscription};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{DemoError, Result};
use crate::model::{Book, Passage};
use crate::shelf::BookmarkShelf;

/// Notification lines waiting to be written.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    /// Record both notification channels of `manager`.
    ///
    /// Events are logged for as long as the returned guards live.
    pub fn attach<T>(&self, manager: &StateManager<T>) -> [Subscription; 2]
    where
        T: Serialize + DeserializeOwned + Clone + PartialEq + Send + std::fmt::Display + 'static,
    {
        let property_log = self.clone();
        let state_log = self.clone();
        [
            manager.subscribe_property(move |change| {
                property_log.push(format!(
                    "property '{}' changed (v{})",
                    change.name, change.version
                ));
            }),
            manager.subscribe(move |change| {
                state_log.push(format!("state is now {} (v{})", change.value, change.version));
            }),
        ]
    }

    fn push(&self, line: String) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line);
    }

    /// Write and discard every pending line, indented under the last step.
    pub fn flush<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let lines = std::mem::take(&mut *self.lines.lock().unwrap_or_else(|e| e.into_inner()));
        for line in lines {
            writeln!(out, "  {line}")?;
        }
        Ok(())
    }
}

/// Build a manager from the supplied settings, or from defaults labeled
/// after the scenario when none were supplied.
fn manager_for<T>(
    initial: T,
    config: Option<&ManagerConfig>,
    label: &str,
) -> Result<StateManager<T>>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Send + 'static,
{
    let config = config
        .cloned()
        .unwrap_or_else(|| ManagerConfig::labeled(label));
    Ok(StateManager::with_config(initial, config)?)
}

// ============================================================================
// book
// ============================================================================

/// Page tracking: two saved page turns, one unsaved jump, then undo until
/// the history runs dry.
pub fn book<W: Write>(out: &mut W, config: Option<&ManagerConfig>) -> Result<()> {
    info!(scenario = "book", "starting");
    let start = Book::open("Genesis");
    let manager = manager_for(start.clone(), config, "book")?;
    let log = EventLog::default();
    let _subs = log.attach(&manager);

    writeln!(out, "Starting reading {}", manager.get_state())?;

    for page in [15, 30] {
        manager.update(start.at_page(page), true)?;
        writeln!(out, "Turned to {}", manager.get_state())?;
        log.flush(out)?;
    }

    manager.update(start.at_page(45), false)?;
    writeln!(out, "Turned to {} (not saved)", manager.get_state())?;
    log.flush(out)?;

    while manager.undo()? {
        writeln!(out, "Restored to {}", manager.get_state())?;
        log.flush(out)?;
    }
    writeln!(out, "Nothing left to undo at {}", manager.get_state())?;
    Ok(())
}

// ============================================================================
// reading
// ============================================================================

/// Verse-by-verse reading from Genesis 1:1, then back navigation one step
/// past the start of the history.
pub fn reading<W: Write>(
    out: &mut W,
    config: Option<&ManagerConfig>,
    verses: u32,
) -> Result<()> {
    info!(scenario = "reading", verses, "starting");
    let manager = manager_for(Passage::new("Genesis", 1, 1), config, "reading")?;

    writeln!(out, "Current position: {}", manager.get_state())?;
    for _ in 0..verses {
        manager.update_with(|p| *p = p.next_verse(), true)?;
        writeln!(out, "Moved to {}", manager.get_state())?;
    }

    loop {
        if !manager.can_undo() {
            writeln!(out, "No previous reading progress to go back to.")?;
            break;
        }
        manager.undo()?;
        writeln!(out, "Went back to {}", manager.get_state())?;
    }
    writeln!(out, "Current position: {}", manager.get_state())?;
    Ok(())
}

// ============================================================================
// bookmarks
// ============================================================================

/// Two readers sharing one bookmark shelf.
pub fn bookmarks<W: Write>(out: &mut W, config: Option<&ManagerConfig>) -> Result<()> {
    info!(scenario = "bookmarks", "starting");
    let patterns = manager_for(Book::open("Design Patterns"), config, "bookmarks")?;
    let taocp = manager_for(
        Book::open("The Art of Computer Programming"),
        config,
        "bookmarks",
    )?;
    let mut shelf = BookmarkShelf::new();

    for (reader, page) in [(&patterns, 40), (&taocp, 123)] {
        writeln!(out, "Currently at {}", reader.get_state())?;
        reader.update_with(|b| b.page = page, true)?;
        writeln!(out, "Turned to {}", reader.get_state())?;
        let mark = shelf.mark(reader)?;
        writeln!(out, "Bookmark created at {mark}")?;
    }

    patterns.update_with(|b| b.page = 65, true)?;
    writeln!(out, "Turned to {}", patterns.get_state())?;

    for reader in [&patterns, &taocp] {
        let title = reader.with_state(|b| b.title.clone());
        let mark = shelf.restore(&title, reader)?;
        writeln!(out, "Restored to {mark}")?;
    }

    match shelf.restore("Design Patterns", &taocp) {
        Err(DemoError::ForeignBookmark { bookmark, book }) => {
            writeln!(out, "Bookmark for '{bookmark}' does not belong to '{book}'.")?;
        }
        other => {
            other?;
        }
    }

    for reader in [&patterns, &taocp] {
        writeln!(out, "Currently at {}", reader.get_state())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use recall_core::NotifyPolicy;

    use super::*;

    fn transcript(run: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> Vec<String> {
        let mut out = Vec::new();
        run(&mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn book_transcript_walks_back_past_unsaved_jump() {
        for policy in [NotifyPolicy::AfterUnlock, NotifyPolicy::UnderLock] {
            let config = ManagerConfig::default().with_notify(policy);
            let lines = transcript(|out| book(out, Some(&config)));
            let steps: Vec<&str> = lines
                .iter()
                .filter(|l| !l.starts_with("  "))
                .map(String::as_str)
                .collect();
            assert_eq!(
                steps,
                vec![
                    "Starting reading 'Genesis' 1:1, page 1",
                    "Turned to 'Genesis' 1:1, page 15",
                    "Turned to 'Genesis' 1:1, page 30",
                    "Turned to 'Genesis' 1:1, page 45 (not saved)",
                    "Restored to 'Genesis' 1:1, page 15",
                    "Restored to 'Genesis' 1:1, page 1",
                    "Nothing left to undo at 'Genesis' 1:1, page 1",
                ],
                "{policy:?}"
            );
        }
    }

    #[test]
    fn book_events_follow_their_step() {
        let lines = transcript(|out| book(out, None));
        assert_eq!(lines[1], "Turned to 'Genesis' 1:1, page 15");
        assert_eq!(lines[2], "  property 'state' changed (v1)");
        assert_eq!(lines[3], "  state is now 'Genesis' 1:1, page 15 (v1)");
        let events = lines.iter().filter(|l| l.starts_with("  ")).count();
        // Five accepted changes, two events each.
        assert_eq!(events, 10);
    }

    #[test]
    fn reading_goes_back_to_start() {
        let lines = transcript(|out| reading(out, None, 3));
        assert_eq!(
            lines,
            vec![
                "Current position: Genesis 1:1",
                "Moved to Genesis 1:2",
                "Moved to Genesis 1:3",
                "Moved to Genesis 1:4",
                "Went back to Genesis 1:3",
                "Went back to Genesis 1:2",
                "Went back to Genesis 1:1",
                "No previous reading progress to go back to.",
                "Current position: Genesis 1:1",
            ]
        );
    }

    #[test]
    fn reading_with_no_verses_has_nothing_to_undo() {
        let lines = transcript(|out| reading(out, None, 0));
        assert_eq!(lines[1], "No previous reading progress to go back to.");
    }

    #[test]
    fn bookmarks_refuse_the_wrong_book() {
        let lines = transcript(|out| bookmarks(out, None));
        assert!(lines.contains(&"Restored to 'Design Patterns' 1:1, page 40".to_string()));
        assert!(lines.contains(
            &"Bookmark for 'Design Patterns' does not belong to 'The Art of Computer Programming'."
                .to_string()
        ));
        assert_eq!(
            lines.last().unwrap(),
            "Currently at 'The Art of Computer Programming' 1:1, page 123"
        );
    }

    #[test]
    fn scenario_label_applies_only_without_settings() {
        let manager = manager_for(1u32, None, "book").unwrap();
        assert_eq!(manager.config().label, "book");
        let manager = manager_for(1u32, Some(&ManagerConfig::labeled("mine")), "book").unwrap();
        assert_eq!(manager.config().label, "mine");
    }

    #[test]
    fn explicit_default_label_is_kept() {
        let settings = ManagerConfig::default();
        let manager = manager_for(1u32, Some(&settings), "book").unwrap();
        assert_eq!(manager.config().label, "state");
    }

    #[test]
    fn event_log_flush_drains() {
        let log = EventLog::default();
        log.push("one".to_string());
        let mut out = Vec::new();
        log.flush(&mut out).unwrap();
        log.flush(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "  one\n");
    }
}
