use crate::parser::format_command;
use std::collections::VecDeque;

/// Something that can be stored in a [`History`] and shown again in the editor.
pub trait HistoryEntry: Clone + PartialEq {
    /// Text placed into the editing buffer when this entry is recalled.
    fn to_line(&self) -> String;
}

impl HistoryEntry for Vec<String> {
    fn to_line(&self) -> String {
        format_command(self.as_slice())
    }
}

impl HistoryEntry for String {
    fn to_line(&self) -> String {
        self.clone()
    }
}

/// Read-only view of a history as used by the line editor for Up/Down browsing.
///
/// Index 0 denotes the most recent entry. `None` is returned when the index exceeds
/// the number of stored entries.
pub trait BrowseHistory {
    fn line_at(&self, index: usize) -> Option<String>;
}

/// Bounded history with the most recent entry first.
///
/// Putting an entry that is equal to a stored one moves the stored entry to the
/// front instead of adding a duplicate.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

/// History of parsed commands.
pub type CommandHistory = History<Vec<String>>;

/// History of raw lines.
pub type LineHistory = History<String>;

impl<T: HistoryEntry> History<T> {
    /// Create an empty history holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Save `entry` as the most recent entry.
    pub fn put(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        if let Some(pos) = self.entries.iter().position(|e| *e == entry) {
            self.entries.remove(pos);
        }
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Entry at `index`, where 0 is the most recent one.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate from the most recent to the oldest entry.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: HistoryEntry> BrowseHistory for History<T> {
    fn line_at(&self, index: usize) -> Option<String> {
        self.get(index).map(HistoryEntry::to_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn assert_entry(hist: &CommandHistory, index: usize, expected: &[&str]) {
        assert_eq!(hist.get(index), Some(&cmd(expected)), "entry {index}");
    }

    #[test]
    fn test_bounded_history() {
        let mut hist = CommandHistory::new(2);
        assert_eq!(hist.get(0), None);

        hist.put(cmd(&["foo", "bar"]));
        assert_entry(&hist, 0, &["foo", "bar"]);
        assert_eq!(hist.get(1), None);

        hist.put(cmd(&["42"]));
        assert_entry(&hist, 0, &["42"]);
        assert_entry(&hist, 1, &["foo", "bar"]);

        hist.put(cmd(&[]));
        assert_entry(&hist, 0, &[]);
        assert_entry(&hist, 1, &["42"]);
        assert_eq!(hist.get(2), None);

        hist.put(cmd(&["new", "stuff"]));
        assert_entry(&hist, 0, &["new", "stuff"]);
        assert_entry(&hist, 1, &[]);
        assert_eq!(hist.len(), 2);
    }

    #[test]
    fn test_reinsert_moves_to_front() {
        let mut hist = CommandHistory::new(5);
        hist.put(cmd(&["a"]));
        hist.put(cmd(&["b"]));
        hist.put(cmd(&["a"]));

        assert_entry(&hist, 0, &["a"]);
        assert_entry(&hist, 1, &["b"]);
        assert_eq!(hist.get(2), None);
    }

    #[test]
    fn test_deduplication_keeps_order_and_capacity() {
        let mut hist = CommandHistory::new(4);
        hist.put(cmd(&["the", "very", "first", "entry"]));
        hist.put(cmd(&["the", "very", "first", "entry"]));
        assert_eq!(hist.len(), 1);

        hist.put(cmd(&["2"]));
        hist.put(cmd(&["foo", "bar"]));
        hist.put(cmd(&["42"]));
        hist.put(cmd(&["2"]));
        assert_entry(&hist, 0, &["2"]);
        assert_entry(&hist, 1, &["42"]);
        assert_entry(&hist, 2, &["foo", "bar"]);
        assert_entry(&hist, 3, &["the", "very", "first", "entry"]);

        hist.put(cmd(&["new", "stuff"]));
        assert_entry(&hist, 0, &["new", "stuff"]);
        assert_entry(&hist, 3, &["foo", "bar"]);
        assert_eq!(hist.get(4), None);

        hist.put(cmd(&["42"]));
        assert_entry(&hist, 0, &["42"]);
        assert_entry(&hist, 1, &["new", "stuff"]);
        assert_entry(&hist, 2, &["2"]);
        assert_entry(&hist, 3, &["foo", "bar"]);
    }

    #[test]
    fn test_prefix_is_not_equal() {
        let mut hist = CommandHistory::new(4);
        hist.put(cmd(&["a", "b"]));
        hist.put(cmd(&["a"]));
        assert_eq!(hist.len(), 2);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut hist = LineHistory::new(0);
        hist.put("x".to_string());
        assert!(hist.is_empty());
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let mut hist = CommandHistory::new(usize::MAX);
        assert_eq!(hist.capacity(), usize::MAX);
        hist.put(cmd(&["a"]));
        hist.put(cmd(&["b"]));
        assert_eq!(hist.len(), 2);
        assert_eq!(hist.get(0), Some(&cmd(&["b"])));
    }

    #[test]
    fn test_browse_renders_lines() {
        let mut commands = CommandHistory::new(3);
        commands.put(cmd(&["print", "a b"]));
        assert_eq!(commands.line_at(0).as_deref(), Some("print \"a b\""));

        let mut lines = LineHistory::new(3);
        lines.put("foo bar".to_string());
        assert_eq!(lines.line_at(0).as_deref(), Some("foo bar"));
        assert_eq!(lines.line_at(1), None);
    }
}
