// src/core/history.rs

/// Append-only log of submitted lines with a movable read pointer.
///
/// The pointer ranges over `[0, len]`; `len` means "past the newest entry",
/// which is where every submission leaves it.
#[derive(Debug, Default, Clone)]
pub struct HistoryNavigator {
    entries: Vec<String>,
    pointer: usize,
}

impl HistoryNavigator {
    /// Builds a navigator over an existing log, pointer at the end.
    pub fn new(entries: Vec<String>) -> Self {
        let pointer = entries.len();
        Self { entries, pointer }
    }

    /// Appends a line and resets the pointer to the end.
    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
        self.reset_pointer();
    }

    /// Moves the pointer past the newest entry.
    pub fn reset_pointer(&mut self) {
        self.pointer = self.entries.len();
    }

    /// Steps to the previous (older) entry. Returns `None` at the oldest entry.
    pub fn move_up(&mut self) -> Option<&str> {
        if self.pointer == 0 {
            return None;
        }
        self.pointer -= 1;
        self.entries.get(self.pointer).map(String::as_str)
    }

    /// Steps to the next (newer) entry. Leaving the newest entry yields an empty line,
    /// as does any further step.
    pub fn move_down(&mut self) -> &str {
        let len = self.entries.len();
        if self.pointer + 1 < len {
            self.pointer += 1;
            return self.entries.get(self.pointer).map_or("", String::as_str);
        }
        if self.pointer < len {
            self.pointer = len;
        }
        ""
    }

    /// Current pointer position.
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was ever submitted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> HistoryNavigator {
        HistoryNavigator::new(vec!["a".into(), "b".into(), "c".into()])
    }

    #[test]
    fn test_navigation_walks_up_and_back_down() {
        let mut history = abc();
        assert_eq!(history.pointer(), 3);

        assert_eq!(history.move_up(), Some("c"));
        assert_eq!(history.pointer(), 2);
        assert_eq!(history.move_up(), Some("b"));
        assert_eq!(history.pointer(), 1);

        assert_eq!(history.move_down(), "c");
        assert_eq!(history.pointer(), 2);
        assert_eq!(history.move_down(), "");
        assert_eq!(history.pointer(), 3);
        assert_eq!(history.move_down(), "");
        assert_eq!(history.pointer(), 3);
    }

    #[test]
    fn test_move_up_stops_at_oldest_entry() {
        let mut history = abc();
        history.move_up();
        history.move_up();
        assert_eq!(history.move_up(), Some("a"));
        assert_eq!(history.move_up(), None);
        assert_eq!(history.pointer(), 0);
    }

    #[test]
    fn test_push_resets_pointer_and_keeps_log_intact() {
        let mut history = abc();
        history.move_up();
        history.move_up();
        history.push("d");
        assert_eq!(history.pointer(), 4);
        assert_eq!(history.entries(), &["a", "b", "c", "d"]);
    }

    #[test]
    fn test_empty_history_navigation() {
        let mut history = HistoryNavigator::default();
        assert_eq!(history.move_up(), None);
        assert_eq!(history.move_down(), "");
        assert_eq!(history.pointer(), 0);
        assert!(history.is_empty());
    }
}
