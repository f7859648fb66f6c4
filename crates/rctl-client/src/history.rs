//! Bounded command history with recall cursor

use std::collections::VecDeque;

/// Maximum number of remembered commands
pub const MAX_HISTORY: usize = 100;

/// Result of moving the recall cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recall {
    /// Replace the input line with this entry
    Entry(String),
    /// Empty the input line
    Clear,
    /// Leave the input line alone
    Stay,
}

/// Submitted commands, oldest first
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    capacity: usize,
    /// Index of the recalled entry; `None` while editing a fresh line
    cursor: Option<usize>,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl CommandHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            cursor: None,
        }
    }

    /// Record a submitted command
    ///
    /// Returns `false` when the command repeats the newest entry and was not
    /// stored again. The recall cursor is reset either way.
    pub fn push(&mut self, command: &str) -> bool {
        self.cursor = None;

        if command.is_empty() || self.entries.back().is_some_and(|last| last == command) {
            return false;
        }

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(command.to_string());
        true
    }

    /// Move towards older entries (Up)
    pub fn older(&mut self) -> Recall {
        let next = match self.cursor {
            None if self.entries.is_empty() => return Recall::Stay,
            None => self.entries.len() - 1,
            Some(0) => return Recall::Stay,
            Some(index) => index - 1,
        };

        self.cursor = Some(next);
        self.entry_at(next)
    }

    /// Move towards newer entries (Down)
    pub fn newer(&mut self) -> Recall {
        match self.cursor {
            Some(index) if index + 1 < self.entries.len() => {
                self.cursor = Some(index + 1);
                self.entry_at(index + 1)
            }
            _ => {
                self.cursor = None;
                Recall::Clear
            }
        }
    }

    fn entry_at(&self, index: usize) -> Recall {
        self.entries
            .get(index)
            .map_or(Recall::Stay, |entry| Recall::Entry(entry.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
