use crate::error::{DisplayError, Result};
use std::collections::VecDeque;

/// Capacity-bounded ring for entries without identity, such as shell
/// scrollback. When full, the oldest entry is evicted.
#[derive(Debug, Clone)]
pub struct ScrollbackBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
    dirty: bool,
}

impl<T: Clone> ScrollbackBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DisplayError::Config(
                "scrollback capacity must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            dirty: false,
        })
    }

    pub fn push(&mut self, entry: T) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.dirty = true;
    }

    /// Entries, newest first
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.iter().rev().cloned().collect()
    }

    /// Entries, oldest first
    pub fn chronological(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    pub fn poll_snapshot(&mut self) -> Option<Vec<T>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.snapshot())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.dirty = true;
    }

    /// Most recently pushed entry
    pub fn last(&self) -> Option<&T> {
        self.entries.back()
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
}
