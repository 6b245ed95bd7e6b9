//! Bounded per-window scrollback
//!
//! Lines are stored exactly as assembled, markup included, together with
//! the indent the paint engine uses for their continuation rows. The
//! buffer is a FIFO: once it reaches its cap the oldest line goes first.

use std::collections::VecDeque;

/// One stored line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub indent: usize,
}

#[derive(Debug, Clone)]
pub struct Scrollback {
    lines: VecDeque<Line>,
    capacity: usize,
}

impl Scrollback {
    /// Create a buffer holding at most `capacity` lines (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the cap, evicting from the head if the buffer is now over it
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    /// Append a line, evicting the oldest when full. Returns true when a
    /// line was evicted.
    pub fn append(&mut self, text: impl Into<String>, indent: usize) -> bool {
        let evicted = if self.lines.len() + 1 > self.capacity {
            self.lines.pop_front();
            true
        } else {
            false
        };
        self.lines.push_back(Line {
            text: text.into(),
            indent,
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line at 0-based position `pos`
    pub fn get(&self, pos: usize) -> Option<&Line> {
        self.lines.get(pos)
    }

    /// Lines from `pos` to the tail
    pub fn iter_from(&self, pos: usize) -> impl DoubleEndedIterator<Item = &Line> + ExactSizeIterator {
        self.lines.range(pos.min(self.lines.len())..)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Line> + ExactSizeIterator {
        self.lines.iter()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
