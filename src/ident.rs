//! Textual identifier allocation.
//!
//! Identifiers look like `CMPD_0000000001`: a prefix, a separator, and a
//! zero-padded counter. Every logical id space (ordinary compounds, targets)
//! owns its own [`IdAllocator`], so sequences are deterministic per run and
//! isolated between tests.

use std::fmt::Write as _;

/// Default number of digits in the numeric part.
pub const DEFAULT_WIDTH: usize = 10;

/// Default separator between prefix and digits.
pub const DEFAULT_SEPARATOR: &str = "_";

/// Monotonic textual id allocator.
///
/// Produces ids with counters starting at 1. When the counter needs more
/// digits than `width`, the id grows rather than being truncated.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    prefix: String,
    separator: String,
    width: usize,
    next: u64,
}

impl IdAllocator {
    /// Create an allocator with the default width and separator.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_format(prefix, DEFAULT_SEPARATOR, DEFAULT_WIDTH)
    }

    /// Create an allocator with an explicit separator and padding width.
    pub fn with_format(
        prefix: impl Into<String>,
        separator: impl Into<String>,
        width: usize,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            width,
            next: 1,
        }
    }

    /// Allocate the next id.
    pub fn next_id(&mut self) -> String {
        let mut id = String::with_capacity(self.prefix.len() + self.separator.len() + self.width);
        id.push_str(&self.prefix);
        id.push_str(&self.separator);
        // Writing to a String cannot fail.
        let _ = write!(id, "{:0width$}", self.next, width = self.width);
        self.next += 1;
        id
    }
}
