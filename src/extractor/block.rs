//! Captured trace block.

use std::fmt;

/// A fixed-length run of consecutive log lines captured at a trigger signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceBlock {
    lines: Vec<String>,
}

impl TraceBlock {
    pub(crate) fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// The captured lines, in file order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of captured lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the block holds no lines. Emitted blocks are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line that contained the trigger signature.
    #[must_use]
    pub fn trigger_line(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }

    /// Consume the block and return its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Renders every line followed by a newline.
impl fmt::Display for TraceBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
