//! Shared types for wpdebugger
//!
//! This crate contains data structures used across multiple wpdebugger crates.

use std::fmt;
use std::str::FromStr;

// ============================================================================
// Log Types
// ============================================================================

/// A contiguous slice of log text starting at a block boundary line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Position of this block in the segmented sequence
    pub index: usize,

    /// Byte offset of the block start within the source text
    pub offset: usize,

    /// Block text, trimmed of leading/trailing whitespace
    pub text: String,
}

impl Block {
    pub fn new(index: usize, offset: usize, text: String) -> Self {
        Self {
            index,
            offset,
            text,
        }
    }

    /// First line of the block (the boundary line)
    pub fn header(&self) -> &str {
        self.text.lines().next().unwrap_or("")
    }

    /// Number of lines in the block
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// Bracketed prefix of the header line, e.g. `[01-Jan-2024 00:00:00 UTC]`
    pub fn marker(&self) -> Option<&str> {
        let header = self.header();
        if !header.starts_with('[') {
            return None;
        }
        header.find(']').map(|end| &header[..=end])
    }
}

/// Which filtering strategy is applied before content reaches the display
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Collapse matching blocks into a one-line summary
    #[default]
    Collapse,
    /// Replace every match inline with a redaction marker
    Redact,
}

impl FilterMode {
    /// Get display label for this mode
    pub fn label(&self) -> &'static str {
        match self {
            Self::Collapse => "collapse",
            Self::Redact => "redact",
        }
    }

    /// Cycle to the next mode
    pub fn next(&self) -> Self {
        match self {
            Self::Collapse => Self::Redact,
            Self::Redact => Self::Collapse,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "collapse" | "live" => Ok(Self::Collapse),
            "redact" | "redaction" => Ok(Self::Redact),
            other => Err(format!(
                "unknown filter mode '{}' (expected 'collapse' or 'redact')",
                other
            )),
        }
    }
}

/// Observable state of the change watcher
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WatchState {
    /// No file change pending
    #[default]
    Idle,
    /// An action ran recently; new events inside the window are ignored
    Debouncing,
    /// Reading the file and notifying the display
    Processing,
}

impl WatchState {
    /// Short display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Debouncing => "debounce",
            Self::Processing => "reading",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_header_and_marker() {
        let block = Block::new(
            0,
            0,
            "[01-Jan-2024 00:00:00 UTC] PHP Notice: x\nStack trace:".to_string(),
        );
        assert_eq!(block.header(), "[01-Jan-2024 00:00:00 UTC] PHP Notice: x");
        assert_eq!(block.marker(), Some("[01-Jan-2024 00:00:00 UTC]"));
        assert_eq!(block.line_count(), 2);
    }

    #[test]
    fn test_block_without_marker() {
        let block = Block::new(0, 0, "plain text".to_string());
        assert_eq!(block.marker(), None);
    }

    #[test]
    fn test_filter_mode_parse() {
        assert_eq!("collapse".parse::<FilterMode>(), Ok(FilterMode::Collapse));
        assert_eq!("REDACT".parse::<FilterMode>(), Ok(FilterMode::Redact));
        assert!("other".parse::<FilterMode>().is_err());
        assert_eq!(FilterMode::Collapse.next(), FilterMode::Redact);
    }
}
