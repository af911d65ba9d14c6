use std::sync::LazyLock;

use regex::Regex;

use wpdebug_types::Block;

/// Any bracketed run at line start, e.g. `[anything]`
pub const LOOSE_BOUNDARY: &str = r"(?m)^\[.*?\]";

/// WordPress debug.log timestamp line: `[D-Mon-YYYY HH:MM:SS TZ]`
///
/// Capture group 1 is the full bracketed timestamp.
pub const TIMESTAMP_LINE: &str =
    r"^(\[\d{1,2}-[A-Z][a-z]{2}-\d{4}\s\d{2}:\d{2}:\d{2}\s[\w/+\-]+\])";

pub static LOOSE_BOUNDARY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LOOSE_BOUNDARY).expect("Invalid LOOSE_BOUNDARY"));

pub static TIMESTAMP_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TIMESTAMP_LINE).expect("Invalid TIMESTAMP_LINE"));

static STRICT_BOUNDARY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?m){}", TIMESTAMP_LINE)).expect("Invalid STRICT_BOUNDARY")
});

/// Splits raw log text into blocks at boundary lines
///
/// The segmenter keeps no state between calls.
#[derive(Clone, Debug)]
pub struct BlockSegmenter {
    boundary: Regex,
}

impl BlockSegmenter {
    /// Segmenter for the block picker: any `[...]` at line start opens a block
    pub fn new() -> Self {
        Self {
            boundary: LOOSE_BOUNDARY_REGEX.clone(),
        }
    }

    /// Segmenter that only splits on WordPress timestamp lines
    pub fn strict() -> Self {
        Self {
            boundary: STRICT_BOUNDARY_REGEX.clone(),
        }
    }

    /// Segmenter with a custom boundary expression
    ///
    /// The expression should be multi-line anchored (`(?m)^...`).
    pub fn with_boundary(boundary: Regex) -> Self {
        Self { boundary }
    }

    pub fn boundary(&self) -> &Regex {
        &self.boundary
    }

    /// Split `content` into blocks
    ///
    /// With no boundary match the whole content is a single block. Text
    /// before the first boundary is not part of any block. Blocks that are
    /// empty after trimming are dropped.
    pub fn segment(&self, content: &str) -> Vec<Block> {
        if content.is_empty() {
            return Vec::new();
        }

        let starts: Vec<usize> = self.boundary.find_iter(content).map(|m| m.start()).collect();

        if starts.is_empty() {
            let text = content.trim();
            if text.is_empty() {
                return Vec::new();
            }
            return vec![Block::new(0, leading_ws(content), text.to_string())];
        }

        let mut blocks = Vec::with_capacity(starts.len());
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(content.len());
            let raw = &content[start..end];
            let text = raw.trim();
            if text.is_empty() {
                continue;
            }
            let offset = start + leading_ws(raw);
            blocks.push(Block::new(blocks.len(), offset, text.to_string()));
        }
        blocks
    }
}

impl Default for BlockSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

fn leading_ws(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// Whether `line` starts with a WordPress timestamp
pub fn is_timestamp_line(line: &str) -> bool {
    TIMESTAMP_LINE_REGEX.is_match(line)
}

/// Bracketed timestamp at the start of `line`, if any
pub fn timestamp_of(line: &str) -> Option<&str> {
    TIMESTAMP_LINE_REGEX
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "[01-Jan-2024 00:00:00 UTC] PHP Warning: a\n\
Stack trace:\n\
#0 {main}\n\
\n\
[01-Jan-2024 00:00:01 UTC] PHP Notice: b\n\
[01-Jan-2024 00:00:02 UTC] PHP Deprecated: c\n";

    #[test]
    fn test_segment_counts_timestamp_lines() {
        let blocks = BlockSegmenter::new().segment(LOG);
        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[0].text,
            "[01-Jan-2024 00:00:00 UTC] PHP Warning: a\nStack trace:\n#0 {main}"
        );
        assert_eq!(blocks[1].text, "[01-Jan-2024 00:00:01 UTC] PHP Notice: b");
        assert_eq!(blocks[2].index, 2);
    }

    #[test]
    fn test_segment_round_trips_under_trim() {
        let blocks = BlockSegmenter::strict().segment(LOG);
        assert_eq!(blocks.len(), 3);

        // Rebuild using the original whitespace between blocks
        let mut rebuilt = String::new();
        for (i, block) in blocks.iter().enumerate() {
            rebuilt.push_str(&block.text);
            if let Some(next) = blocks.get(i + 1) {
                let gap_start = block.offset + block.text.len();
                rebuilt.push_str(&LOG[gap_start..next.offset]);
            }
        }
        assert_eq!(rebuilt, LOG.trim());
    }

    #[test]
    fn test_segment_without_boundaries_is_single_block() {
        let blocks = BlockSegmenter::new().segment("  just some text\nmore text\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "just some text\nmore text");
        assert_eq!(blocks[0].offset, 2);
    }

    #[test]
    fn test_segment_empty_and_blank() {
        assert!(BlockSegmenter::new().segment("").is_empty());
        assert!(BlockSegmenter::new().segment("\n\n  \n").is_empty());
    }

    #[test]
    fn test_loose_and_strict_differ() {
        let content = "[info] one\n[01-Jan-2024 00:00:00 UTC] two\n[note] three\n";
        assert_eq!(BlockSegmenter::new().segment(content).len(), 3);

        let strict = BlockSegmenter::strict().segment(content);
        assert_eq!(strict.len(), 1);
        assert!(strict[0].text.ends_with("[note] three"));
    }

    #[test]
    fn test_segment_is_restartable() {
        let segmenter = BlockSegmenter::new();
        assert_eq!(segmenter.segment(LOG), segmenter.segment(LOG));
    }

    #[test]
    fn test_timestamp_detection() {
        assert!(is_timestamp_line("[1-Feb-2024 13:45:00 UTC] x"));
        assert!(is_timestamp_line(
            "[21-Mar-2024 08:00:00 America/New_York] x"
        ));
        assert!(!is_timestamp_line("[01-jan-2024 00:00:00 UTC] lowercase month"));
        assert!(!is_timestamp_line(" [01-Jan-2024 00:00:00 UTC] indented"));
        assert!(!is_timestamp_line("[info] loose only"));
        assert_eq!(
            timestamp_of("[01-Jan-2024 00:00:00 UTC] PHP Notice"),
            Some("[01-Jan-2024 00:00:00 UTC]")
        );
    }
}
