use std::borrow::Cow;

use regex::{NoExpand, Regex};
use tracing::warn;

use wpdebug_types::FilterMode;

use crate::segmenter::TIMESTAMP_LINE_REGEX;

/// Replacement text for redacted spans
pub const REDACTION_MARKER: &str = "[FILTRADO]";

/// Used in a collapse summary when the block has no timestamp line
pub const MISSING_TIMESTAMP: &str = "[Timestamp no encontrado]";

/// Text following the timestamp in a collapse summary line
pub const OMITTED_NOTICE: &str = "Contenido omitido...";

/// Compiled filter rules, in rule order
///
/// Patterns that fail to compile are reported once at compile time and
/// left out; the remaining rules still apply.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<(String, Regex)>,
    rejected: Vec<String>,
}

impl RuleSet {
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut set = Self::default();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match Regex::new(pattern) {
                Ok(re) => set.rules.push((pattern.to_string(), re)),
                Err(e) => {
                    warn!("Skipping invalid rule '{}': {}", pattern, e);
                    set.rejected.push(pattern.to_string());
                }
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Patterns that were skipped because they did not compile
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// First rule (in order) that matches anywhere in `line`
    pub fn first_match(&self, line: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(line))
            .map(|(pattern, _)| pattern.as_str())
    }
}

/// Collapse and redaction strategies
///
/// Both are pure: they read the content and the rules and return new text.
#[derive(Clone, Debug)]
pub struct ContentFilter {
    /// Per-line block start test; group 1 (or the whole match) is the timestamp
    boundary: Regex,
    marker: String,
}

impl ContentFilter {
    pub fn new() -> Self {
        Self {
            boundary: TIMESTAMP_LINE_REGEX.clone(),
            marker: REDACTION_MARKER.to_string(),
        }
    }

    /// Use a different block start expression for collapsing
    pub fn with_boundary(mut self, boundary: Regex) -> Self {
        self.boundary = boundary;
        self
    }

    /// Use a different redaction marker
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Run the strategy selected by `mode`
    pub fn apply(&self, mode: FilterMode, content: &str, rules: &RuleSet) -> String {
        match mode {
            FilterMode::Collapse => self.collapse(content, rules),
            FilterMode::Redact => self.redact(content, rules),
        }
    }

    fn is_boundary(&self, line: &str) -> bool {
        self.boundary.is_match(line)
    }

    fn timestamp_of<'a>(&self, line: &'a str) -> Option<&'a str> {
        let caps = self.boundary.captures(line)?;
        caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
    }

    /// Replace every block containing a matching line with a summary line
    ///
    /// Lines are tested against the rules in order and the first matching
    /// rule wins. The enclosing block runs from the nearest timestamp line at
    /// or before the match (plus one blank line directly above it) up to the
    /// next timestamp line or end of content.
    pub fn collapse(&self, content: &str, rules: &RuleSet) -> String {
        if rules.is_empty() {
            return content.to_string();
        }

        let lines: Vec<&str> = content.split('\n').collect();
        let mut out = Output::default();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let Some(pattern) = rules.first_match(line) else {
                out.push_source(i, line);
                i += 1;
                continue;
            };

            let header = (0..=i).rev().find(|&k| self.is_boundary(lines[k]));
            let start = match header {
                Some(h) if h > 0 && lines[h - 1].trim().is_empty() => h - 1,
                Some(h) => h,
                None => 0,
            };
            let end = (i + 1..lines.len())
                .find(|&k| self.is_boundary(lines[k]))
                .unwrap_or(lines.len());

            // Lines of this block that were already emitted verbatim
            out.retract_from(start);

            let timestamp = header
                .and_then(|h| self.timestamp_of(lines[h]))
                .unwrap_or(MISSING_TIMESTAMP);

            if out.last_is_text() {
                out.push_synthetic(String::new());
            }
            out.push_synthetic(format!(
                "{} {} (coincide con '{}')",
                timestamp, OMITTED_NOTICE, pattern
            ));

            i = end;
        }

        out.join()
    }

    /// Replace every match of every rule with the redaction marker
    ///
    /// Rules run in order, each over the output of the previous one.
    pub fn redact(&self, content: &str, rules: &RuleSet) -> String {
        let mut text = content.to_string();
        for (_, re) in &rules.rules {
            text = re.replace_all(&text, NoExpand(&self.marker)).into_owned();
        }
        text
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Output lines tagged with the source line they came from
#[derive(Default)]
struct Output<'a> {
    lines: Vec<Cow<'a, str>>,
    sources: Vec<Option<usize>>,
}

impl<'a> Output<'a> {
    fn push_source(&mut self, index: usize, line: &'a str) {
        self.lines.push(Cow::Borrowed(line));
        self.sources.push(Some(index));
    }

    fn push_synthetic(&mut self, line: String) {
        self.lines.push(Cow::Owned(line));
        self.sources.push(None);
    }

    fn retract_from(&mut self, start: usize) {
        while matches!(self.sources.last(), Some(Some(k)) if *k >= start) {
            self.lines.pop();
            self.sources.pop();
        }
    }

    fn last_is_text(&self) -> bool {
        self.lines.last().is_some_and(|l| !l.trim().is_empty())
    }

    fn join(self) -> String {
        self.lines.join("\n")
    }
}

/// Strategy A over raw rule strings
pub fn collapse_blocks<S: AsRef<str>>(content: &str, rules: &[S]) -> String {
    ContentFilter::new().collapse(content, &RuleSet::compile(rules))
}

/// Strategy B over raw rule strings
pub fn redact<S: AsRef<str>>(content: &str, rules: &[S]) -> String {
    ContentFilter::new().redact(content, &RuleSet::compile(rules))
}
