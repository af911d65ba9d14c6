use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::MessageLevel;
use crate::ui::Theme;

/// Status bar showing keyboard shortcuts, or a message in their place
pub struct StatusBar<'a> {
    hints: Vec<(&'a str, &'a str)>,
    message: Option<(MessageLevel, &'a str)>,
    right_text: Option<String>,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            hints: Vec::new(),
            message: None,
            right_text: None,
        }
    }

    /// Add keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    /// Show a message instead of the hints
    pub fn message(mut self, message: Option<&'a (MessageLevel, String)>) -> Self {
        self.message = message.map(|(level, text)| (*level, text.as_str()));
        self
    }

    /// Set text to display on the right side
    pub fn right<S: Into<String>>(mut self, text: S) -> Self {
        self.right_text = Some(text.into());
        self
    }

    fn left_line(&self) -> Line<'a> {
        if let Some((level, text)) = self.message {
            let style = match level {
                MessageLevel::Info => Theme::info(),
                MessageLevel::Error => Theme::error(),
            };
            return Line::from(vec![
                Span::styled(text, on_status_bar(style)),
                Span::styled("  [Esc] dismiss", Theme::status_bar()),
            ]);
        }

        let mut spans = Vec::new();
        for (i, (key, desc)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Theme::status_bar()));
            }
            spans.push(Span::styled(format!("[{}]", key), Theme::status_bar_key()));
            spans.push(Span::styled(format!(" {}", desc), Theme::status_bar()));
        }
        Line::from(spans)
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        buf.set_style(area, Theme::status_bar());

        let line = self.left_line();
        let line_width = line.width() as u16;

        // Render hints on the left
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));

        // Render right text if it fits next to the left side
        if let Some(right) = self.right_text {
            let right_width = right.width() as u16;
            let right_x = area.x + area.width.saturating_sub(right_width + 1);
            if right_x > area.x + line_width + 2 {
                let span = Span::styled(right.as_str(), Theme::status_bar());
                buf.set_span(right_x, area.y, &span, right_width);
            }
        }
    }
}

/// Cut `text` to at most `max_width` display columns, marking the cut
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}

/// Status bar background with `style` on top
fn on_status_bar(style: Style) -> Style {
    Theme::status_bar().patch(style)
}
