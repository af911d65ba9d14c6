use ratatui::{
    Frame,
    layout::{Margin, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use wpdebug_logs::{OMITTED_NOTICE, REDACTION_MARKER, timestamp_of};

use crate::app::AppState;
use crate::ui::components::StatusBar;
use crate::ui::{Layout, Theme};

/// Log viewer screen
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let (header, content, status) = Layout::main(frame.area());

        render_header(frame, header, state);
        Self::render_log(frame, content, state);

        let follow = if state.ui_state.auto_scroll { "▼ follow" } else { "" };
        let bar = StatusBar::new()
            .hints([
                ("?", "Help"),
                ("b", "Blocks"),
                ("p", "Pause"),
                ("x", "Patterns"),
                ("m", "Combine"),
                ("e", "Export"),
                ("q", "Quit"),
            ])
            .message(state.ui_state.message.as_ref())
            .right(follow);
        frame.render_widget(bar, status);
    }

    fn render_log(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let text = state.visible_content();
        let lines: Vec<&str> = text.lines().collect();
        let total = lines.len();

        // Calculate visible area (accounting for border)
        let inner_height = area.height.saturating_sub(2) as usize;
        let max_scroll = total.saturating_sub(inner_height);

        let scroll = if state.ui_state.auto_scroll {
            max_scroll
        } else {
            state.ui_state.log_scroll.min(max_scroll)
        };

        let latest = latest_line(&lines);
        let body: Vec<Line> = if total == 0 {
            vec![Line::from(Span::styled(
                placeholder(state),
                Theme::text_dim(),
            ))]
        } else {
            lines
                .iter()
                .enumerate()
                .skip(scroll)
                .take(inner_height)
                .map(|(i, line)| style_line(line, Some(i) == latest))
                .collect()
        };

        let title = format!(" debug.log ({} lines) ", total);
        let widget = Paragraph::new(body).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(title, Theme::title())),
        );
        frame.render_widget(widget, area);

        if total > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(scroll);
            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }

        state.ui_state.log_scroll = scroll;
    }
}

/// Header line shared by both views
pub(crate) fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let source = state
        .source_dir
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "no source".to_string());

    let mut spans = vec![
        Span::styled("wpdebugger", Theme::title()),
        Span::styled(" │ ", Theme::text_dim()),
        Span::styled(source, Theme::text()),
        Span::styled(" │ ", Theme::text_dim()),
        Span::styled(state.filter_mode.label(), Theme::text_highlight()),
        Span::styled(" │ ", Theme::text_dim()),
        Span::styled(format!("{} patterns", state.rules.len()), Theme::text()),
    ];
    if state.paused {
        spans.push(Span::styled(" │ ", Theme::text_dim()));
        spans.push(Span::styled(" PAUSADO ", Theme::paused()));
    }
    if state.ui_state.flash_on {
        spans.push(Span::styled(" │ ", Theme::text_dim()));
        spans.push(Span::styled("¡NUEVO LOG!", Theme::attention()));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );
    frame.render_widget(header, area);
}

fn placeholder(state: &AppState) -> &'static str {
    if state.source_dir.is_none() {
        "No wp-content directory configured. Press [o] to choose one."
    } else {
        "debug.log is empty. Waiting for new entries..."
    }
}

/// Index of the last line with visible text
fn latest_line(lines: &[&str]) -> Option<usize> {
    lines.iter().rposition(|l| !l.trim().is_empty())
}

/// Style one log line: timestamp prefix, collapse summaries and
/// redaction markers stand out; the latest line is emphasized.
fn style_line(line: &str, latest: bool) -> Line<'_> {
    if latest {
        return Line::from(Span::styled(line, Theme::latest_line()));
    }

    let mut spans = Vec::new();
    let mut rest = line;
    if let Some(ts) = timestamp_of(line) {
        spans.push(Span::styled(ts, Theme::timestamp()));
        rest = &line[ts.len()..];
    }

    if rest.trim_start().starts_with(OMITTED_NOTICE) {
        spans.push(Span::styled(rest, Theme::summary()));
        return Line::from(spans);
    }

    let mut pieces = rest.split(REDACTION_MARKER).peekable();
    while let Some(piece) = pieces.next() {
        if !piece.is_empty() {
            spans.push(Span::styled(piece, Theme::text()));
        }
        if pieces.peek().is_some() {
            spans.push(Span::styled(REDACTION_MARKER, Theme::redacted()));
        }
    }
    Line::from(spans)
}
