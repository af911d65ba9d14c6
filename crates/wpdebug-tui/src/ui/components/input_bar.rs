use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::InputState;
use crate::ui::{Layout, Theme};

/// Single-line text prompt
pub struct InputBar;

impl InputBar {
    pub fn render(frame: &mut Frame, input: &InputState) {
        let popup_area = Layout::popup(frame.area(), 72, 6);
        frame.render_widget(Clear, popup_area);

        let prompt = Line::from(vec![
            Span::styled(" > ", Theme::text_highlight()),
            Span::styled(input.text.as_str(), Theme::text()),
            Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
        ]);

        let detail = match &input.error {
            Some(err) => Line::from(Span::styled(format!(" ⚠ {}", err), Theme::error())),
            None => Line::from(Span::styled(
                format!(" {}", input.purpose.hint()),
                Theme::text_dim(),
            )),
        };

        let border_style = if input.error.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };

        let widget = Paragraph::new(vec![prompt, Line::from(""), detail]).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(input.purpose.title(), Theme::title()))
                .title_bottom(Span::styled(
                    " [Enter] confirm  [Esc] cancel  [Ctrl+u] clear ",
                    Theme::text_dim(),
                )),
        );

        frame.render_widget(widget, popup_area);
    }
}
