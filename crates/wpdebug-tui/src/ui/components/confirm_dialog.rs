use ratatui::{
    Frame,
    layout::Alignment,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::{Layout, Theme};

/// Yes/no question shown over the current screen
pub struct ConfirmDialog;

impl ConfirmDialog {
    pub fn render(frame: &mut Frame, question: &str) {
        let popup_area = Layout::popup(frame.area(), 56, 5);
        frame.render_widget(Clear, popup_area);

        let text = vec![
            Line::from(Span::styled(question, Theme::text())),
            Line::from(""),
            Line::from(vec![
                Span::styled("[y]", Theme::text_highlight()),
                Span::styled(" yes   ", Theme::text()),
                Span::styled("[n]", Theme::text_highlight()),
                Span::styled(" no", Theme::text()),
            ]),
        ];

        let widget = Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::error())
                .title(Span::styled(" Confirm ", Theme::error())),
        );

        frame.render_widget(widget, popup_area);
    }
}
