use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::Layout;

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::popup(frame.area(), 54, 36);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Self::section("Log view"),
            Self::key_line("j/↓ k/↑", "Scroll down / up"),
            Self::key_line("Ctrl+d/u", "Page down / up"),
            Self::key_line("g / G", "Go to top / bottom"),
            Self::key_line("f", "Toggle follow mode"),
            Self::key_line("e", "Export view to file"),
            Self::key_line("c", "Clear debug.log"),
            Self::key_line("a", "Add exception pattern"),
            Line::from(""),
            Self::section("Block view"),
            Self::key_line("j/k", "Move cursor"),
            Self::key_line("Space", "Check / uncheck block"),
            Self::key_line("a / n", "Check all / none"),
            Self::key_line("e/Enter", "Export checked blocks"),
            Line::from(""),
            Self::section("Anywhere"),
            Self::key_line("b", "Toggle block view"),
            Self::key_line("p", "Pause / resume updates"),
            Self::key_line("r", "Reload debug.log"),
            Self::key_line("M", "Cycle filter mode"),
            Self::key_line("x", "Exception patterns"),
            Self::key_line("m", "Combine with console log"),
            Self::key_line("o", "Set wp-content directory"),
            Self::key_line("O", "Open wp-content in file manager"),
            Self::key_line("l", "Set console log directory"),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("Esc", "Close / go back"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn section(name: &str) -> Line<'_> {
        Line::from(Span::styled(name, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>9}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
