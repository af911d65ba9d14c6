use ratatui::{
    Frame,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::app::AppState;
use crate::ui::{Layout, Theme};

/// Overlay listing the exception patterns
pub struct RulesOverlay;

impl RulesOverlay {
    pub fn render(frame: &mut Frame, state: &AppState) {
        let popup_area = Layout::popup(frame.area(), 70, 20);
        frame.render_widget(Clear, popup_area);

        let title = Line::from(vec![
            Span::styled(" Exception patterns ", Theme::title()),
            Span::styled(format!("({}) ", state.rules.len()), Theme::text_dim()),
        ]);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused())
            .title(title)
            .title_bottom(Span::styled(
                " [a] add  [d] remove  [X] clear all  [Esc] close ",
                Theme::text_dim(),
            ));

        if state.rules.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No patterns yet. Press [a] to add one.",
                Theme::text_dim(),
            )))
            .block(block);
            frame.render_widget(empty, popup_area);
            return;
        }

        let items: Vec<ListItem> = state
            .rules
            .iter()
            .map(|rule| ListItem::new(Span::styled(rule.as_str(), Theme::list_item())))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Theme::list_item_selected())
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(state.ui_state.rule_selection));
        frame.render_stateful_widget(list, popup_area, &mut list_state);
    }
}
