use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use wpdebug_types::Block as LogBlock;

use super::log_viewer::render_header;
use crate::app::AppState;
use crate::ui::components::{StatusBar, truncate_to_width};
use crate::ui::{Layout, Theme};

/// Block view: one checkable row per log block, with a preview
pub struct BlockPickerScreen;

impl BlockPickerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let (header, content, status) = Layout::main(frame.area());
        let (list_area, preview_area) = Layout::block_picker(content);

        render_header(frame, header, state);
        Self::render_list(frame, list_area, state);
        Self::render_preview(frame, preview_area, state);

        let checked = format!(
            "{}/{} checked",
            state.ui_state.selected_blocks.len(),
            state.blocks.len()
        );
        let bar = StatusBar::new()
            .hints([
                ("Space", "Check"),
                ("a", "All"),
                ("n", "None"),
                ("e", "Export"),
                ("b", "Log view"),
                ("q", "Quit"),
            ])
            .message(state.ui_state.message.as_ref())
            .right(checked);
        frame.render_widget(bar, status);
    }

    fn render_list(frame: &mut Frame, area: Rect, state: &AppState) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused())
            .title(Span::styled(
                format!(" Blocks ({}) ", state.blocks.len()),
                Theme::title(),
            ));

        if state.blocks.is_empty() {
            let empty = Paragraph::new(Span::styled("No log entries", Theme::text_dim()))
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        // Borders, highlight symbol and checkbox
        let width = area.width.saturating_sub(2 + 2 + 4) as usize;
        let items: Vec<ListItem> = state
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let checked = state.ui_state.selected_blocks.contains(&i);
                list_row(b, checked, width)
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Theme::list_item_selected())
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(state.ui_state.block_cursor));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_preview(frame: &mut Frame, area: Rect, state: &AppState) {
        let current = state.blocks.get(state.ui_state.block_cursor);
        let title = match current {
            Some(b) => format!(" Block {} · {} lines ", b.index + 1, b.line_count()),
            None => " Preview ".to_string(),
        };

        let body = current.map(|b| b.text.as_str()).unwrap_or_default();
        let preview = Paragraph::new(body)
            .style(Theme::text())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border())
                    .title(Span::styled(title, Theme::title())),
            );
        frame.render_widget(preview, area);
    }
}

fn list_row(block: &LogBlock, checked: bool, width: usize) -> ListItem<'static> {
    let (mark, style) = if checked {
        ("[x] ", Theme::list_item_checked())
    } else {
        ("[ ] ", Theme::list_item())
    };

    let lines = block.line_count();
    let suffix = if lines > 1 {
        format!(" +{}", lines - 1)
    } else {
        String::new()
    };
    let header = truncate_to_width(block.header(), width.saturating_sub(suffix.len()));

    ListItem::new(Line::from(vec![
        Span::styled(mark, style),
        Span::styled(header, style),
        Span::styled(suffix, Theme::text_dim()),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_row_shows_extra_line_count() {
        let block = LogBlock::new(0, 0, "[a] first\nsecond\nthird".to_string());
        let row = list_row(&block, true, 40);
        assert_eq!(row.height(), 1);

        let block = LogBlock::new(0, 0, "[a] a very long header line".to_string());
        let row = list_row(&block, false, 10);
        assert_eq!(row.width(), 4 + 10);
    }
}
