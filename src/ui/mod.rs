mod chat_area;
mod status_bar;
mod top_bar;

use ratatui::layout::{Constraint, Layout};

use crate::state::AppState;
use chat_area::ChatAreaWidget;
use status_bar::StatusBarWidget;
use top_bar::TopBarWidget;

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&mut self, frame: &mut ratatui::Frame<'_>, state: &mut AppState) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

        let top_bar = TopBarWidget::from_state(state);
        let (chat_area, pane_cursor) = ChatAreaWidget::from_state(state, chunks[1]);
        let (status_bar, command_cursor) = StatusBarWidget::from_state(state, chunks[2]);

        frame.render_widget(top_bar, chunks[0]);
        frame.render_widget(chat_area, chunks[1]);
        frame.render_widget(status_bar, chunks[2]);
        if let Some(cursor) = command_cursor.or(pane_cursor) {
            frame.set_cursor_position(cursor);
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
