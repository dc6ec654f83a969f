use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};
use unicode_width::UnicodeWidthChar;

use crate::state::{AppState, Focus};

pub(super) struct StatusBarWidget {
    line: Line<'static>,
}

impl StatusBarWidget {
    pub(super) fn from_state(state: &mut AppState, rect: Rect) -> (Self, Option<(u16, u16)>) {
        if state.focus == Focus::Command {
            let width = rect.width.saturating_sub(1).max(1) as usize;
            state.command.scroll_to_cursor(width);

            let start = state.command.scroll_start().x;
            let visible: String = state.command.value().chars().skip(start).take(width).collect();
            let offset: usize = state
                .command
                .value()
                .chars()
                .skip(start)
                .take(state.command.cursor().x.saturating_sub(start))
                .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
                .sum();
            let cursor = (
                rect.x + 1 + (offset as u16).min(rect.width.saturating_sub(1)),
                rect.y,
            );
            let line = Line::from(vec![Span::raw(":"), Span::raw(visible)]);
            return (Self { line }, Some(cursor));
        }

        let text = state.status.text();
        let line = if state.status.is_transient() {
            Line::from(Span::styled(
                text,
                Style::default().add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::raw(text))
        };
        (Self { line }, None)
    }
}

impl Widget for StatusBarWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.line).render(area, buf);
    }
}
