use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::state::AppState;

pub(super) struct TopBarWidget {
    pane_spans: Vec<Span<'static>>,
    flags: String,
}

impl TopBarWidget {
    pub(super) fn from_state(state: &AppState) -> Self {
        let mut pane_spans = Vec::new();
        let focus_index = state.window.focus_index();
        let pane_count = state.window.pane_count();

        for (i, slot) in state.window.panes().enumerate() {
            let name = state
                .views
                .get(slot.pane.current_view())
                .map(|view| view.short_name.clone())
                .unwrap_or_default();
            let style = if i == focus_index {
                Style::default()
                    .fg(Color::White)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            pane_spans.push(Span::styled(format!(" {name} "), style));
            if i + 1 != pane_count {
                pane_spans.push(Span::raw(" "));
            }
        }

        let flags = if state.window.zoomed() {
            "[zoom] ".to_string()
        } else {
            String::new()
        };

        Self { pane_spans, flags }
    }
}

impl Widget for TopBarWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let flags_width = self.flags.len() as u16;
        let chunks = Layout::horizontal([
            Constraint::Min(1),
            Constraint::Length(flags_width.min(area.width)),
        ])
        .split(area);
        Paragraph::new(Line::from(self.pane_spans)).render(chunks[0], buf);
        Paragraph::new(self.flags).render(chunks[1], buf);
    }
}
