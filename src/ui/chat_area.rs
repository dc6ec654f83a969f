use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};
use unicode_width::UnicodeWidthChar;

use crate::intent::Mode;
use crate::state::{AppState, Focus, ViewId};

pub(super) struct ChatAreaWidget {
    panes: Vec<PaneView>,
}

struct PaneView {
    rect: Rect,
    separator: bool,
    log_lines: Vec<Line<'static>>,
    input_spans: Vec<Span<'static>>,
}

impl ChatAreaWidget {
    pub(super) fn from_state(state: &mut AppState, content: Rect) -> (Self, Option<(u16, u16)>) {
        let mut cursor_position = None;
        let slots = pane_slots(state, content);

        let mut panes = Vec::with_capacity(slots.len());
        for (view_id, rect, focused, separator) in slots {
            let log_height = rect
                .height
                .saturating_sub(1)
                .saturating_sub(u16::from(separator)) as usize;
            let input_width = rect.width.max(1) as usize;

            let highlight = focused && state.focus == Focus::Pane && state.mode == Mode::Visual;
            let Some(view) = state.views.get_mut(view_id) else {
                continue;
            };

            if focused && state.focus == Focus::Pane {
                view.buffer.scroll_to_cursor(input_width);
            }

            let log_lines = render_log(view, log_height);
            let input_spans = render_input(&view.buffer, input_width, highlight);

            if focused && state.focus == Focus::Pane {
                let offset = display_width_between(
                    view.buffer.value(),
                    view.buffer.scroll_start().x,
                    view.buffer.cursor().x,
                );
                let input_y = rect.y + rect.height.saturating_sub(1);
                let x = rect.x + (offset as u16).min(rect.width.saturating_sub(1));
                cursor_position = Some((x, input_y));
            }

            panes.push(PaneView {
                rect,
                separator,
                log_lines,
                input_spans,
            });
        }

        (Self { panes }, cursor_position)
    }
}

impl Widget for ChatAreaWidget {
    fn render(self, _area: Rect, buf: &mut Buffer) {
        for pane in self.panes {
            let mut rect = pane.rect;
            if pane.separator && rect.height > 0 {
                let line = "─".repeat(rect.width as usize);
                Paragraph::new(line)
                    .style(Style::default().fg(Color::DarkGray))
                    .render(
                        Rect {
                            height: 1,
                            ..rect
                        },
                        buf,
                    );
                rect.y += 1;
                rect.height -= 1;
            }
            if rect.height < 2 {
                continue;
            }

            let log_rect = Rect {
                height: rect.height - 1,
                ..rect
            };
            let input_rect = Rect {
                y: rect.y + rect.height - 1,
                height: 1,
                ..rect
            };
            Paragraph::new(pane.log_lines).render(log_rect, buf);
            Paragraph::new(Line::from(pane.input_spans)).render(input_rect, buf);
        }
    }
}

/// Resolves pane rectangles: the zoomed pane fills the window, otherwise
/// panes stack top to bottom with their layout heights.
fn pane_slots(state: &AppState, content: Rect) -> Vec<(ViewId, Rect, bool, bool)> {
    if state.window.zoomed() {
        let id = state.window.focused().current_view();
        return vec![(id, content, true, false)];
    }

    let heights = state.window.layout(content.height);
    let mut slots = Vec::with_capacity(heights.len());
    let mut y = content.y;
    for (i, (slot, height)) in state.window.panes().zip(heights).enumerate() {
        let remaining = (content.y + content.height).saturating_sub(y);
        let height = height.min(remaining);
        if height == 0 {
            break;
        }
        let rect = Rect {
            x: content.x,
            y,
            width: content.width,
            height,
        };
        slots.push((
            slot.pane.current_view(),
            rect,
            i == state.window.focus_index(),
            i > 0,
        ));
        y += height;
    }
    slots
}

fn render_log(view: &crate::state::view::View, rows: usize) -> Vec<Line<'static>> {
    let visible_end = view.log.len().saturating_sub(view.scroll);
    let start = visible_end.saturating_sub(rows);
    view.log[start..visible_end]
        .iter()
        .map(|line| match &line.speaker {
            Some(speaker) => Line::from(vec![
                Span::styled(
                    format!("{speaker}: "),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(line.text.clone()),
            ]),
            None => Line::from(Span::styled(
                line.text.clone(),
                Style::default().fg(Color::DarkGray),
            )),
        })
        .collect()
}

fn render_input(
    buffer: &crate::state::buffer::TextBuffer,
    width: usize,
    highlight: bool,
) -> Vec<Span<'static>> {
    let chars: Vec<char> = buffer.value().chars().collect();
    let start = buffer.scroll_start().x.min(chars.len());
    let visible = visible_slice(&chars, start, width);

    let selection = highlight
        .then(|| buffer.highlight_anchor().map(|anchor| anchor.x))
        .flatten()
        .map(|anchor| {
            let cursor = buffer.cursor().x;
            (anchor.min(cursor), anchor.max(cursor))
        });

    let Some((sel_start, sel_end)) = selection else {
        return vec![Span::raw(visible.iter().collect::<String>())];
    };

    let mut before = String::new();
    let mut selected = String::new();
    let mut after = String::new();
    for (offset, ch) in visible.iter().enumerate() {
        let idx = start + offset;
        if idx < sel_start {
            before.push(*ch);
        } else if idx <= sel_end {
            selected.push(*ch);
        } else {
            after.push(*ch);
        }
    }
    vec![
        Span::raw(before),
        Span::styled(selected, Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(after),
    ]
}

fn visible_slice(chars: &[char], start: usize, max_cols: usize) -> Vec<char> {
    let mut out = Vec::new();
    let mut used = 0usize;
    for ch in chars.iter().skip(start) {
        let width = UnicodeWidthChar::width(*ch).unwrap_or(0);
        if used + width > max_cols {
            break;
        }
        out.push(*ch);
        used += width;
    }
    out
}

fn display_width_between(value: &str, start: usize, end: usize) -> usize {
    value
        .chars()
        .skip(start)
        .take(end.saturating_sub(start))
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}
