use crate::intent::{Direction, ScrollKind};
use crate::state::buffer::TextBuffer;

/// One rendered line of a chat log. System lines carry no speaker.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub speaker: Option<String>,
    pub text: String,
    pub created_ms: u64,
}

impl LogLine {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            speaker: None,
            text: text.into(),
            created_ms: 0,
        }
    }

    pub fn message(speaker: impl Into<String>, text: impl Into<String>, created_ms: u64) -> Self {
        Self {
            speaker: Some(speaker.into()),
            text: text.into(),
            created_ms,
        }
    }
}

/// The composition of a chat log and an input buffer bound to a room.
/// `scroll` counts lines back from the tail; zero means following new
/// messages.
#[derive(Debug)]
pub struct View {
    pub room_id: String,
    pub short_name: String,
    pub log: Vec<LogLine>,
    pub scroll: usize,
    pub members: Vec<String>,
    pub buffer: TextBuffer,
}

impl View {
    pub fn new(room_id: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            short_name: short_name.into(),
            log: Vec::new(),
            scroll: 0,
            members: Vec::new(),
            buffer: TextBuffer::new(),
        }
    }

    pub fn push_line(&mut self, line: LogLine) {
        self.log.push(line);
        // reading backlog: keep the viewport anchored on what was visible
        if self.scroll > 0 {
            self.scroll = (self.scroll + 1).min(self.max_scroll());
        }
    }

    pub fn scroll_log(
        &mut self,
        direction: Direction,
        kind: ScrollKind,
        count: u32,
        visible_rows: usize,
    ) {
        let step = match kind {
            ScrollKind::Line | ScrollKind::Char => count.max(1) as usize,
            ScrollKind::Screen => count.max(1) as usize * visible_rows.max(1),
            ScrollKind::Top => {
                self.scroll = self.max_scroll();
                return;
            }
            ScrollKind::Bottom => {
                self.scroll = 0;
                return;
            }
        };
        match direction {
            Direction::Up => self.scroll = (self.scroll + step).min(self.max_scroll()),
            Direction::Down => self.scroll = self.scroll.saturating_sub(step),
            _ => {}
        }
    }

    fn max_scroll(&self) -> usize {
        self.log.len().saturating_sub(1)
    }
}

/// Member-name completion for the input line: suffixes of members that
/// start with the stem.
pub fn member_suffixes(members: &[String], stem: &str) -> Vec<String> {
    if stem.is_empty() {
        return Vec::new();
    }
    members
        .iter()
        .filter_map(|member| member.strip_prefix(stem))
        .filter(|suffix| !suffix.is_empty())
        .map(ToString::to_string)
        .collect()
}
