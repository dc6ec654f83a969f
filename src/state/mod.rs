use slotmap::{SlotMap, new_key_type};

pub mod buffer;
pub mod histlist;
pub mod pane;
pub mod registers;
pub mod status;
pub mod view;
pub mod window;

use crate::intent::{FocusDirection, Mode};
use buffer::TextBuffer;
use histlist::HistList;
use pane::Pane;
use registers::RegisterStore;
use status::StatusLine;
use view::{LogLine, View};
use window::Window;

new_key_type! { pub struct ViewId; }

const COMMAND_HISTORY_SIZE: usize = 50;

/// Which FSM receives key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Pane,
    Command,
}

/// Process-wide UI state: the view table, the pane window, registers, the
/// status line, and the command bar. All mutation happens on the event-loop
/// thread.
pub struct AppState {
    pub views: SlotMap<ViewId, View>,
    pub lobby: ViewId,
    pub window: Window,
    pub registers: RegisterStore,
    pub status: StatusLine,
    pub command: TextBuffer,
    pub command_history: HistList<String>,
    pub focus: Focus,
    pub mode: Mode,
    pub viewport: (u16, u16),
}

impl AppState {
    pub fn new() -> Self {
        let mut views = SlotMap::with_key();
        let lobby = views.insert(View::new("lobby", "lobby"));
        let mut registers = RegisterStore::new();
        registers.set_current_buffer("lobby");

        Self {
            views,
            lobby,
            window: Window::new(Pane::new(lobby)),
            registers,
            status: StatusLine::new(),
            command: TextBuffer::new(),
            command_history: HistList::new(COMMAND_HISTORY_SIZE),
            focus: Focus::Pane,
            mode: Mode::Normal,
            viewport: (80, 24),
        }
    }

    pub fn current_view(&self) -> &View {
        let id = self.window.focused().current_view();
        self.views
            .get(id)
            .expect("invariant: pane jump lists only hold live views")
    }

    pub fn current_view_mut(&mut self) -> &mut View {
        let id = self.window.focused().current_view();
        self.views
            .get_mut(id)
            .expect("invariant: pane jump lists only hold live views")
    }

    /// The buffer the focused FSM edits: the command bar when it has focus,
    /// the current view's input line otherwise.
    pub fn focused_buffer_mut(&mut self) -> &mut TextBuffer {
        match self.focus {
            Focus::Command => &mut self.command,
            Focus::Pane => &mut self.current_view_mut().buffer,
        }
    }

    pub fn view_by_room(&self, room_id: &str) -> Option<ViewId> {
        self.views
            .iter()
            .find(|(_, view)| view.room_id == room_id)
            .map(|(id, _)| id)
    }

    /// Returns the view for `room_id`, creating it if this is the first
    /// visit.
    pub fn ensure_view(&mut self, room_id: &str, short_name: &str) -> ViewId {
        if let Some(id) = self.view_by_room(room_id) {
            return id;
        }
        self.views.insert(View::new(room_id, short_name))
    }

    /// Shows `view` in the focused pane and maintains the `%`/`#` registers.
    pub fn show_view(&mut self, view: ViewId) {
        let name = self
            .views
            .get(view)
            .expect("invariant: shown views must exist")
            .short_name
            .clone();
        self.window.focused_mut().focus_view(view);
        self.registers.set_current_buffer(&name);
    }

    /// Walks the focused pane's jump list and follows with the registers.
    pub fn walk_pane_history(&mut self, direction: FocusDirection, count: u32) {
        let id = self.window.focused_mut().focus_history(direction, count);
        let name = self
            .views
            .get(id)
            .expect("invariant: pane jump lists only hold live views")
            .short_name
            .clone();
        self.registers.set_current_buffer(&name);
    }

    pub fn lobby_line(&mut self, text: impl Into<String>) {
        self.views
            .get_mut(self.lobby)
            .expect("invariant: lobby view lives for the whole process")
            .push_line(LogLine::system(text));
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
