use std::collections::HashMap;

use tracing::{error, info};

use crate::backend::BackendEvent;
use crate::backend::gateway::BackendGateway;
use crate::command::{self, Command};
use crate::event::AppEvent;
use crate::input::{SimpleInputFsm, ViInputFsm};
use crate::intent::{
    CompleteDirection, Direction, EditKind, FocusDirection, FocusTarget, Intent, Mode, Motion,
    Movement, WindowOp,
};
use crate::state::buffer::{BufferWarning, TextBuffer};
use crate::state::registers::RegisterStore;
use crate::state::view::{LogLine, View};
use crate::state::{AppState, Focus};

/// What the event loop should do after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
    Suspend,
}

/// Routes events into the focused FSM and the resulting intents into the
/// buffer, window tree, status line, and command interpreter.
pub struct IntentHandler {
    vi: ViInputFsm,
    simple: SimpleInputFsm,
    insert_run: String,
    history_fresh: bool,
    marks: HashMap<char, usize>,
}

impl IntentHandler {
    pub fn new() -> Self {
        Self {
            vi: ViInputFsm::new(),
            simple: SimpleInputFsm::new(),
            insert_run: String::new(),
            history_fresh: false,
            marks: HashMap::new(),
        }
    }

    pub fn apply(
        &mut self,
        state: &mut AppState,
        gateway: &BackendGateway,
        event: AppEvent,
    ) -> Flow {
        match event {
            AppEvent::Key(key) => {
                let intents = match state.focus {
                    Focus::Command => self.simple.handle(key),
                    Focus::Pane => self.vi.handle(key),
                };
                for intent in intents {
                    let flow = self.apply_intent(state, gateway, intent);
                    if flow != Flow::Continue {
                        return flow;
                    }
                }
                if state.focus == Focus::Pane {
                    state.mode = self.vi.mode();
                }
                Flow::Continue
            }
            AppEvent::Resize { width, height } => {
                state.viewport = (width, height);
                Flow::Continue
            }
            AppEvent::Tick => Flow::Continue,
            AppEvent::Backend(event) => {
                self.apply_backend(state, event);
                Flow::Continue
            }
        }
    }

    fn apply_intent(
        &mut self,
        state: &mut AppState,
        gateway: &BackendGateway,
        intent: Intent,
    ) -> Flow {
        match intent {
            Intent::Clamp => with_buffer(state, |buffer, _| buffer.clamp()),
            Intent::Checkpoint => with_buffer(state, |buffer, _| buffer.checkpoint()),
            Intent::Edit { kind, motion } => {
                with_buffer(state, |buffer, registers| buffer.edit(kind, motion, registers));
            }
            Intent::Type(ch) => {
                if state.focus == Focus::Pane && state.mode == Mode::Insert {
                    self.insert_run.push(ch);
                }
                with_buffer(state, |buffer, _| buffer.type_char(ch));
            }
            Intent::Replace { ch, typing, motion } => {
                with_buffer(state, |buffer, _| buffer.replace(ch, typing, motion));
            }
            Intent::Paste {
                side,
                register,
                count,
            } => {
                let result =
                    with_buffer(state, |buffer, registers| {
                        buffer.paste(side, register, count, registers)
                    });
                if let Err(BufferWarning::EmptyRegister(register)) = result {
                    state.status.message(format!("Nothing in register {register}"));
                }
            }
            Intent::Scroll {
                direction,
                kind,
                count,
            } => {
                let rows = self.focused_pane_rows(state);
                state.current_view_mut().scroll_log(direction, kind, count, rows);
            }
            Intent::Mark(mark) => {
                let x = state.current_view().buffer.cursor().x;
                self.marks.insert(mark, x);
            }
            Intent::LineJump(mark) => {
                if self.marks.contains_key(&mark) {
                    with_buffer(state, |buffer, registers| {
                        buffer.edit(
                            EditKind::Move,
                            Motion::new(Movement::Line, Direction::FirstWord),
                            registers,
                        );
                    });
                } else {
                    state.status.message(format!("Unknown mark: {mark}"));
                }
            }
            Intent::CharJump(mark) => match self.marks.get(&mark).copied() {
                Some(x) => with_buffer(state, |buffer, registers| {
                    let target = x.min(buffer.char_len());
                    buffer.edit(
                        EditKind::Move,
                        Motion::new(Movement::Line, Direction::Left),
                        registers,
                    );
                    if target > 0 {
                        buffer.edit(
                            EditKind::Move,
                            Motion::new(Movement::Char, Direction::Right)
                                .with_count(target as u32),
                            registers,
                        );
                    }
                }),
                None => state.status.message("Mark not set"),
            },
            Intent::Focus {
                target,
                direction,
                count,
            } => return self.apply_focus(state, target, direction, count),
            Intent::Window {
                op,
                direction,
                count,
            } => self.apply_window(state, op, direction, count),
            Intent::Submit => return self.apply_submit(state, gateway),
            Intent::Clear => with_buffer(state, |buffer, _| buffer.clear()),
            Intent::Suspend => return Flow::Suspend,
            Intent::Refresh => {}
            Intent::Complete(direction) => self.apply_complete(state, direction),
            Intent::Undo(count) => with_buffer(state, |buffer, _| buffer.undo(count)),
            Intent::Redo(count) => with_buffer(state, |buffer, _| buffer.redo(count)),
            Intent::Mode(mode) => self.apply_mode(state, mode),
            Intent::Switch => {
                state.command.clear();
                state.focus = Focus::Pane;
                state.status.mode_changed(Mode::Normal);
            }
            Intent::Warn(message) => state.status.message(message),
        }
        Flow::Continue
    }

    fn apply_mode(&mut self, state: &mut AppState, mode: Mode) {
        state.mode = mode;
        state.status.mode_changed(mode);
        match mode {
            Mode::Insert => self.insert_run.clear(),
            Mode::Visual => with_buffer(state, |buffer, _| buffer.start_highlight()),
            Mode::Normal => {
                if !self.insert_run.is_empty() {
                    state.registers.set_last_insert(&self.insert_run);
                    self.insert_run.clear();
                }
            }
            Mode::Replace => {}
        }
    }

    fn apply_focus(
        &mut self,
        state: &mut AppState,
        target: FocusTarget,
        direction: Option<FocusDirection>,
        count: u32,
    ) -> Flow {
        match target {
            FocusTarget::Command => {
                state.command.clear();
                state.focus = Focus::Command;
                self.history_fresh = true;
            }
            FocusTarget::Lobby => {
                let lobby = state.lobby;
                state.show_view(lobby);
            }
            FocusTarget::Window => {
                let direction = direction.unwrap_or(FocusDirection::Next);
                if let Err(message) = state.window.focus(direction, count) {
                    state.status.message(message);
                }
            }
            FocusTarget::History => {
                let direction = direction.unwrap_or(FocusDirection::Previous);
                if state.focus == Focus::Command {
                    self.recall_command_history(state, direction, count);
                } else {
                    state.walk_pane_history(direction, count);
                }
            }
        }
        Flow::Continue
    }

    fn recall_command_history(
        &mut self,
        state: &mut AppState,
        direction: FocusDirection,
        count: u32,
    ) {
        if state.command_history.is_empty() {
            return;
        }
        let count = count.max(1) as usize;
        let recalled = match direction {
            FocusDirection::Next => state.command_history.next(count).clone(),
            _ => {
                // the first recall lands on the most recent entry itself
                if self.history_fresh {
                    self.history_fresh = false;
                    state.command_history.current().clone()
                } else {
                    state.command_history.prev(count).clone()
                }
            }
        };
        state.command.clear();
        for ch in recalled.chars() {
            state.command.type_char(ch);
        }
    }

    fn apply_window(&mut self, state: &mut AppState, op: WindowOp, direction: Direction, count: u32) {
        let content_height = content_height(state);
        match op {
            WindowOp::Split => {
                let result = match direction {
                    Direction::Right => state.window.vsplit(),
                    _ => {
                        let height = (count > 0).then_some(count as u16);
                        state.window.hsplit(content_height, height)
                    }
                };
                if let Err(message) = result {
                    state.status.message(message);
                }
            }
            WindowOp::Resize => match direction {
                Direction::Up => state.window.hresize(-(count.max(1) as i32), content_height),
                Direction::Down => state.window.hresize(count.max(1) as i32, content_height),
                _ => state
                    .status
                    .message("Vertical splits not yet supported".to_string()),
            },
            WindowOp::Equalize => state.window.eresize(),
            WindowOp::Rotate => state.window.rotate(direction == Direction::Up, count.max(1)),
        }
    }

    fn apply_submit(&mut self, state: &mut AppState, gateway: &BackendGateway) -> Flow {
        if state.focus == Focus::Command {
            let line = state.command.take();
            state.focus = Focus::Pane;
            state.status.mode_changed(Mode::Normal);
            if line.trim().is_empty() {
                return Flow::Continue;
            }
            state.registers.set_last_command(&line);
            state.command_history.append(line.clone());
            self.history_fresh = true;
            return self.execute_command(state, gateway, &line);
        }

        let room_id = state.current_view().room_id.clone();
        let text = state.current_view_mut().buffer.take();
        if text.is_empty() {
            return Flow::Continue;
        }
        if room_id == "lobby" {
            state.status.message("Cannot send to the lobby");
            return Flow::Continue;
        }
        info!("send: room={} chars={}", room_id, text.chars().count());
        if gateway.send_message(room_id, text).is_err() {
            state.status.message("Backend worker is gone");
        }
        Flow::Continue
    }

    fn execute_command(
        &mut self,
        state: &mut AppState,
        gateway: &BackendGateway,
        line: &str,
    ) -> Flow {
        let command = match command::parse(line) {
            Ok(command) => command,
            Err(err) => {
                state.status.message(err.to_string());
                return Flow::Continue;
            }
        };

        match command {
            Command::Dm { user } => {
                state.status.message(format!("Looking up {user}"));
                if gateway.open_room(user, true).is_err() {
                    state.status.message("Backend worker is gone");
                }
            }
            Command::Join { room } => {
                state.status.message(format!("Joining {room}"));
                if gateway.open_room(room, false).is_err() {
                    state.status.message("Backend worker is gone");
                }
            }
            Command::Split => {
                let height = content_height(state);
                if let Err(message) = state.window.hsplit(height, None) {
                    state.status.message(message);
                }
            }
            Command::VSplit => {
                if let Err(message) = state.window.vsplit() {
                    state.status.message(message);
                }
            }
            Command::Quit => {
                if state.window.close() {
                    return Flow::Quit;
                }
            }
            Command::QuitAll => return Flow::Quit,
            Command::Shell => return Flow::Suspend,
            Command::Registers => {
                let dump = state.registers.dump();
                state.lobby_line("registers:");
                for (name, value) in dump {
                    state.lobby_line(format!("  \"{name}  {value}"));
                }
                let lobby = state.lobby;
                state.show_view(lobby);
            }
            Command::Help { topic } => {
                for line in command::help_lines(topic.as_deref()) {
                    state.lobby_line(line);
                }
                let lobby = state.lobby;
                state.show_view(lobby);
            }
        }
        Flow::Continue
    }

    fn apply_complete(&mut self, state: &mut AppState, direction: CompleteDirection) {
        match state.focus {
            Focus::Command => {
                let completer = |stem: &str| command::completions(stem);
                state.command.complete(direction, &completer);
            }
            Focus::Pane => {
                let View {
                    buffer, members, ..
                } = state.current_view_mut();
                let completer = |stem: &str| crate::state::view::member_suffixes(members, stem);
                buffer.complete(direction, &completer);
            }
        }
    }

    fn apply_backend(&mut self, state: &mut AppState, event: BackendEvent) {
        match event {
            BackendEvent::Connected { user } => {
                info!("connected: {}", user);
                state.lobby_line(format!("Connected as {user}"));
                state.status.message(format!("Connected as {user}"));
            }
            BackendEvent::Reconnected => {
                state.lobby_line("Reconnected");
            }
            BackendEvent::RoomOpened(summary) => {
                let id = state.ensure_view(&summary.id, &summary.name);
                let view = state
                    .views
                    .get_mut(id)
                    .expect("invariant: ensure_view returns a live view");
                view.members = summary.members;
                if view.log.is_empty() {
                    for message in summary.backlog {
                        view.push_line(LogLine::message(
                            message.speaker,
                            message.text,
                            message.created_ms,
                        ));
                    }
                }
                state.show_view(id);
                state.status.message(summary.name);
            }
            BackendEvent::RoomNotFound { name, direct } => {
                let kind = if direct { "user" } else { "room" };
                state.status.message(format!("No such {kind}: {name}"));
            }
            BackendEvent::MessageReceived { room_id, message } => {
                let Some(id) = state.view_by_room(&room_id) else {
                    error!("message for unknown room: {}", room_id);
                    return;
                };
                let view = state
                    .views
                    .get_mut(id)
                    .expect("invariant: looked-up views exist");
                view.push_line(LogLine::message(
                    message.speaker,
                    message.text,
                    message.created_ms,
                ));
            }
            BackendEvent::SendFailed { room_id, preview } => {
                let Some(id) = state.view_by_room(&room_id) else {
                    return;
                };
                let view = state
                    .views
                    .get_mut(id)
                    .expect("invariant: looked-up views exist");
                view.push_line(LogLine::system(format!("Failed to send message: {preview}")));
            }
        }
    }

    fn focused_pane_rows(&self, state: &AppState) -> usize {
        let content = content_height(state);
        if state.window.zoomed() {
            return content.saturating_sub(2) as usize;
        }
        let heights = state.window.layout(content);
        heights
            .get(state.window.focus_index())
            .copied()
            .unwrap_or(content)
            .saturating_sub(2) as usize
    }
}

impl Default for IntentHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Reserved rows: the top bar and the status line.
fn content_height(state: &AppState) -> u16 {
    state.viewport.1.saturating_sub(2)
}

/// Hands the focused buffer and the register store to `f` without tripping
/// over the borrow checker.
fn with_buffer<R>(
    state: &mut AppState,
    f: impl FnOnce(&mut TextBuffer, &mut RegisterStore) -> R,
) -> R {
    match state.focus {
        Focus::Command => f(&mut state.command, &mut state.registers),
        Focus::Pane => {
            let id = state.window.focused().current_view();
            let view = state
                .views
                .get_mut(id)
                .expect("invariant: pane jump lists only hold live views");
            f(&mut view.buffer, &mut state.registers)
        }
    }
}
