use crate::input::{KeyInput, SpecialKey};
use crate::intent::{
    CompleteDirection, Direction, EditKind, FocusDirection, FocusTarget, Intent, Mode, Motion,
    Movement, PasteSide, ScrollKind, WindowOp,
};
use crate::state::registers::{RegisterStore, UNNAMED};

/// FSM states. `Normal`, `Insert`, `Replace`, and `Visual` are the modes the
/// user sees; the rest are transient operand states waiting for one more key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViState {
    Normal,
    Insert,
    Replace,
    Visual,
    Movement,
    Goto,
    CharSearch,
    Mark,
    LineJump,
    CharJump,
    Register,
    WinCmd,
    CharReplace,
    VisReplace,
    Paste,
}

#[derive(Debug, Clone, Copy)]
struct CharSearch {
    movement: Movement,
    direction: Direction,
    character: char,
}

/// Ambient state carried across transitions: the count prefix, the selected
/// register, the last character search, and the pending operator.
#[derive(Debug)]
struct Context {
    count: u32,
    register: Option<char>,
    last_charsearch: Option<CharSearch>,
    pending_charsearch: Option<(Movement, Direction)>,
    movement_action: Option<EditKind>,
    movement_poststate: ViState,
    movement_actchar: char,
    checkpoint_pending: bool,
    register_return: ViState,
    paste_return: ViState,
}

impl Context {
    fn new() -> Self {
        Self {
            count: 0,
            register: None,
            last_charsearch: None,
            pending_charsearch: None,
            movement_action: None,
            movement_poststate: ViState::Normal,
            movement_actchar: ' ',
            checkpoint_pending: false,
            register_return: ViState::Normal,
            paste_return: ViState::Insert,
        }
    }
}

/// Vi keymap: translates key events into a stream of editing intents.
pub struct ViInputFsm {
    state: ViState,
    cx: Context,
}

impl ViInputFsm {
    pub fn new() -> Self {
        Self {
            state: ViState::Normal,
            cx: Context::new(),
        }
    }

    pub fn state(&self) -> ViState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        match self.state {
            ViState::Insert => Mode::Insert,
            ViState::Replace => Mode::Replace,
            ViState::Visual | ViState::VisReplace => Mode::Visual,
            ViState::Paste => match self.cx.paste_return {
                ViState::Replace => Mode::Replace,
                _ => Mode::Insert,
            },
            _ => Mode::Normal,
        }
    }

    pub fn handle(&mut self, key: KeyInput) -> Vec<Intent> {
        let mut out = Vec::new();
        match self.state {
            ViState::Normal => self.handle_normal(key, &mut out),
            ViState::Insert => self.handle_insert(key, &mut out),
            ViState::Replace => self.handle_replace(key, &mut out),
            ViState::Visual => self.handle_visual(key, &mut out),
            ViState::Movement => self.handle_movement(key, &mut out),
            ViState::Goto => self.handle_goto(key, &mut out),
            ViState::CharSearch => self.handle_charsearch(key, &mut out),
            ViState::Mark => self.handle_single_char(key, &mut out, Intent::Mark),
            ViState::LineJump => self.handle_single_char(key, &mut out, Intent::LineJump),
            ViState::CharJump => self.handle_single_char(key, &mut out, Intent::CharJump),
            ViState::Register => self.handle_register(key, &mut out),
            ViState::WinCmd => self.handle_wincmd(key, &mut out),
            ViState::CharReplace => self.handle_charreplace(key, &mut out),
            ViState::VisReplace => self.handle_visreplace(key, &mut out),
            ViState::Paste => self.handle_paste(key, &mut out),
        }
        out
    }

    // ── shared helpers ──

    fn take_count(&mut self) -> u32 {
        let count = if self.cx.count == 0 { 1 } else { self.cx.count };
        self.cx.count = 0;
        count
    }

    fn take_register(&mut self) -> char {
        self.cx.register.take().unwrap_or(UNNAMED)
    }

    fn motion(&mut self, movement: Movement, direction: Direction) -> Motion {
        let count = self.take_count();
        let register = self.take_register();
        Motion::new(movement, direction)
            .with_count(count)
            .with_register(register)
    }

    fn enter_insert(&mut self, out: &mut Vec<Intent>) {
        self.state = ViState::Insert;
        out.push(Intent::Mode(Mode::Insert));
    }

    fn enter_replace(&mut self, out: &mut Vec<Intent>) {
        self.state = ViState::Replace;
        out.push(Intent::Mode(Mode::Replace));
    }

    fn enter_visual(&mut self, out: &mut Vec<Intent>) {
        self.state = ViState::Visual;
        out.push(Intent::Mode(Mode::Visual));
    }

    /// Entry into normal fires the clamp, then a checkpoint if a mutating
    /// action is still unconfirmed, then the mode notification.
    fn enter_normal(&mut self, out: &mut Vec<Intent>) {
        let changed_mode = self.state != ViState::Normal;
        self.state = ViState::Normal;
        out.push(Intent::Clamp);
        if self.cx.checkpoint_pending {
            self.cx.checkpoint_pending = false;
            out.push(Intent::Checkpoint);
        }
        if changed_mode {
            out.push(Intent::Mode(Mode::Normal));
        }
    }

    fn cancel_pending(&mut self) {
        self.cx.count = 0;
        self.cx.register = None;
        self.cx.movement_action = None;
        self.cx.pending_charsearch = None;
        self.state = ViState::Normal;
    }

    /// Resolves a completed motion: either the operand of a pending operator
    /// or a bare move / highlight extension.
    fn apply_motion(&mut self, motion: Motion, out: &mut Vec<Intent>) {
        if let Some(action) = self.cx.movement_action.take() {
            self.cx.checkpoint_pending |= mutates(action);
            out.push(Intent::Edit { kind: action, motion });
            if self.cx.movement_poststate == ViState::Insert {
                self.enter_insert(out);
            } else {
                self.enter_normal(out);
            }
            return;
        }

        if matches!(self.state, ViState::Visual)
            || (self.state == ViState::CharSearch && self.cx.register_return == ViState::Visual)
        {
            out.push(Intent::Edit {
                kind: EditKind::Highlight,
                motion,
            });
            self.state = ViState::Visual;
            return;
        }

        out.push(Intent::Edit {
            kind: EditKind::Move,
            motion,
        });
        self.state = ViState::Normal;
    }

    /// Motion keys shared by normal, visual, and operator-pending states.
    /// Returns true when the key was consumed.
    fn process_movement_key(&mut self, key: KeyInput, out: &mut Vec<Intent>) -> bool {
        match key {
            KeyInput::Press(digit @ '1'..='9') => {
                self.push_count_digit(digit);
            }
            KeyInput::Press('0') if self.cx.count != 0 => {
                self.push_count_digit('0');
            }
            KeyInput::Press('0') => {
                let motion = self.motion(Movement::Line, Direction::Left);
                self.apply_motion(motion, out);
            }
            KeyInput::Press('h') | KeyInput::Special(SpecialKey::Left, _) => {
                let motion = self.motion(Movement::Char, Direction::Left);
                self.apply_motion(motion, out);
            }
            KeyInput::Press('l') | KeyInput::Special(SpecialKey::Right, _) => {
                let motion = self.motion(Movement::Char, Direction::Right);
                self.apply_motion(motion, out);
            }
            KeyInput::Press('w') => {
                let motion = self.motion(Movement::WordBegin, Direction::Right);
                self.apply_motion(motion, out);
            }
            KeyInput::Press('b') => {
                let motion = self.motion(Movement::WordBegin, Direction::Left);
                self.apply_motion(motion, out);
            }
            KeyInput::Press('e') => {
                let motion = self.motion(Movement::WordEnd, Direction::Right);
                self.apply_motion(motion, out);
            }
            KeyInput::Press('^') => {
                let motion = self.motion(Movement::Line, Direction::FirstWord);
                self.apply_motion(motion, out);
            }
            KeyInput::Press('$') | KeyInput::Special(SpecialKey::End, _) => {
                let motion = self.motion(Movement::Line, Direction::Right);
                self.apply_motion(motion, out);
            }
            KeyInput::Special(SpecialKey::Home, _) => {
                let motion = self.motion(Movement::Line, Direction::Left);
                self.apply_motion(motion, out);
            }
            KeyInput::Press('f') => self.pend_charsearch(Movement::ToChar, Direction::Right),
            KeyInput::Press('F') => self.pend_charsearch(Movement::ToChar, Direction::Left),
            KeyInput::Press('t') => self.pend_charsearch(Movement::TillChar, Direction::Right),
            KeyInput::Press('T') => self.pend_charsearch(Movement::TillChar, Direction::Left),
            KeyInput::Press(';') => self.repeat_charsearch(false, out),
            KeyInput::Press(',') => self.repeat_charsearch(true, out),
            _ => return false,
        }
        true
    }

    fn push_count_digit(&mut self, digit: char) {
        let value = digit.to_digit(10).unwrap_or(0);
        self.cx.count = self.cx.count.saturating_mul(10).saturating_add(value);
    }

    fn pend_charsearch(&mut self, movement: Movement, direction: Direction) {
        self.cx.pending_charsearch = Some((movement, direction));
        self.cx.register_return = if self.state == ViState::Visual {
            ViState::Visual
        } else {
            ViState::Normal
        };
        self.state = ViState::CharSearch;
    }

    fn repeat_charsearch(&mut self, reverse: bool, out: &mut Vec<Intent>) {
        let Some(last) = self.cx.last_charsearch else {
            self.cx.count = 0;
            return;
        };
        let direction = if reverse {
            match last.direction {
                Direction::Left => Direction::Right,
                _ => Direction::Left,
            }
        } else {
            last.direction
        };
        let motion = self
            .motion(last.movement, direction)
            .with_char(last.character);
        self.apply_motion(motion, out);
    }

    // ── per-state handlers ──

    fn handle_normal(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        if self.process_movement_key(key, out) {
            return;
        }

        match key {
            KeyInput::Press('i') => self.enter_insert(out),
            KeyInput::Press('I') => {
                let motion = self.motion(Movement::Line, Direction::FirstWord);
                out.push(Intent::Edit {
                    kind: EditKind::Move,
                    motion,
                });
                self.enter_insert(out);
            }
            KeyInput::Press('a') => {
                let motion = self.motion(Movement::Char, Direction::Right);
                out.push(Intent::Edit {
                    kind: EditKind::Move,
                    motion,
                });
                self.enter_insert(out);
            }
            KeyInput::Press('A') => {
                let motion = self.motion(Movement::Line, Direction::Right);
                out.push(Intent::Edit {
                    kind: EditKind::Move,
                    motion,
                });
                self.enter_insert(out);
            }
            KeyInput::Press('v') => self.enter_visual(out),
            KeyInput::Press('R') => self.enter_replace(out),
            KeyInput::Press('r') => self.state = ViState::CharReplace,
            KeyInput::Press('y') => self.pend_operator(EditKind::Yank, 'y', ViState::Normal),
            KeyInput::Press('d') => self.pend_operator(EditKind::Delete, 'd', ViState::Normal),
            KeyInput::Press('c') => self.pend_operator(EditKind::Delete, 'c', ViState::Insert),
            KeyInput::Press('x') => {
                let motion = self.motion(Movement::Char, Direction::Right);
                out.push(Intent::Edit {
                    kind: EditKind::Delete,
                    motion,
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            KeyInput::Press('X') => {
                let motion = self.motion(Movement::Char, Direction::Left);
                out.push(Intent::Edit {
                    kind: EditKind::Delete,
                    motion,
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            KeyInput::Press('D') => {
                let motion = self.motion(Movement::Line, Direction::Right);
                out.push(Intent::Edit {
                    kind: EditKind::Delete,
                    motion,
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            KeyInput::Press('C') => {
                let motion = self.motion(Movement::Line, Direction::Right);
                out.push(Intent::Edit {
                    kind: EditKind::Delete,
                    motion,
                });
                self.cx.checkpoint_pending = true;
                self.enter_insert(out);
            }
            KeyInput::Press('~') => {
                let motion = self.motion(Movement::Char, Direction::Right);
                out.push(Intent::Edit {
                    kind: EditKind::ToggleCase,
                    motion,
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            KeyInput::Press('p') => {
                let count = self.take_count();
                let register = self.take_register();
                out.push(Intent::Paste {
                    side: PasteSide::After,
                    register,
                    count,
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            KeyInput::Press('P') => {
                let count = self.take_count();
                let register = self.take_register();
                out.push(Intent::Paste {
                    side: PasteSide::Before,
                    register,
                    count,
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            KeyInput::Press('u') => {
                out.push(Intent::Undo(self.take_count()));
                out.push(Intent::Clamp);
            }
            KeyInput::Control('r') => {
                out.push(Intent::Redo(self.take_count()));
                out.push(Intent::Clamp);
            }
            KeyInput::Press('g') => self.state = ViState::Goto,
            KeyInput::Press('G') => {
                let count = self.take_count();
                out.push(Intent::Scroll {
                    direction: Direction::Down,
                    kind: ScrollKind::Bottom,
                    count,
                });
            }
            KeyInput::Press('m') => self.state = ViState::Mark,
            KeyInput::Press('\'') => self.state = ViState::LineJump,
            KeyInput::Press('`') => self.state = ViState::CharJump,
            KeyInput::Press('"') => {
                self.cx.register_return = ViState::Normal;
                self.state = ViState::Register;
            }
            KeyInput::Press(':') => {
                self.cx.count = 0;
                self.cx.register = None;
                out.push(Intent::Focus {
                    target: FocusTarget::Command,
                    direction: None,
                    count: 1,
                });
            }
            KeyInput::Press('j') | KeyInput::Special(SpecialKey::Down, _) => {
                let count = self.take_count();
                out.push(Intent::Scroll {
                    direction: Direction::Down,
                    kind: ScrollKind::Line,
                    count,
                });
            }
            KeyInput::Press('k') | KeyInput::Special(SpecialKey::Up, _) => {
                let count = self.take_count();
                out.push(Intent::Scroll {
                    direction: Direction::Up,
                    kind: ScrollKind::Line,
                    count,
                });
            }
            KeyInput::Control('e') => {
                let count = self.take_count();
                out.push(Intent::Scroll {
                    direction: Direction::Down,
                    kind: ScrollKind::Line,
                    count,
                });
            }
            KeyInput::Control('y') => {
                let count = self.take_count();
                out.push(Intent::Scroll {
                    direction: Direction::Up,
                    kind: ScrollKind::Line,
                    count,
                });
            }
            KeyInput::Control('d') | KeyInput::Special(SpecialKey::PageDown, _) => {
                let count = self.take_count();
                out.push(Intent::Scroll {
                    direction: Direction::Down,
                    kind: ScrollKind::Screen,
                    count,
                });
            }
            KeyInput::Control('u') | KeyInput::Special(SpecialKey::PageUp, _) => {
                let count = self.take_count();
                out.push(Intent::Scroll {
                    direction: Direction::Up,
                    kind: ScrollKind::Screen,
                    count,
                });
            }
            KeyInput::Control('o') => {
                let count = self.take_count();
                out.push(Intent::Focus {
                    target: FocusTarget::History,
                    direction: Some(FocusDirection::Previous),
                    count,
                });
            }
            KeyInput::Control('i') => {
                let count = self.take_count();
                out.push(Intent::Focus {
                    target: FocusTarget::History,
                    direction: Some(FocusDirection::Next),
                    count,
                });
            }
            KeyInput::Control('w') => self.state = ViState::WinCmd,
            KeyInput::Control('m') | KeyInput::Control('j') => {
                self.cx.count = 0;
                out.push(Intent::Submit);
            }
            KeyInput::Control('l') => out.push(Intent::Refresh),
            KeyInput::Control('z') => out.push(Intent::Suspend),
            KeyInput::Control('c') => {
                if self.cx.count == 0 && self.cx.register.is_none() {
                    out.push(Intent::Warn("Type :quit<Enter> to exit".to_string()));
                } else {
                    self.cancel_pending();
                }
            }
            KeyInput::Control('[') => self.cancel_pending(),
            _ => out.push(self.warn_unhandled(key)),
        }
    }

    fn handle_insert(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        match key {
            KeyInput::Press(ch) => out.push(Intent::Type(ch)),
            KeyInput::Control('[') | KeyInput::Control('c') => self.enter_normal(out),
            KeyInput::Control('m') | KeyInput::Control('j') => out.push(Intent::Submit),
            KeyInput::Special(SpecialKey::Backspace, _) | KeyInput::Control('h') => {
                out.push(Intent::Edit {
                    kind: EditKind::Delete,
                    motion: Motion::new(Movement::Char, Direction::Left).with_register('_'),
                });
            }
            KeyInput::Special(SpecialKey::Delete, _) => {
                out.push(Intent::Edit {
                    kind: EditKind::Delete,
                    motion: Motion::new(Movement::Char, Direction::Right).with_register('_'),
                });
            }
            KeyInput::Control('w') => {
                out.push(Intent::Edit {
                    kind: EditKind::Delete,
                    motion: Motion::new(Movement::WordBegin, Direction::Left).with_register('_'),
                });
            }
            KeyInput::Control('u') => out.push(Intent::Clear),
            KeyInput::Control('i') => out.push(Intent::Complete(CompleteDirection::Next)),
            KeyInput::Special(SpecialKey::BackTab, _) => {
                out.push(Intent::Complete(CompleteDirection::Previous));
            }
            KeyInput::Control('r') => {
                self.cx.paste_return = ViState::Insert;
                self.state = ViState::Paste;
            }
            KeyInput::Special(special, _) => self.move_special(special, out),
            _ => out.push(self.warn_unhandled(key)),
        }
        if self.state == ViState::Insert && mutating_insert_key(key) {
            self.cx.checkpoint_pending = true;
        }
    }

    fn handle_replace(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        match key {
            KeyInput::Press(ch) => {
                out.push(Intent::Replace {
                    ch,
                    typing: true,
                    motion: Motion::new(Movement::Char, Direction::Right),
                });
                self.cx.checkpoint_pending = true;
            }
            KeyInput::Control('[') | KeyInput::Control('c') => self.enter_normal(out),
            KeyInput::Control('m') | KeyInput::Control('j') => out.push(Intent::Submit),
            KeyInput::Special(SpecialKey::Backspace, _) | KeyInput::Control('h') => {
                out.push(Intent::Edit {
                    kind: EditKind::Erase,
                    motion: Motion::new(Movement::Char, Direction::Left),
                });
                self.cx.checkpoint_pending = true;
            }
            KeyInput::Control('r') => {
                self.cx.paste_return = ViState::Replace;
                self.state = ViState::Paste;
            }
            KeyInput::Special(special, _) => self.move_special(special, out),
            _ => out.push(self.warn_unhandled(key)),
        }
    }

    fn handle_visual(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        if self.process_movement_key(key, out) {
            return;
        }

        let highlight = |fsm: &mut Self| {
            let count = fsm.take_count();
            let register = fsm.take_register();
            Motion::new(Movement::Highlight, Direction::Right)
                .with_count(count)
                .with_register(register)
        };

        match key {
            KeyInput::Press('d') | KeyInput::Press('x') => {
                let motion = highlight(self);
                out.push(Intent::Edit {
                    kind: EditKind::Delete,
                    motion,
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            KeyInput::Press('c') => {
                let motion = highlight(self);
                out.push(Intent::Edit {
                    kind: EditKind::Delete,
                    motion,
                });
                self.cx.checkpoint_pending = true;
                self.enter_insert(out);
            }
            KeyInput::Press('y') => {
                let motion = highlight(self);
                out.push(Intent::Edit {
                    kind: EditKind::Yank,
                    motion,
                });
                self.enter_normal(out);
            }
            KeyInput::Press('~') => {
                let motion = highlight(self);
                out.push(Intent::Edit {
                    kind: EditKind::ToggleCase,
                    motion,
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            KeyInput::Press('u') => {
                let motion = highlight(self);
                out.push(Intent::Edit {
                    kind: EditKind::Lowercase,
                    motion,
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            KeyInput::Press('U') => {
                let motion = highlight(self);
                out.push(Intent::Edit {
                    kind: EditKind::Uppercase,
                    motion,
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            KeyInput::Press('o') => {
                let motion = highlight(self);
                out.push(Intent::Edit {
                    kind: EditKind::Highlight,
                    motion,
                });
            }
            KeyInput::Press('r') => self.state = ViState::VisReplace,
            KeyInput::Press('"') => {
                self.cx.register_return = ViState::Visual;
                self.state = ViState::Register;
            }
            KeyInput::Press('v') | KeyInput::Control('[') | KeyInput::Control('c') => {
                self.enter_normal(out);
            }
            _ => out.push(self.warn_unhandled(key)),
        }
    }

    fn handle_movement(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        if self.process_movement_key(key, out) {
            return;
        }

        match key {
            KeyInput::Press(ch) if ch == self.cx.movement_actchar => {
                let motion = self.motion(Movement::Line, Direction::Down);
                self.apply_motion(motion, out);
            }
            KeyInput::Control('[') | KeyInput::Control('c') => self.cancel_pending(),
            _ => {
                out.push(self.warn_unhandled(key));
                self.cancel_pending();
            }
        }
    }

    fn handle_goto(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        match key {
            KeyInput::Press('g') => {
                let count = self.take_count();
                out.push(Intent::Scroll {
                    direction: Direction::Up,
                    kind: ScrollKind::Top,
                    count,
                });
                self.state = ViState::Normal;
            }
            KeyInput::Press('u') => self.pend_operator(EditKind::Lowercase, 'u', ViState::Normal),
            KeyInput::Press('U') => self.pend_operator(EditKind::Uppercase, 'U', ViState::Normal),
            KeyInput::Press('~') => self.pend_operator(EditKind::ToggleCase, '~', ViState::Normal),
            KeyInput::Control('[') | KeyInput::Control('c') => self.cancel_pending(),
            _ => {
                out.push(self.warn_unhandled(key));
                self.cancel_pending();
            }
        }
    }

    fn handle_charsearch(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        let Some((movement, direction)) = self.cx.pending_charsearch.take() else {
            self.cancel_pending();
            return;
        };
        match key {
            KeyInput::Press(ch) => {
                self.cx.last_charsearch = Some(CharSearch {
                    movement,
                    direction,
                    character: ch,
                });
                let motion = self.motion(movement, direction).with_char(ch);
                self.apply_motion(motion, out);
            }
            _ => {
                let back = self.cx.register_return;
                self.cx.movement_action = None;
                self.cx.count = 0;
                self.state = back;
            }
        }
    }

    fn handle_single_char(
        &mut self,
        key: KeyInput,
        out: &mut Vec<Intent>,
        build: impl FnOnce(char) -> Intent,
    ) {
        match key {
            KeyInput::Press(ch) => {
                out.push(build(ch.to_ascii_lowercase()));
                self.state = ViState::Normal;
            }
            _ => self.cancel_pending(),
        }
    }

    fn handle_register(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        let back = self.cx.register_return;
        match key {
            KeyInput::Press(ch) if RegisterStore::is_valid_name(ch) => {
                self.cx.register = Some(ch);
                self.state = back;
            }
            KeyInput::Press(ch) => {
                out.push(Intent::Warn(format!("Not a register: {ch}")));
                self.state = back;
            }
            _ => self.state = back,
        }
    }

    fn handle_wincmd(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        match key {
            KeyInput::Press(digit @ '0'..='9') if digit != '0' || self.cx.count != 0 => {
                self.push_count_digit(digit);
                return;
            }
            KeyInput::Press('h') | KeyInput::Special(SpecialKey::Left, _) => {
                self.push_focus(FocusDirection::Left, out);
            }
            KeyInput::Press('j') | KeyInput::Special(SpecialKey::Down, _) => {
                self.push_focus(FocusDirection::Down, out);
            }
            KeyInput::Press('k') | KeyInput::Special(SpecialKey::Up, _) => {
                self.push_focus(FocusDirection::Up, out);
            }
            KeyInput::Press('l') | KeyInput::Special(SpecialKey::Right, _) => {
                self.push_focus(FocusDirection::Right, out);
            }
            KeyInput::Press('w') => self.push_focus(FocusDirection::Next, out),
            KeyInput::Press('W') => self.push_focus(FocusDirection::Previous, out),
            KeyInput::Press('t') => self.push_focus(FocusDirection::Top, out),
            KeyInput::Press('b') => self.push_focus(FocusDirection::Bottom, out),
            KeyInput::Press('z') => self.push_focus(FocusDirection::Zoom, out),
            KeyInput::Press('s') => {
                let count = self.raw_count();
                out.push(Intent::Window {
                    op: WindowOp::Split,
                    direction: Direction::Down,
                    count,
                });
            }
            KeyInput::Press('v') => {
                let count = self.raw_count();
                out.push(Intent::Window {
                    op: WindowOp::Split,
                    direction: Direction::Right,
                    count,
                });
            }
            KeyInput::Press('-') => self.push_resize(Direction::Up, out),
            KeyInput::Press('+') => self.push_resize(Direction::Down, out),
            KeyInput::Press('<') => self.push_resize(Direction::Left, out),
            KeyInput::Press('>') => self.push_resize(Direction::Right, out),
            KeyInput::Press('=') => {
                self.cx.count = 0;
                out.push(Intent::Window {
                    op: WindowOp::Equalize,
                    direction: Direction::Down,
                    count: 1,
                });
            }
            KeyInput::Press('r') => {
                let count = self.take_count();
                out.push(Intent::Window {
                    op: WindowOp::Rotate,
                    direction: Direction::Down,
                    count,
                });
            }
            KeyInput::Press('R') => {
                let count = self.take_count();
                out.push(Intent::Window {
                    op: WindowOp::Rotate,
                    direction: Direction::Up,
                    count,
                });
            }
            KeyInput::Control('[') | KeyInput::Control('c') => {}
            _ => out.push(self.warn_unhandled(key)),
        }
        self.cx.count = 0;
        self.state = ViState::Normal;
    }

    fn handle_charreplace(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        match key {
            KeyInput::Press(ch) => {
                let motion = self.motion(Movement::Char, Direction::Right);
                out.push(Intent::Replace {
                    ch,
                    typing: false,
                    motion,
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            _ => self.cancel_pending(),
        }
    }

    fn handle_visreplace(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        match key {
            KeyInput::Press(ch) => {
                let count = self.take_count();
                let register = self.take_register();
                out.push(Intent::Replace {
                    ch,
                    typing: false,
                    motion: Motion::new(Movement::Highlight, Direction::Right)
                        .with_count(count)
                        .with_register(register),
                });
                self.cx.checkpoint_pending = true;
                self.enter_normal(out);
            }
            _ => self.state = ViState::Visual,
        }
    }

    fn handle_paste(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        let back = self.cx.paste_return;
        match key {
            KeyInput::Press(ch) if RegisterStore::is_valid_name(ch) => {
                out.push(Intent::Paste {
                    side: PasteSide::Before,
                    register: ch,
                    count: 1,
                });
                self.cx.checkpoint_pending = true;
            }
            KeyInput::Press(ch) => out.push(Intent::Warn(format!("Not a register: {ch}"))),
            _ => {}
        }
        self.state = back;
    }

    fn pend_operator(&mut self, action: EditKind, actchar: char, poststate: ViState) {
        self.cx.movement_action = Some(action);
        self.cx.movement_actchar = actchar;
        self.cx.movement_poststate = poststate;
        self.state = ViState::Movement;
    }

    fn push_focus(&mut self, direction: FocusDirection, out: &mut Vec<Intent>) {
        let count = self.raw_count();
        out.push(Intent::Focus {
            target: FocusTarget::Window,
            direction: Some(direction),
            count,
        });
    }

    fn push_resize(&mut self, direction: Direction, out: &mut Vec<Intent>) {
        let count = self.take_count();
        out.push(Intent::Window {
            op: WindowOp::Resize,
            direction,
            count,
        });
    }

    /// Count without the implicit 1, for intents where "unspecified" and
    /// "one" differ (split height, absolute pane jump).
    fn raw_count(&mut self) -> u32 {
        let count = self.cx.count;
        self.cx.count = 0;
        count
    }

    fn move_special(&mut self, special: SpecialKey, out: &mut Vec<Intent>) {
        let motion = match special {
            SpecialKey::Left => Motion::new(Movement::Char, Direction::Left),
            SpecialKey::Right => Motion::new(Movement::Char, Direction::Right),
            SpecialKey::Home => Motion::new(Movement::Line, Direction::Left),
            SpecialKey::End => Motion::new(Movement::Line, Direction::Right),
            _ => {
                out.push(self.warn_unhandled(KeyInput::Special(special, crate::input::KeyMods::NONE)));
                return;
            }
        };
        out.push(Intent::Edit {
            kind: EditKind::Move,
            motion,
        });
    }

    fn warn_unhandled(&self, key: KeyInput) -> Intent {
        Intent::Warn(format!(
            "Not yet implemented in {} mode: {}",
            state_name(self.state),
            describe_key(key)
        ))
    }
}

impl Default for ViInputFsm {
    fn default() -> Self {
        Self::new()
    }
}

fn mutates(action: EditKind) -> bool {
    matches!(
        action,
        EditKind::Delete
            | EditKind::Erase
            | EditKind::ToggleCase
            | EditKind::Uppercase
            | EditKind::Lowercase
    )
}

fn mutating_insert_key(key: KeyInput) -> bool {
    matches!(
        key,
        KeyInput::Press(_)
            | KeyInput::Special(SpecialKey::Backspace | SpecialKey::Delete, _)
            | KeyInput::Control('h')
            | KeyInput::Control('w')
            | KeyInput::Control('u')
    )
}

fn state_name(state: ViState) -> &'static str {
    match state {
        ViState::Normal => "normal",
        ViState::Insert => "insert",
        ViState::Replace => "replace",
        ViState::Visual => "visual",
        ViState::Movement => "movement",
        ViState::Goto => "goto",
        ViState::CharSearch => "charsearch",
        ViState::Mark => "mark",
        ViState::LineJump => "linejump",
        ViState::CharJump => "charjump",
        ViState::Register => "register",
        ViState::WinCmd => "wincmd",
        ViState::CharReplace => "charreplace",
        ViState::VisReplace => "visreplace",
        ViState::Paste => "paste",
    }
}

fn describe_key(key: KeyInput) -> String {
    match key {
        KeyInput::Press(ch) => ch.to_string(),
        KeyInput::Control(ch) => format!("^{}", ch.to_ascii_uppercase()),
        KeyInput::Special(special, _) => match special {
            SpecialKey::Left => "<left>".to_string(),
            SpecialKey::Right => "<right>".to_string(),
            SpecialKey::Up => "<up>".to_string(),
            SpecialKey::Down => "<down>".to_string(),
            SpecialKey::Home => "<home>".to_string(),
            SpecialKey::End => "<end>".to_string(),
            SpecialKey::PageUp => "<pageup>".to_string(),
            SpecialKey::PageDown => "<pagedown>".to_string(),
            SpecialKey::Delete => "<delete>".to_string(),
            SpecialKey::Backspace => "<backspace>".to_string(),
            SpecialKey::BackTab => "<backtab>".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{ViInputFsm, ViState};
    use crate::input::KeyInput;
    use crate::intent::{
        Direction, EditKind, FocusDirection, FocusTarget, Intent, Mode, Movement, PasteSide,
        ScrollKind, WindowOp,
    };

    fn feed(fsm: &mut ViInputFsm, keys: &str) -> Vec<Intent> {
        let mut intents = Vec::new();
        for ch in keys.chars() {
            intents.extend(fsm.handle(KeyInput::Press(ch)));
        }
        intents
    }

    #[test]
    fn count_prefix_should_scale_char_motion() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "12l");
        assert_eq!(intents.len(), 1);
        let Intent::Edit { kind, motion } = &intents[0] else {
            panic!("expected edit intent, got {:?}", intents[0]);
        };
        assert_eq!(*kind, EditKind::Move);
        assert_eq!(motion.movement, Movement::Char);
        assert_eq!(motion.direction, Direction::Right);
        assert_eq!(motion.count, 12);
    }

    #[test]
    fn bare_zero_should_move_to_line_start() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "0");
        let Intent::Edit { motion, .. } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(motion.movement, Movement::Line);
        assert_eq!(motion.direction, Direction::Left);
    }

    #[test]
    fn zero_after_digits_should_extend_the_count() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "10l");
        let Intent::Edit { motion, .. } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(motion.count, 10);
    }

    #[test]
    fn operator_then_motion_should_emit_operator_edit() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "dw");
        let Intent::Edit { kind, motion } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(*kind, EditKind::Delete);
        assert_eq!(motion.movement, Movement::WordBegin);
        assert_eq!(motion.direction, Direction::Right);
        // mutating action returning to normal checkpoints once
        assert!(intents.contains(&Intent::Clamp));
        assert!(intents.contains(&Intent::Checkpoint));
    }

    #[test]
    fn doubled_operator_key_should_select_line_motion() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "dd");
        let Intent::Edit { kind, motion } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(*kind, EditKind::Delete);
        assert_eq!(motion.movement, Movement::Line);
        assert_eq!(motion.direction, Direction::Down);
    }

    #[test]
    fn change_operator_should_finish_in_insert_mode() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "cw");
        assert!(matches!(
            intents[0],
            Intent::Edit {
                kind: EditKind::Delete,
                ..
            }
        ));
        assert!(intents.contains(&Intent::Mode(Mode::Insert)));
        assert_eq!(fsm.state(), ViState::Insert);
    }

    #[test]
    fn yank_should_not_checkpoint() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "yw");
        assert!(intents.iter().all(|intent| *intent != Intent::Checkpoint));
    }

    #[test]
    fn register_prefix_should_attach_to_the_next_action() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "\"ayw");
        let Intent::Edit { kind, motion } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(*kind, EditKind::Yank);
        assert_eq!(motion.register, 'a');

        // register resets after the action
        let intents = feed(&mut fsm, "yw");
        let Intent::Edit { motion, .. } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(motion.register, '"');
    }

    #[test]
    fn invalid_register_name_should_warn() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "\"!");
        assert!(matches!(&intents[0], Intent::Warn(msg) if msg.contains("register")));
        assert_eq!(fsm.state(), ViState::Normal);
    }

    #[test]
    fn charsearch_should_capture_target_and_allow_repeat() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "fX");
        let Intent::Edit { motion, .. } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(motion.movement, Movement::ToChar);
        assert_eq!(motion.direction, Direction::Right);
        assert_eq!(motion.character, Some('X'));

        let intents = feed(&mut fsm, ";");
        let Intent::Edit { motion, .. } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(motion.direction, Direction::Right);
        assert_eq!(motion.character, Some('X'));

        let intents = feed(&mut fsm, ",");
        let Intent::Edit { motion, .. } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(motion.direction, Direction::Left);
    }

    #[test]
    fn charsearch_as_operand_should_feed_pending_delete() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "dtx");
        let Intent::Edit { kind, motion } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(*kind, EditKind::Delete);
        assert_eq!(motion.movement, Movement::TillChar);
        assert_eq!(motion.character, Some('x'));
    }

    #[test]
    fn char_replace_should_emit_untyped_replace_with_count() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "3rz");
        let Intent::Replace { ch, typing, motion } = &intents[0] else {
            panic!("expected replace intent, got {:?}", intents[0]);
        };
        assert_eq!(*ch, 'z');
        assert!(!typing);
        assert_eq!(motion.count, 3);
    }

    #[test]
    fn replace_mode_should_type_overwriting_and_erase_on_backspace() {
        let mut fsm = ViInputFsm::new();
        let mut intents = feed(&mut fsm, "R");
        assert!(intents.contains(&Intent::Mode(Mode::Replace)));

        intents = feed(&mut fsm, "q");
        let Intent::Replace { ch, typing, .. } = &intents[0] else {
            panic!("expected replace intent");
        };
        assert_eq!(*ch, 'q');
        assert!(typing);

        intents = fsm.handle(KeyInput::Control('h'));
        assert!(matches!(
            intents[0],
            Intent::Edit {
                kind: EditKind::Erase,
                ..
            }
        ));
    }

    #[test]
    fn insert_escape_should_clamp_and_checkpoint_once() {
        let mut fsm = ViInputFsm::new();
        feed(&mut fsm, "i");
        feed(&mut fsm, "hi");
        let intents = fsm.handle(KeyInput::Control('['));
        assert_eq!(
            intents,
            vec![
                Intent::Clamp,
                Intent::Checkpoint,
                Intent::Mode(Mode::Normal)
            ]
        );

        // nothing left pending: plain escape does not checkpoint again
        feed(&mut fsm, "i");
        let intents = fsm.handle(KeyInput::Control('['));
        assert_eq!(intents, vec![Intent::Clamp, Intent::Mode(Mode::Normal)]);
    }

    #[test]
    fn visual_motion_should_extend_highlight() {
        let mut fsm = ViInputFsm::new();
        feed(&mut fsm, "v");
        let intents = feed(&mut fsm, "w");
        assert!(matches!(
            intents[0],
            Intent::Edit {
                kind: EditKind::Highlight,
                ..
            }
        ));
        assert_eq!(fsm.state(), ViState::Visual);
    }

    #[test]
    fn visual_delete_should_apply_to_selection_and_exit() {
        let mut fsm = ViInputFsm::new();
        feed(&mut fsm, "v");
        let intents = feed(&mut fsm, "d");
        let Intent::Edit { kind, motion } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(*kind, EditKind::Delete);
        assert_eq!(motion.movement, Movement::Highlight);
        assert_eq!(fsm.state(), ViState::Normal);
        assert!(intents.contains(&Intent::Checkpoint));
    }

    #[test]
    fn goto_prefix_should_route_case_operators() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "guw");
        let Intent::Edit { kind, motion } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(*kind, EditKind::Lowercase);
        assert_eq!(motion.movement, Movement::WordBegin);
    }

    #[test]
    fn doubled_goto_case_key_should_select_line_motion() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "gUU");
        let Intent::Edit { kind, motion } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(*kind, EditKind::Uppercase);
        assert_eq!(motion.movement, Movement::Line);
    }

    #[test]
    fn gg_should_scroll_to_top() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "gg");
        assert!(matches!(
            intents[0],
            Intent::Scroll {
                kind: ScrollKind::Top,
                ..
            }
        ));
    }

    #[test]
    fn wincmd_keys_should_emit_window_and_focus_intents() {
        let mut fsm = ViInputFsm::new();

        let intents = fsm.handle(KeyInput::Control('w'));
        assert!(intents.is_empty());
        let intents = feed(&mut fsm, "s");
        assert!(matches!(
            intents[0],
            Intent::Window {
                op: WindowOp::Split,
                ..
            }
        ));

        fsm.handle(KeyInput::Control('w'));
        let intents = feed(&mut fsm, "+");
        assert!(matches!(
            intents[0],
            Intent::Window {
                op: WindowOp::Resize,
                direction: Direction::Down,
                count: 1,
            }
        ));

        fsm.handle(KeyInput::Control('w'));
        let intents = feed(&mut fsm, "=");
        assert!(matches!(
            intents[0],
            Intent::Window {
                op: WindowOp::Equalize,
                ..
            }
        ));

        fsm.handle(KeyInput::Control('w'));
        let intents = feed(&mut fsm, "w");
        assert!(matches!(
            intents[0],
            Intent::Focus {
                target: FocusTarget::Window,
                direction: Some(FocusDirection::Next),
                count: 0,
            }
        ));
    }

    #[test]
    fn ctrl_c_without_prefix_should_explain_quit() {
        let mut fsm = ViInputFsm::new();
        let intents = fsm.handle(KeyInput::Control('c'));
        assert_eq!(
            intents,
            vec![Intent::Warn("Type :quit<Enter> to exit".to_string())]
        );
    }

    #[test]
    fn ctrl_c_with_count_should_only_cancel_it() {
        let mut fsm = ViInputFsm::new();
        feed(&mut fsm, "42");
        let intents = fsm.handle(KeyInput::Control('c'));
        assert!(intents.is_empty());
        let intents = feed(&mut fsm, "l");
        let Intent::Edit { motion, .. } = &intents[0] else {
            panic!("expected edit intent");
        };
        assert_eq!(motion.count, 1);
    }

    #[test]
    fn unknown_normal_key_should_warn_with_state_name() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "Q");
        assert!(
            matches!(&intents[0], Intent::Warn(msg) if msg == "Not yet implemented in normal mode: Q")
        );
    }

    #[test]
    fn paste_should_consume_register_and_count() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "\"b3p");
        assert!(matches!(
            intents[0],
            Intent::Paste {
                side: PasteSide::After,
                register: 'b',
                count: 3,
            }
        ));
    }

    #[test]
    fn insert_ctrl_r_should_paste_named_register() {
        let mut fsm = ViInputFsm::new();
        feed(&mut fsm, "i");
        fsm.handle(KeyInput::Control('r'));
        assert_eq!(fsm.state(), ViState::Paste);
        let intents = feed(&mut fsm, "a");
        assert!(matches!(
            intents[0],
            Intent::Paste {
                side: PasteSide::Before,
                register: 'a',
                count: 1,
            }
        ));
        assert_eq!(fsm.state(), ViState::Insert);
    }

    #[test]
    fn mark_keys_should_fold_to_lowercase() {
        let mut fsm = ViInputFsm::new();
        let intents = feed(&mut fsm, "mA");
        assert_eq!(intents, vec![Intent::Mark('a')]);
    }
}
