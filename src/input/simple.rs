use crate::input::{KeyInput, SpecialKey};
use crate::intent::{
    CompleteDirection, Direction, EditKind, FocusDirection, FocusTarget, Intent, Motion, Movement,
    PasteSide,
};
use crate::state::registers::RegisterStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimpleState {
    Waiting,
    Paste,
}

/// Minimal readline-style keymap for the command bar. No modes, no counts:
/// every key resolves immediately, except `^R` which waits for a register
/// name.
pub struct SimpleInputFsm {
    state: SimpleState,
}

impl SimpleInputFsm {
    pub fn new() -> Self {
        Self {
            state: SimpleState::Waiting,
        }
    }

    pub fn handle(&mut self, key: KeyInput) -> Vec<Intent> {
        let mut out = Vec::new();
        match self.state {
            SimpleState::Waiting => self.handle_waiting(key, &mut out),
            SimpleState::Paste => self.handle_paste(key, &mut out),
        }
        out
    }

    fn handle_waiting(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        match key {
            KeyInput::Press(ch) => out.push(Intent::Type(ch)),
            KeyInput::Control('a') | KeyInput::Special(SpecialKey::Home, _) => {
                out.push(move_intent(Movement::Line, Direction::Left));
            }
            KeyInput::Control('e') | KeyInput::Special(SpecialKey::End, _) => {
                out.push(move_intent(Movement::Line, Direction::Right));
            }
            KeyInput::Control('h') | KeyInput::Special(SpecialKey::Backspace, _) => {
                out.push(delete_intent(Motion::new(Movement::Char, Direction::Left)));
            }
            KeyInput::Control('?') | KeyInput::Special(SpecialKey::Delete, _) => {
                out.push(delete_intent(Motion::new(Movement::Char, Direction::Right)));
            }
            KeyInput::Control('u') => out.push(Intent::Clear),
            KeyInput::Control('r') => self.state = SimpleState::Paste,
            KeyInput::Control('i') => out.push(Intent::Complete(CompleteDirection::Next)),
            KeyInput::Special(SpecialKey::BackTab, _) => {
                out.push(Intent::Complete(CompleteDirection::Previous));
            }
            KeyInput::Control('j') | KeyInput::Control('m') => out.push(Intent::Submit),
            KeyInput::Control('c') | KeyInput::Control('[') => out.push(Intent::Switch),
            KeyInput::Special(SpecialKey::Left, mods) if mods.shift => {
                out.push(move_intent(Movement::WordBegin, Direction::Left));
            }
            KeyInput::Special(SpecialKey::Right, mods) if mods.shift => {
                out.push(Intent::Edit {
                    kind: EditKind::Move,
                    motion: Motion::new(Movement::ToChar, Direction::Right).with_char(' '),
                });
            }
            KeyInput::Special(SpecialKey::Left, _) => {
                out.push(move_intent(Movement::Char, Direction::Left));
            }
            KeyInput::Special(SpecialKey::Right, _) => {
                out.push(move_intent(Movement::Char, Direction::Right));
            }
            KeyInput::Special(SpecialKey::Up, _) => out.push(Intent::Focus {
                target: FocusTarget::History,
                direction: Some(FocusDirection::Previous),
                count: 1,
            }),
            KeyInput::Special(SpecialKey::Down, _) => out.push(Intent::Focus {
                target: FocusTarget::History,
                direction: Some(FocusDirection::Next),
                count: 1,
            }),
            _ => {}
        }
    }

    fn handle_paste(&mut self, key: KeyInput, out: &mut Vec<Intent>) {
        match key {
            KeyInput::Press(ch) if RegisterStore::is_valid_name(ch) => {
                out.push(Intent::Paste {
                    side: PasteSide::Before,
                    register: ch,
                    count: 1,
                });
            }
            KeyInput::Press(ch) => out.push(Intent::Warn(format!("Not a register: {ch}"))),
            _ => {}
        }
        self.state = SimpleState::Waiting;
    }
}

impl Default for SimpleInputFsm {
    fn default() -> Self {
        Self::new()
    }
}

fn move_intent(movement: Movement, direction: Direction) -> Intent {
    Intent::Edit {
        kind: EditKind::Move,
        motion: Motion::new(movement, direction),
    }
}

fn delete_intent(motion: Motion) -> Intent {
    Intent::Edit {
        kind: EditKind::Delete,
        motion: motion.with_register('_'),
    }
}
