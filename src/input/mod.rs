mod simple;
mod vi;

pub use simple::SimpleInputFsm;
pub use vi::{ViInputFsm, ViState};

use std::thread;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use tracing::error;

use crate::event::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKey {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    Backspace,
    BackTab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyMods {
    pub shift: bool,
}

impl KeyMods {
    pub const NONE: Self = Self { shift: false };
    pub const SHIFT: Self = Self { shift: true };
}

/// Input alphabet of the FSMs: printable presses, control chords, and
/// special keys. Esc, Enter, and Tab arrive as their control chords so the
/// keymaps can treat `^[`, `^M`, and `^I` uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Press(char),
    Control(char),
    Special(SpecialKey, KeyMods),
}

impl KeyInput {
    pub fn from_event(key: &event::KeyEvent) -> Option<Self> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let mods = KeyMods {
            shift: key.modifiers.contains(KeyModifiers::SHIFT),
        };

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char(ch) = key.code {
                return Some(Self::Control(ch.to_ascii_lowercase()));
            }
            return None;
        }

        match key.code {
            KeyCode::Char(ch) => Some(Self::Press(ch)),
            KeyCode::Esc => Some(Self::Control('[')),
            KeyCode::Enter => Some(Self::Control('m')),
            KeyCode::Tab => Some(Self::Control('i')),
            KeyCode::BackTab => Some(Self::Special(SpecialKey::BackTab, KeyMods::SHIFT)),
            KeyCode::Backspace => Some(Self::Special(SpecialKey::Backspace, mods)),
            KeyCode::Delete => Some(Self::Special(SpecialKey::Delete, mods)),
            KeyCode::Left => Some(Self::Special(SpecialKey::Left, mods)),
            KeyCode::Right => Some(Self::Special(SpecialKey::Right, mods)),
            KeyCode::Up => Some(Self::Special(SpecialKey::Up, mods)),
            KeyCode::Down => Some(Self::Special(SpecialKey::Down, mods)),
            KeyCode::Home => Some(Self::Special(SpecialKey::Home, mods)),
            KeyCode::End => Some(Self::Special(SpecialKey::End, mods)),
            KeyCode::PageUp => Some(Self::Special(SpecialKey::PageUp, mods)),
            KeyCode::PageDown => Some(Self::Special(SpecialKey::PageDown, mods)),
            _ => None,
        }
    }
}

/// Reads terminal events on its own thread and forwards them to the event
/// bus in arrival order.
pub(crate) fn start_input_pump(event_tx: flume::Sender<AppEvent>) {
    thread::spawn(move || {
        loop {
            let evt = match event::read() {
                Ok(evt) => evt,
                Err(err) => {
                    error!("input pump stopped: failed to read terminal event: {}", err);
                    break;
                }
            };
            let app_event = match evt {
                Event::Resize(width, height) => AppEvent::Resize { width, height },
                Event::Key(key) => match KeyInput::from_event(&key) {
                    Some(input) => AppEvent::Key(input),
                    None => continue,
                },
                _ => continue,
            };
            if event_tx.send(app_event).is_err() {
                break;
            }
        }
    });
}
