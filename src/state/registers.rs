use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterAction {
    Yank,
    Delete,
}

pub const UNNAMED: char = '"';
pub const BLACKHOLE: char = '_';
const YANK_SLOT: char = '0';
const SMALL_DELETE: char = '-';
const READ_ONLY: [char; 6] = ['.', ':', '/', '%', '#', '='];

/// Named, numbered, and special registers with vi update rules. The unnamed
/// register mirrors every writable update; deletes through the unnamed
/// register rotate the `1`-`9` ring.
#[derive(Debug, Default)]
pub struct RegisterStore {
    slots: BTreeMap<char, String>,
}

impl RegisterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid_name(name: char) -> bool {
        name.is_ascii_alphanumeric() || matches!(name, '.' | ':' | '%' | '#' | '/' | '_' | '"' | '=' | '-')
    }

    pub fn is_read_only(name: char) -> bool {
        READ_ONLY.contains(&name)
    }

    pub fn update(&mut self, action: RegisterAction, name: char, value: &str) {
        match name {
            BLACKHOLE => {}
            _ if Self::is_read_only(name) => {}
            UNNAMED => match action {
                RegisterAction::Yank => {
                    self.slots.insert(YANK_SLOT, value.to_string());
                    self.slots.insert(UNNAMED, value.to_string());
                }
                RegisterAction::Delete => {
                    self.rotate_delete_ring(value);
                    self.slots.insert(SMALL_DELETE, value.to_string());
                    self.slots.insert(UNNAMED, value.to_string());
                }
            },
            'A'..='Z' => {
                let lower = name.to_ascii_lowercase();
                let entry = self.slots.entry(lower).or_default();
                entry.push_str(value);
                let appended = entry.clone();
                self.slots.insert(UNNAMED, appended);
            }
            _ => {
                self.slots.insert(name, value.to_string());
                self.slots.insert(UNNAMED, value.to_string());
            }
        }
    }

    pub fn get(&self, name: char) -> Option<&str> {
        if name == BLACKHOLE {
            return None;
        }
        let key = if name.is_ascii_uppercase() {
            name.to_ascii_lowercase()
        } else {
            name
        };
        self.slots.get(&key).map(String::as_str)
    }

    pub fn set_last_insert(&mut self, text: &str) {
        self.slots.insert('.', text.to_string());
    }

    pub fn set_last_command(&mut self, text: &str) {
        self.slots.insert(':', text.to_string());
    }

    pub fn set_last_search(&mut self, text: &str) {
        self.slots.insert('/', text.to_string());
    }

    /// Moves the previous current-buffer name into `#` before installing the
    /// new one into `%`.
    pub fn set_current_buffer(&mut self, name: &str) {
        if let Some(previous) = self.slots.get(&'%').cloned()
            && previous != name
        {
            self.slots.insert('#', previous);
        }
        self.slots.insert('%', name.to_string());
    }

    /// Ordered register listing: `0`, then the delete ring, then everything
    /// else by key.
    pub fn dump(&self) -> Vec<(char, String)> {
        let mut out = Vec::new();
        if let Some(value) = self.slots.get(&YANK_SLOT) {
            out.push((YANK_SLOT, value.clone()));
        }
        for slot in '1'..='9' {
            if let Some(value) = self.slots.get(&slot) {
                out.push((slot, value.clone()));
            }
        }
        for (name, value) in &self.slots {
            if name.is_ascii_digit() {
                continue;
            }
            out.push((*name, value.clone()));
        }
        out
    }

    fn rotate_delete_ring(&mut self, value: &str) {
        for slot in (b'2'..=b'9').rev() {
            let from = (slot - 1) as char;
            if let Some(previous) = self.slots.get(&from).cloned() {
                self.slots.insert(slot as char, previous);
            }
        }
        self.slots.insert('1', value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::{RegisterAction, RegisterStore, UNNAMED};

    #[test]
    fn unnamed_delete_should_rotate_the_ring() {
        let mut store = RegisterStore::new();
        for text in ["one", "two", "three"] {
            store.update(RegisterAction::Delete, UNNAMED, text);
        }

        assert_eq!(store.get('1'), Some("three"));
        assert_eq!(store.get('2'), Some("two"));
        assert_eq!(store.get('3'), Some("one"));
        assert_eq!(store.get(UNNAMED), Some("three"));
        assert_eq!(store.get('-'), Some("three"));
    }

    #[test]
    fn unnamed_yank_should_fill_yank_slot_without_touching_ring() {
        let mut store = RegisterStore::new();
        store.update(RegisterAction::Delete, UNNAMED, "deleted");
        store.update(RegisterAction::Yank, UNNAMED, "yanked");

        assert_eq!(store.get('0'), Some("yanked"));
        assert_eq!(store.get('1'), Some("deleted"));
        assert_eq!(store.get(UNNAMED), Some("yanked"));
    }

    #[test]
    fn explicit_numbered_write_should_not_shift_the_ring() {
        let mut store = RegisterStore::new();
        store.update(RegisterAction::Delete, UNNAMED, "first");
        store.update(RegisterAction::Delete, '3', "direct");

        assert_eq!(store.get('1'), Some("first"));
        assert_eq!(store.get('2'), None);
        assert_eq!(store.get('3'), Some("direct"));
    }

    #[test]
    fn named_write_should_overwrite_and_mirror_unnamed() {
        let mut store = RegisterStore::new();
        store.update(RegisterAction::Yank, 'a', "old");
        store.update(RegisterAction::Yank, 'a', "new");

        assert_eq!(store.get('a'), Some("new"));
        assert_eq!(store.get(UNNAMED), Some("new"));
    }

    #[test]
    fn uppercase_write_should_append_to_lowercase() {
        let mut store = RegisterStore::new();
        store.update(RegisterAction::Yank, 'a', "hello");
        store.update(RegisterAction::Yank, 'A', " world");

        assert_eq!(store.get('a'), Some("hello world"));
        assert_eq!(store.get('A'), Some("hello world"));
        assert_eq!(store.get(UNNAMED), Some("hello world"));
    }

    #[test]
    fn blackhole_should_discard_writes_and_reads() {
        let mut store = RegisterStore::new();
        store.update(RegisterAction::Delete, '_', "gone");

        assert_eq!(store.get('_'), None);
        assert_eq!(store.get(UNNAMED), None);
        assert_eq!(store.get('1'), None);
    }

    #[test]
    fn read_only_registers_should_ignore_update_but_accept_setters() {
        let mut store = RegisterStore::new();
        store.update(RegisterAction::Yank, '.', "nope");
        assert_eq!(store.get('.'), None);

        store.set_last_insert("typed");
        store.set_last_command("join rust");
        store.set_last_search("needle");
        assert_eq!(store.get('.'), Some("typed"));
        assert_eq!(store.get(':'), Some("join rust"));
        assert_eq!(store.get('/'), Some("needle"));
    }

    #[test]
    fn current_buffer_setter_should_shift_previous_into_alternate() {
        let mut store = RegisterStore::new();
        store.set_current_buffer("lobby");
        store.set_current_buffer("rust");

        assert_eq!(store.get('%'), Some("rust"));
        assert_eq!(store.get('#'), Some("lobby"));
    }

    #[test]
    fn dump_should_order_yank_slot_then_ring_then_rest() {
        let mut store = RegisterStore::new();
        store.update(RegisterAction::Yank, UNNAMED, "y");
        store.update(RegisterAction::Delete, UNNAMED, "d");
        store.update(RegisterAction::Yank, 'b', "named");

        let names = store.dump().into_iter().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, vec!['0', '1', '"', '-', 'b']);
    }

    #[test]
    fn name_validation_should_accept_register_charset_only() {
        for name in ['a', 'Z', '0', '9', '.', ':', '%', '#', '/', '_', '"', '=', '-'] {
            assert!(RegisterStore::is_valid_name(name), "{name} should be valid");
        }
        for name in ['!', '$', ' ', '^', '\\'] {
            assert!(!RegisterStore::is_valid_name(name), "{name} should be invalid");
        }
    }
}
