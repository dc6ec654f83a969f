use crate::intent::{CompleteDirection, Direction, EditKind, Motion, Movement, PasteSide};
use crate::state::histlist::HistList;
use crate::state::registers::{BLACKHOLE, RegisterAction, RegisterStore};

const HISTORY_SIZE: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
}

/// Source of completion candidates. Given the stem to the left of the
/// cursor, returns the suffixes that could follow it.
pub trait Completer {
    fn complete(&self, stem: &str) -> Vec<String>;
}

impl<F> Completer for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn complete(&self, stem: &str) -> Vec<String> {
        self(stem)
    }
}

#[derive(Debug, Default)]
struct CompletionState {
    options: Vec<String>,
    index: Option<usize>,
    original_text: String,
    original_cursor: Cursor,
}

#[derive(Debug)]
pub enum BufferWarning {
    EmptyRegister(char),
}

/// Single-line editable buffer: motion resolution, operator application,
/// register integration, undo history, completion, and highlight state.
/// Cursor and scroll positions are char indices into `value`.
#[derive(Debug)]
pub struct TextBuffer {
    value: String,
    cursor: Cursor,
    start: Cursor,
    highlight_anchor: Option<Cursor>,
    history: HistList<String>,
    prev: String,
    completion: CompletionState,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self {
            value: String::new(),
            cursor: Cursor::default(),
            start: Cursor::default(),
            highlight_anchor: None,
            history: HistList::with_initial(HISTORY_SIZE, String::new()),
            prev: String::new(),
            completion: CompletionState::default(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn scroll_start(&self) -> Cursor {
        self.start
    }

    pub fn highlight_anchor(&self) -> Option<Cursor> {
        self.highlight_anchor
    }

    pub fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    // ── intent consumers ──

    pub fn type_char(&mut self, ch: char) {
        self.reset_completion();
        let at = self.byte_idx(self.cursor.x);
        self.value.insert(at, ch);
        self.cursor.x += 1;
    }

    /// Applies an operator through a resolved motion. A motion that cannot
    /// complete (char search with too few matches) abandons the operator and
    /// leaves the buffer untouched.
    pub fn edit(&mut self, kind: EditKind, motion: Motion, registers: &mut RegisterStore) {
        self.reset_completion();
        let Some(target) = self.resolve(&motion) else {
            return;
        };

        match kind {
            EditKind::Move | EditKind::Highlight => {
                if motion.movement == Movement::Highlight {
                    if let Some(anchor) = self.highlight_anchor {
                        self.highlight_anchor = Some(self.cursor);
                        self.cursor = anchor;
                    }
                } else {
                    self.cursor.x = target;
                }
            }
            EditKind::Delete => {
                let (start, end) = self.range_for(&motion, target);
                if start >= end {
                    return;
                }
                let text = self.slice(start, end);
                registers.update(RegisterAction::Delete, motion.register, &text);
                self.splice(start, end, "");
                self.cursor.x = start;
            }
            EditKind::Yank => {
                let (start, end) = self.range_for(&motion, target);
                if start >= end {
                    return;
                }
                let text = self.slice(start, end);
                registers.update(RegisterAction::Yank, motion.register, &text);
                self.cursor.x = start;
            }
            EditKind::Erase => {
                let (start, end) = self.range_for(&motion, target);
                if start >= end {
                    return;
                }
                self.erase_range(start, end);
                self.cursor.x = start;
            }
            EditKind::ToggleCase | EditKind::Uppercase | EditKind::Lowercase => {
                let (start, end) = self.range_for(&motion, target);
                if start >= end {
                    return;
                }
                let transformed = self
                    .slice(start, end)
                    .chars()
                    .map(|ch| transform_case(kind, ch))
                    .collect::<String>();
                self.splice(start, end, &transformed);
                if kind == EditKind::ToggleCase && motion.movement == Movement::Char {
                    // bare `~` steps past the characters it flipped
                    self.cursor.x = end.min(self.char_len().saturating_sub(1));
                } else {
                    self.cursor.x = start;
                }
            }
        }
    }

    pub fn paste(
        &mut self,
        side: PasteSide,
        register: char,
        count: u32,
        registers: &RegisterStore,
    ) -> Result<(), BufferWarning> {
        self.reset_completion();
        if register == BLACKHOLE {
            return Ok(());
        }
        let content = match registers.get(register) {
            Some(content) if !content.is_empty() => content.to_string(),
            _ => return Err(BufferWarning::EmptyRegister(register)),
        };

        let text = content.repeat(count.max(1) as usize);
        let inserted = text.chars().count();
        let at = match side {
            PasteSide::Before => self.cursor.x,
            PasteSide::After => (self.cursor.x + 1).min(self.char_len()),
        };
        let byte_at = self.byte_idx(at);
        self.value.insert_str(byte_at, &text);
        self.cursor.x = at + inserted - 1;
        Ok(())
    }

    pub fn replace(&mut self, ch: char, typing: bool, motion: Motion) {
        self.reset_completion();

        if typing {
            // always writes, even past the last character
            let end = (self.cursor.x + 1).min(self.char_len());
            let replacement = ch.to_string();
            self.splice(self.cursor.x, end, &replacement);
            self.cursor.x += 1;
            return;
        }

        if motion.movement == Movement::Highlight {
            let Some(target) = self.resolve(&motion) else {
                return;
            };
            let (start, end) = self.range_for(&motion, target);
            if start >= end {
                return;
            }
            let replacement = repeat_char(ch, end - start);
            self.splice(start, end, &replacement);
            self.cursor.x = start;
            return;
        }

        let count = motion.count.max(1) as usize;
        if self.char_len().saturating_sub(self.cursor.x) < count {
            return;
        }
        let end = self.cursor.x + count;
        let replacement = repeat_char(ch, count);
        self.splice(self.cursor.x, end, &replacement);
        self.cursor.x = end - 1;
    }

    pub fn clear(&mut self) {
        self.reset_completion();
        self.value.clear();
        self.cursor.x = 0;
        self.start.x = 0;
    }

    /// Snapshot the buffer if it changed since the last checkpoint.
    pub fn checkpoint(&mut self) {
        if self.value != self.prev {
            self.history.append(self.value.clone());
            self.prev = self.value.clone();
        }
    }

    pub fn undo(&mut self, count: u32) {
        self.reset_completion();
        self.value = self.history.prev(count.max(1) as usize).clone();
        self.prev = self.value.clone();
        self.cursor.x = self.cursor.x.min(self.char_len());
    }

    pub fn redo(&mut self, count: u32) {
        self.reset_completion();
        self.value = self.history.next(count.max(1) as usize).clone();
        self.prev = self.value.clone();
        self.cursor.x = self.cursor.x.min(self.char_len());
    }

    /// NORMAL-mode cursor rule: the cursor may not rest past the last
    /// character. Also ends any highlight.
    pub fn clamp(&mut self) {
        let len = self.char_len();
        if len == 0 {
            self.cursor.x = 0;
        } else if self.cursor.x >= len {
            self.cursor.x = len - 1;
        }
        self.highlight_anchor = None;
    }

    pub fn start_highlight(&mut self) {
        self.highlight_anchor = Some(self.cursor);
    }

    /// Takes the buffer content for submission and checkpoints the now-empty
    /// line.
    pub fn take(&mut self) -> String {
        self.reset_completion();
        self.highlight_anchor = None;
        let text = std::mem::take(&mut self.value);
        self.cursor = Cursor::default();
        self.start = Cursor::default();
        self.checkpoint();
        text
    }

    pub fn complete(&mut self, direction: CompleteDirection, completer: &dyn Completer) {
        if self.completion.index.is_none() && self.completion.options.is_empty() {
            let stem_start = self.stem_start();
            let stem = self.slice(stem_start, self.cursor.x);
            let options = completer.complete(&stem);
            if options.is_empty() {
                return;
            }
            self.completion = CompletionState {
                options,
                index: None,
                original_text: self.value.clone(),
                original_cursor: self.cursor,
            };
        }

        let len = self.completion.options.len();
        if len == 0 {
            return;
        }
        // position len is the "no completion" slot holding the original text
        let modulus = len + 1;
        let current = self.completion.index.unwrap_or(len);
        let next = match direction {
            CompleteDirection::Next => (current + 1) % modulus,
            CompleteDirection::Previous => (current + modulus - 1) % modulus,
        };

        self.value = self.completion.original_text.clone();
        self.cursor = self.completion.original_cursor;
        if next < len {
            let suffix = self.completion.options[next].clone();
            let at = self.byte_idx(self.cursor.x);
            self.value.insert_str(at, &suffix);
            self.cursor.x += suffix.chars().count();
        }
        self.completion.index = Some(next);
    }

    /// Keeps the scroll origin within `visible_width` of the cursor.
    pub fn scroll_to_cursor(&mut self, visible_width: usize) {
        if visible_width == 0 {
            return;
        }
        if self.cursor.x < self.start.x {
            self.start.x = self.cursor.x;
        } else if self.cursor.x - self.start.x >= visible_width {
            self.start.x = self.cursor.x + 1 - visible_width;
        }
    }

    // ── motion resolution ──

    fn resolve(&self, motion: &Motion) -> Option<usize> {
        let chars: Vec<char> = self.value.chars().collect();
        let len = chars.len();
        let x = self.cursor.x.min(len);
        let count = motion.count.max(1) as usize;

        let target = match motion.movement {
            Movement::Char => match motion.direction {
                Direction::Left => x.saturating_sub(count),
                _ => (x + count).min(len),
            },
            Movement::Line => match motion.direction {
                Direction::Left | Direction::Up | Direction::Down => 0,
                Direction::Right => len,
                Direction::FirstWord => chars
                    .iter()
                    .position(|ch| !ch.is_whitespace())
                    .unwrap_or(len),
            },
            Movement::WordBegin => match motion.direction {
                Direction::Left => scan_word_begin_left(&chars, x, count),
                _ => scan_word_begin_right(&chars, x, count),
            },
            Movement::WordEnd => scan_word_end_right(&chars, x, count),
            Movement::ToChar | Movement::TillChar => {
                let needle = motion.character?;
                let till = motion.movement == Movement::TillChar;
                scan_char(&chars, x, count, needle, motion.direction, till)?
            }
            Movement::Highlight => self.highlight_anchor?.x,
        };
        Some(target)
    }

    /// Derives the half-open operated range from the resolved target,
    /// applying the inclusive bumps.
    fn range_for(&self, motion: &Motion, target: usize) -> (usize, usize) {
        let len = self.char_len();
        if motion.movement == Movement::Line
            && matches!(motion.direction, Direction::Up | Direction::Down)
        {
            return (0, len);
        }

        let x = self.cursor.x.min(len);
        if target < x {
            let mut end = x;
            if motion.movement == Movement::Highlight {
                end = (end + 1).min(len);
            }
            (target, end)
        } else {
            let mut end = target;
            if matches!(
                motion.movement,
                Movement::ToChar | Movement::TillChar | Movement::WordEnd | Movement::Highlight
            ) {
                end = (end + 1).min(len);
            }
            (x, end.min(len))
        }
    }

    /// REPLACE-mode backspace: restore what the last checkpoint had at each
    /// position, dropping characters the checkpoint did not have.
    fn erase_range(&mut self, start: usize, end: usize) {
        let original: Vec<char> = self.history.current().chars().collect();
        let restored: String = (start..end)
            .filter_map(|i| original.get(i).copied())
            .collect();
        self.splice(start, end, &restored);
    }

    fn stem_start(&self) -> usize {
        let chars: Vec<char> = self.value.chars().collect();
        let mut i = self.cursor.x.min(chars.len());
        while i > 0 && classify(chars[i - 1]) == CharClass::Word {
            i -= 1;
        }
        i
    }

    fn reset_completion(&mut self) {
        self.completion = CompletionState::default();
    }

    // ── char-index plumbing ──

    fn byte_idx(&self, char_idx: usize) -> usize {
        char_to_byte_idx(&self.value, char_idx)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        let from = self.byte_idx(start);
        let to = self.byte_idx(end);
        self.value[from..to].to_string()
    }

    fn splice(&mut self, start: usize, end: usize, replacement: &str) {
        let from = self.byte_idx(start);
        let to = self.byte_idx(end);
        self.value.replace_range(from..to, replacement);
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Keyword,
    Whitespace,
}

fn classify(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Whitespace
    } else if ch.is_alphanumeric() || ch == '_' {
        CharClass::Word
    } else {
        CharClass::Keyword
    }
}

/// A word begin is a non-whitespace position whose class differs from the
/// character before it.
fn word_begin_at(chars: &[char], i: usize) -> bool {
    if classify(chars[i]) == CharClass::Whitespace {
        return false;
    }
    i == 0 || classify(chars[i - 1]) != classify(chars[i])
}

fn scan_word_begin_right(chars: &[char], x: usize, count: usize) -> usize {
    let len = chars.len();
    let mut remaining = count;
    let mut i = x;
    loop {
        i += 1;
        if i >= len {
            return len;
        }
        if word_begin_at(chars, i) {
            remaining -= 1;
            if remaining == 0 {
                return i;
            }
        }
    }
}

fn scan_word_begin_left(chars: &[char], x: usize, count: usize) -> usize {
    let mut remaining = count;
    let mut i = x;
    while i > 0 {
        i -= 1;
        if word_begin_at(chars, i) {
            remaining -= 1;
            if remaining == 0 {
                return i;
            }
        }
    }
    0
}

fn scan_word_end_right(chars: &[char], x: usize, count: usize) -> usize {
    let len = chars.len();
    let mut remaining = count;
    let mut i = x;
    loop {
        if i + 1 >= len {
            return len.saturating_sub(1);
        }
        i += 1;
        let ends_token = classify(chars[i]) != CharClass::Whitespace
            && (i + 1 == len || classify(chars[i + 1]) != classify(chars[i]));
        if ends_token {
            remaining -= 1;
            if remaining == 0 {
                return i;
            }
        }
    }
}

/// Stops on the `count`-th occurrence of `needle`, or fails if there are
/// fewer. `till` lands one short of the match (one past it going left).
fn scan_char(
    chars: &[char],
    x: usize,
    count: usize,
    needle: char,
    direction: Direction,
    till: bool,
) -> Option<usize> {
    let mut remaining = count;
    if direction == Direction::Left {
        for i in (0..x.min(chars.len())).rev() {
            if chars[i] == needle {
                remaining -= 1;
                if remaining == 0 {
                    return Some(if till { i + 1 } else { i });
                }
            }
        }
        return None;
    }

    for (i, ch) in chars.iter().enumerate().skip(x + 1) {
        if *ch == needle {
            remaining -= 1;
            if remaining == 0 {
                return Some(if till { i - 1 } else { i });
            }
        }
    }
    None
}

fn transform_case(kind: EditKind, ch: char) -> char {
    let flip = match kind {
        EditKind::Uppercase => ch.is_lowercase(),
        EditKind::Lowercase => ch.is_uppercase(),
        _ => true,
    };
    if !flip {
        return ch;
    }
    if ch.is_lowercase() {
        ch.to_ascii_uppercase()
    } else {
        ch.to_ascii_lowercase()
    }
}

fn repeat_char(ch: char, count: usize) -> String {
    std::iter::repeat_n(ch, count).collect()
}

fn char_to_byte_idx(s: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    s.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}
