//! Client-side line editing against a dumb terminal.
//!
//! Every key press mutates the local buffer and yields the minimal byte
//! sequence that brings the visible line back in step with it. Nothing is
//! ever reprinted wholesale: inserts and deletions redraw only the tail of
//! the line, and cursor jumps are built from single-column moves so the
//! stream stays valid on terminals without absolute positioning.

use unicode_width::UnicodeWidthChar;

/// Moves the visible cursor one column left.
const CURSOR_LEFT: &str = "\u{8}";
/// Moves the visible cursor one column right.
const CURSOR_RIGHT: &str = "\u{1b}[C";
/// Written after a committed line.
const COMMIT_ECHO: &str = "\r\n";

/// Keys the editor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// Commits the line.
    Enter,
    /// Deletes the character before the cursor.
    Backspace,
    /// Deletes the character under the cursor.
    Delete,
    /// Moves one character left.
    Left,
    /// Moves one character right.
    Right,
    /// Jumps to the start of the line.
    Home,
    /// Jumps to the end of the line.
    End,
    /// Recalls the previous history entry.
    Up,
    /// Recalls the next history entry, or a fresh line past the newest.
    Down,
    /// Dismisses an open media overlay.
    Escape,
}

/// One key event as delivered by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The key itself.
    pub key: Key,
    /// Whether Ctrl, Alt or Meta was held. Such characters are not inserted.
    pub modifier_held: bool,
}

impl KeyPress {
    /// A key press with no modifier held.
    #[must_use]
    pub const fn plain(key: Key) -> Self {
        Self {
            key,
            modifier_held: false,
        }
    }
}

impl From<Key> for KeyPress {
    fn from(key: Key) -> Self {
        Self::plain(key)
    }
}

/// What a key press produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorOutput {
    /// Bytes to write to the terminal.
    pub echo: String,
    /// Line to send to the server, if the key committed one.
    pub committed: Option<String>,
    /// Whether an open media overlay should close.
    pub dismiss_overlay: bool,
}

/// Buffer, cursor and history of the line being typed.
///
/// `cursor` counts characters and always lies within `0..=buffer.len()`.
/// `history_cursor == history.len()` means a fresh line is being edited.
#[derive(Debug, Clone, Default)]
pub struct LineEditor {
    buffer: Vec<char>,
    cursor: usize,
    history: Vec<String>,
    history_cursor: usize,
    ready: bool,
}

impl LineEditor {
    /// An editor that ignores keys until the first prompt arrives.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts keys again. Called when the server announces a prompt.
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Stops accepting keys, for example after the connection drops.
    pub fn mark_busy(&mut self) {
        self.ready = false;
    }

    /// Whether keys are currently accepted.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The line as currently typed.
    #[must_use]
    pub fn buffer(&self) -> String {
        self.buffer.iter().collect()
    }

    /// Cursor position, in characters from the start of the line.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Committed lines, oldest first, without consecutive repeats.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Index of the history entry being browsed.
    #[must_use]
    pub fn history_cursor(&self) -> usize {
        self.history_cursor
    }

    /// Applies one key press.
    pub fn handle(&mut self, press: impl Into<KeyPress>) -> EditorOutput {
        let press = press.into();
        let mut output = EditorOutput::default();
        if !self.ready {
            return output;
        }

        match press.key {
            Key::Char(ch) if !press.modifier_held && !ch.is_control() => {
                self.insert(ch, &mut output.echo);
            }
            Key::Char(_) => {}
            Key::Enter => output.committed = self.commit(&mut output.echo),
            Key::Backspace => self.backspace(&mut output.echo),
            Key::Delete => self.delete(&mut output.echo),
            Key::Left => self.move_left(&mut output.echo),
            Key::Right => self.move_right(&mut output.echo),
            Key::Home => self.move_home(&mut output.echo),
            Key::End => self.move_end(&mut output.echo),
            Key::Up => self.history_older(&mut output.echo),
            Key::Down => self.history_newer(&mut output.echo),
            Key::Escape => output.dismiss_overlay = true,
        }
        output
    }

    fn insert(&mut self, ch: char, echo: &mut String) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += 1;
        echo.push(ch);
        self.redraw_tail(0, echo);
    }

    fn backspace(&mut self, echo: &mut String) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let removed = self.buffer.remove(self.cursor);
        push_repeated(echo, CURSOR_LEFT, char_width(removed));
        self.redraw_tail(char_width(removed), echo);
    }

    fn delete(&mut self, echo: &mut String) {
        if self.cursor == self.buffer.len() {
            return;
        }
        let removed = self.buffer.remove(self.cursor);
        self.redraw_tail(char_width(removed), echo);
    }

    /// Rewrites everything after the cursor, blanks `stale` trailing columns
    /// and walks the visible cursor back.
    fn redraw_tail(&self, stale: usize, echo: &mut String) {
        let tail = self.buffer.get(self.cursor..).unwrap_or_default();
        echo.extend(tail);
        push_repeated(echo, " ", stale);
        let width: usize = tail.iter().copied().map(char_width).sum();
        push_repeated(echo, CURSOR_LEFT, width + stale);
    }

    fn move_left(&mut self, echo: &mut String) {
        let Some(previous) = self.cursor.checked_sub(1) else {
            return;
        };
        let Some(&passed) = self.buffer.get(previous) else {
            return;
        };
        self.cursor = previous;
        push_repeated(echo, CURSOR_LEFT, char_width(passed));
    }

    fn move_right(&mut self, echo: &mut String) {
        let Some(&passed) = self.buffer.get(self.cursor) else {
            return;
        };
        push_repeated(echo, CURSOR_RIGHT, char_width(passed));
        self.cursor += 1;
    }

    fn move_home(&mut self, echo: &mut String) {
        while self.cursor > 0 {
            self.move_left(echo);
        }
    }

    fn move_end(&mut self, echo: &mut String) {
        while self.cursor < self.buffer.len() {
            self.move_right(echo);
        }
    }

    fn clear_line(&mut self, echo: &mut String) {
        self.move_end(echo);
        while self.cursor > 0 {
            self.backspace(echo);
        }
    }

    fn replace_line(&mut self, text: &str, echo: &mut String) {
        self.clear_line(echo);
        echo.push_str(text);
        self.buffer = text.chars().collect();
        self.cursor = self.buffer.len();
    }

    fn history_older(&mut self, echo: &mut String) {
        let Some(older) = self.history_cursor.checked_sub(1) else {
            return;
        };
        let Some(entry) = self.history.get(older).cloned() else {
            return;
        };
        self.history_cursor = older;
        self.replace_line(&entry, echo);
    }

    fn history_newer(&mut self, echo: &mut String) {
        if self.history_cursor >= self.history.len() {
            return;
        }
        self.history_cursor += 1;
        match self.history.get(self.history_cursor).cloned() {
            Some(entry) => self.replace_line(&entry, echo),
            None => self.clear_line(echo),
        }
    }

    fn commit(&mut self, echo: &mut String) -> Option<String> {
        let line = self.buffer();
        if line.trim().is_empty() {
            return None;
        }
        if self.history.last() != Some(&line) {
            self.history.push(line.clone());
        }
        self.history_cursor = self.history.len();
        self.buffer.clear();
        self.cursor = 0;
        self.ready = false;
        echo.push_str(COMMIT_ECHO);
        Some(line)
    }
}

fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

fn push_repeated(echo: &mut String, fragment: &str, count: usize) {
    for _ in 0..count {
        echo.push_str(fragment);
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn editor() -> LineEditor {
        let mut editor = LineEditor::new();
        editor.mark_ready();
        editor
    }

    fn type_text(editor: &mut LineEditor, text: &str) -> String {
        text.chars()
            .map(|ch| editor.handle(Key::Char(ch)).echo)
            .collect()
    }

    fn submit(editor: &mut LineEditor, text: &str) -> Option<String> {
        type_text(editor, text);
        let committed = editor.handle(Key::Enter).committed;
        editor.mark_ready();
        committed
    }

    #[rstest]
    fn typing_at_the_end_echoes_each_character(mut editor: LineEditor) {
        assert_eq!(type_text(&mut editor, "ls"), "ls");
        assert_eq!(editor.buffer(), "ls");
        assert_eq!(editor.cursor(), 2);
    }

    #[rstest]
    fn inserting_mid_line_redraws_the_tail(mut editor: LineEditor) {
        type_text(&mut editor, "hlo");
        editor.handle(Key::Left);
        editor.handle(Key::Left);

        let output = editor.handle(Key::Char('e'));

        assert_eq!(output.echo, "elo\u{8}\u{8}");
        assert_eq!(editor.buffer(), "helo");
        assert_eq!(editor.cursor(), 2);
    }

    #[rstest]
    fn backspace_erases_the_stale_cell(mut editor: LineEditor) {
        type_text(&mut editor, "abc");
        editor.handle(Key::Left);

        let output = editor.handle(Key::Backspace);

        assert_eq!(output.echo, "\u{8}c \u{8}\u{8}");
        assert_eq!(editor.buffer(), "ac");
        assert_eq!(editor.cursor(), 1);
    }

    #[rstest]
    fn delete_keeps_the_cursor_in_place(mut editor: LineEditor) {
        type_text(&mut editor, "abc");
        editor.handle(Key::Home);

        let output = editor.handle(Key::Delete);

        assert_eq!(output.echo, "bc \u{8}\u{8}\u{8}");
        assert_eq!(editor.buffer(), "bc");
        assert_eq!(editor.cursor(), 0);
    }

    #[rstest]
    #[case::backspace_at_start(Key::Home, Key::Backspace)]
    #[case::delete_at_end(Key::End, Key::Delete)]
    #[case::left_at_start(Key::Home, Key::Left)]
    #[case::right_at_end(Key::End, Key::Right)]
    fn boundary_keys_do_nothing(mut editor: LineEditor, #[case] setup: Key, #[case] key: Key) {
        type_text(&mut editor, "ab");
        editor.handle(setup);
        let cursor = editor.cursor();

        let output = editor.handle(key);

        assert_eq!(output, EditorOutput::default());
        assert_eq!(editor.buffer(), "ab");
        assert_eq!(editor.cursor(), cursor);
    }

    #[rstest]
    fn home_and_end_step_one_column_at_a_time(mut editor: LineEditor) {
        type_text(&mut editor, "abc");

        assert_eq!(editor.handle(Key::Home).echo, "\u{8}\u{8}\u{8}");
        assert_eq!(editor.handle(Key::End).echo, "\u{1b}[C\u{1b}[C\u{1b}[C");
    }

    #[rstest]
    fn wide_characters_move_by_their_display_width(mut editor: LineEditor) {
        type_text(&mut editor, "a字");

        assert_eq!(editor.handle(Key::Left).echo, "\u{8}\u{8}");
        assert_eq!(editor.handle(Key::Right).echo, "\u{1b}[C\u{1b}[C");
        assert_eq!(editor.handle(Key::Backspace).echo, "\u{8}\u{8}  \u{8}\u{8}");
        assert_eq!(editor.buffer(), "a");
    }

    #[rstest]
    fn modified_characters_are_not_inserted(mut editor: LineEditor) {
        let output = editor.handle(KeyPress {
            key: Key::Char('c'),
            modifier_held: true,
        });

        assert_eq!(output, EditorOutput::default());
        assert_eq!(editor.buffer(), "");
    }

    #[rstest]
    fn enter_commits_and_waits_for_the_next_prompt(mut editor: LineEditor) {
        type_text(&mut editor, "help");

        let output = editor.handle(Key::Enter);

        assert_eq!(output.committed.as_deref(), Some("help"));
        assert_eq!(output.echo, "\r\n");
        assert_eq!(editor.buffer(), "");
        assert_eq!(editor.cursor(), 0);
        assert!(!editor.is_ready());
        assert_eq!(editor.handle(Key::Char('x')), EditorOutput::default());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_lines_are_never_committed(mut editor: LineEditor, #[case] text: &str) {
        submit(&mut editor, "help");
        type_text(&mut editor, text);

        let output = editor.handle(Key::Enter);

        assert_eq!(output.committed, None);
        assert!(output.echo.is_empty());
        assert_eq!(editor.history(), ["help"]);
        assert!(editor.is_ready());
    }

    #[rstest]
    fn repeated_commits_are_recorded_once(mut editor: LineEditor) {
        submit(&mut editor, "files.list");
        submit(&mut editor, "files.list");
        submit(&mut editor, "help");
        submit(&mut editor, "files.list");

        assert_eq!(editor.history(), ["files.list", "help", "files.list"]);
        assert_eq!(editor.history_cursor(), 3);
    }

    #[rstest]
    fn history_browsing_replaces_the_visible_line(mut editor: LineEditor) {
        submit(&mut editor, "help");
        submit(&mut editor, "ls");
        type_text(&mut editor, "x");

        let older = editor.handle(Key::Up);
        assert_eq!(older.echo, "\u{8} \u{8}ls");
        assert_eq!(editor.buffer(), "ls");
        assert_eq!(editor.cursor(), 2);

        editor.handle(Key::Up);
        assert_eq!(editor.buffer(), "help");
        assert_eq!(editor.handle(Key::Up), EditorOutput::default());

        editor.handle(Key::Down);
        assert_eq!(editor.buffer(), "ls");
        editor.handle(Key::Down);
        assert_eq!(editor.buffer(), "");
        assert_eq!(editor.history_cursor(), 2);
        assert_eq!(editor.handle(Key::Down), EditorOutput::default());
    }

    #[rstest]
    fn escape_only_dismisses_the_overlay(mut editor: LineEditor) {
        type_text(&mut editor, "abc");

        let output = editor.handle(Key::Escape);

        assert!(output.dismiss_overlay);
        assert!(output.echo.is_empty());
        assert_eq!(editor.buffer(), "abc");
        assert_eq!(editor.cursor(), 3);
    }

    #[test]
    fn keys_are_ignored_before_the_first_prompt() {
        let mut editor = LineEditor::new();

        assert_eq!(editor.handle(Key::Char('a')), EditorOutput::default());
        assert_eq!(editor.handle(Key::Escape), EditorOutput::default());
        assert_eq!(editor.buffer(), "");
    }

    /// Seeds every randomised key sequence is replayed with.
    const SEEDS: [u64; 4] = [1, 7, 42, 2024];

    /// Small deterministic generator so key sequences are reproducible.
    struct KeyStream {
        state: u64,
        keys: &'static [Key],
    }

    impl KeyStream {
        /// One stream per entry in [`SEEDS`], each drawing from `keys`.
        fn seeded(keys: &'static [Key]) -> impl Iterator<Item = Self> {
            SEEDS.into_iter().map(move |state| Self { state, keys })
        }

        fn next_key(&mut self) -> Key {
            self.state = self
                .state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let count = u64::try_from(self.keys.len()).expect("key count fits u64");
            let index = usize::try_from((self.state >> 33) % count).expect("index fits usize");
            self.keys[index]
        }
    }

    const ANY_KEY: [Key; 12] = [
        Key::Char('a'),
        Key::Char('字'),
        Key::Char(' '),
        Key::Enter,
        Key::Backspace,
        Key::Delete,
        Key::Left,
        Key::Right,
        Key::Home,
        Key::End,
        Key::Up,
        Key::Down,
    ];

    const NAVIGATION: [Key; 4] = [Key::Left, Key::Right, Key::Home, Key::End];

    #[test]
    fn cursor_stays_within_the_buffer() {
        for mut keys in KeyStream::seeded(&ANY_KEY) {
            let mut editor = editor();
            for _ in 0..500 {
                editor.handle(keys.next_key());
                editor.mark_ready();
                assert!(editor.cursor() <= editor.buffer().chars().count());
                assert!(editor.history_cursor() <= editor.history().len());
            }
        }
    }

    #[test]
    fn navigation_never_changes_the_buffer() {
        for mut keys in KeyStream::seeded(&NAVIGATION) {
            let mut editor = editor();
            type_text(&mut editor, "connect {host: '字'}");
            let before = editor.buffer();
            for _ in 0..200 {
                editor.handle(keys.next_key());
                assert_eq!(editor.buffer(), before);
            }
        }
    }
}
