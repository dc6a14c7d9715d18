use ropey::Rope;
use unicode_width::UnicodeWidthStr;

/// Spaces inserted by [`EditorBuffer::insert_indent`].
pub const INDENT: &str = "    ";

/// Cursor position in the editor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column (byte offset within the line).
    pub col: usize,
    /// Sticky column for vertical movement.
    col_memory: usize,
}

impl Cursor {
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            col_memory: col,
        }
    }

    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.col_memory = col;
    }
}

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Rope-backed text of one problem file, with cursor.
///
/// The buffer remembers the text it was loaded with. It is dirty while its
/// contents differ from that baseline, so undoing an edit by hand makes it
/// clean again. Unedited buffers return their input byte for byte.
pub struct EditorBuffer {
    rope: Rope,
    baseline: String,
    cursor: Cursor,
    revision: u64,
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            baseline: text.to_string(),
            cursor: Cursor::default(),
            revision: 0,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Incremented on every mutation; lets views cache derived data.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the contents differ from the last loaded or saved text.
    pub fn is_dirty(&self) -> bool {
        self.rope != self.baseline.as_str()
    }

    /// Accept the current contents as the saved baseline.
    pub fn mark_clean(&mut self) {
        self.baseline = self.rope.to_string();
    }

    /// True when the buffer holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.rope.chars().all(char::is_whitespace)
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Content of a line without its line ending.
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(line_idx).to_string();
        Some(line.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// Length of a line in bytes, without its line ending.
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.len())
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Terminal column of the cursor, accounting for wide characters.
    pub fn cursor_display_col(&self) -> usize {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        line.get(..self.cursor.col).map_or(0, UnicodeWidthStr::width)
    }

    pub fn insert_char(&mut self, ch: char) {
        let char_idx = self.cursor_char_idx();
        self.rope.insert_char(char_idx, ch);
        self.cursor.set_col(self.cursor.col + ch.len_utf8());
        self.touch();
    }

    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let char_idx = self.cursor_char_idx();
        self.rope.insert(char_idx, s);

        match s.rsplit_once('\n') {
            Some((_, last)) => {
                self.cursor.line += s.matches('\n').count();
                self.cursor.set_col(last.len());
            }
            None => self.cursor.set_col(self.cursor.col + s.len()),
        }
        self.touch();
    }

    /// Insert spaces up to the next indent stop.
    pub fn insert_indent(&mut self) {
        let width = INDENT.len() - self.cursor.col % INDENT.len();
        self.insert_str(&INDENT[..width]);
    }

    /// Split the line at the cursor, carrying the leading whitespace of the
    /// current line onto the new one.
    pub fn split_line(&mut self) {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
        let indent = &line[..indent_len.min(self.cursor.col)];
        let insertion = format!("\n{indent}");

        let char_idx = self.cursor_char_idx();
        self.rope.insert(char_idx, &insertion);
        self.cursor.line += 1;
        self.cursor.set_col(indent.len());
        self.touch();
    }

    /// Delete the character before the cursor. Returns `true` on change.
    pub fn delete_back(&mut self) -> bool {
        if self.cursor.col == 0 && self.cursor.line == 0 {
            return false;
        }

        let char_idx = self.cursor_char_idx();
        if self.cursor.col == 0 {
            let prev_line = self.cursor.line - 1;
            let prev_len = self.line_len(prev_line);
            // Remove the whole line ending, `\r\n` included.
            let ending_chars = self.rope.line(prev_line).len_chars()
                - self.line_at(prev_line).map_or(0, |l| l.chars().count());
            self.rope.remove(char_idx - ending_chars..char_idx);
            self.cursor.line = prev_line;
            self.cursor.set_col(prev_len);
        } else {
            let line = self.line_at(self.cursor.line).unwrap_or_default();
            let prev_len = line[..self.cursor.col]
                .chars()
                .next_back()
                .map_or(1, char::len_utf8);
            self.rope.remove(char_idx - 1..char_idx);
            self.cursor.set_col(self.cursor.col - prev_len);
        }
        self.touch();
        true
    }

    /// Delete the character at the cursor. Returns `true` on change.
    pub fn delete_forward(&mut self) -> bool {
        let char_idx = self.cursor_char_idx();
        if char_idx >= self.rope.len_chars() {
            return false;
        }
        let at_line_end = self.cursor.col >= self.line_len(self.cursor.line);
        let end = if at_line_end && self.rope.char(char_idx) == '\r' {
            (char_idx + 2).min(self.rope.len_chars())
        } else {
            char_idx + 1
        };
        self.rope.remove(char_idx..end);
        self.touch();
        true
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
            Direction::Up => self.move_vertical(-1),
            Direction::Down => self.move_vertical(1),
        }
    }

    /// Move up or down by `lines`, keeping the sticky column.
    pub fn move_vertical(&mut self, lines: isize) {
        let last = self.line_count().saturating_sub(1);
        let target = self.cursor.line.saturating_add_signed(lines).min(last);
        if target == self.cursor.line {
            return;
        }
        self.cursor.line = target;
        let max_col = self.line_len(target);
        self.cursor.col = self.clamp_to_char_boundary(target, self.cursor.col_memory.min(max_col));
    }

    /// Jump to the first non-blank column, or column zero when already there.
    pub fn move_home(&mut self) {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let first = line.len() - line.trim_start().len();
        let col = if self.cursor.col == first { 0 } else { first };
        self.cursor.set_col(col);
    }

    pub fn move_end(&mut self) {
        self.cursor.set_col(self.line_len(self.cursor.line));
    }

    pub fn move_word_left(&mut self) {
        if self.cursor.col == 0 {
            if self.cursor.line > 0 {
                self.cursor.line -= 1;
                self.cursor.set_col(self.line_len(self.cursor.line));
            }
            return;
        }

        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let trimmed = line[..self.cursor.col].trim_end_matches(|c: char| !is_word_char(c));
        let pos = trimmed
            .rfind(|c: char| !is_word_char(c))
            .map_or(0, |i| i + trimmed[i..].chars().next().map_or(1, char::len_utf8));
        self.cursor.set_col(pos);
    }

    pub fn move_word_right(&mut self) {
        let line_len = self.line_len(self.cursor.line);
        if self.cursor.col >= line_len {
            if self.cursor.line + 1 < self.line_count() {
                self.cursor.line += 1;
                self.cursor.set_col(0);
            }
            return;
        }

        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let after = &line[self.cursor.col..];
        let word_end = after.find(|c: char| !is_word_char(c)).unwrap_or(after.len());
        let rest = &after[word_end..];
        let gap = rest.find(is_word_char).unwrap_or(rest.len());
        self.cursor.set_col(self.cursor.col + word_end + gap);
    }

    /// Move to a position, clamped to the buffer.
    pub fn move_to(&mut self, line: usize, col: usize) {
        self.cursor.line = line.min(self.line_count().saturating_sub(1));
        let col = col.min(self.line_len(self.cursor.line));
        let col = self.clamp_to_char_boundary(self.cursor.line, col);
        self.cursor.set_col(col);
    }

    pub const fn move_to_start(&mut self) {
        self.cursor = Cursor::at(0, 0);
    }

    pub fn move_to_end(&mut self) {
        let last = self.line_count().saturating_sub(1);
        self.cursor.line = last;
        self.cursor.set_col(self.line_len(last));
    }

    const fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn clamp_to_char_boundary(&self, line_idx: usize, col: usize) -> usize {
        let line = self.line_at(line_idx).unwrap_or_default();
        let mut col = col.min(line.len());
        while !line.is_char_boundary(col) {
            col -= 1;
        }
        col
    }

    fn cursor_char_idx(&self) -> usize {
        let line_start = self.rope.line_to_char(self.cursor.line);
        let line = self.rope.line(self.cursor.line).to_string();
        let byte_col = self.cursor.col.min(line.len());
        line_start + line[..byte_col].chars().count()
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            let line = self.line_at(self.cursor.line).unwrap_or_default();
            let prev_len = line[..self.cursor.col]
                .chars()
                .next_back()
                .map_or(1, char::len_utf8);
            self.cursor.set_col(self.cursor.col - prev_len);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.set_col(self.line_len(self.cursor.line));
        }
    }

    fn move_right(&mut self) {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        if let Some(next) = line[self.cursor.col.min(line.len())..].chars().next() {
            self.cursor.set_col(self.cursor.col + next.len_utf8());
        } else if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.set_col(0);
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("rope", &format_args!("Rope({} lines)", self.rope.len_lines()))
            .field("cursor", &self.cursor)
            .field("revision", &self.revision)
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_has_one_line() {
        let buf = EditorBuffer::empty();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_at(0), Some(String::new()));
        assert!(buf.is_blank());
    }

    #[test]
    fn test_unedited_text_is_byte_identical() {
        let content = "def f(x):\r\n    return x\n\n";
        let buf = EditorBuffer::from_text(content);
        assert_eq!(buf.text(), content);
        assert!(!buf.is_dirty());
    }

    #[test]
    fn test_line_at_strips_crlf() {
        let buf = EditorBuffer::from_text("a\r\nb");
        assert_eq!(buf.line_at(0), Some("a".to_string()));
        assert_eq!(buf.line_at(2), None);
    }

    #[test]
    fn test_dirty_tracks_content_not_keystrokes() {
        let mut buf = EditorBuffer::from_text("hello");
        buf.move_end();
        buf.insert_char('!');
        assert!(buf.is_dirty());
        buf.delete_back();
        assert!(!buf.is_dirty());
        assert_eq!(buf.revision(), 2);
    }

    #[test]
    fn test_mark_clean_moves_baseline() {
        let mut buf = EditorBuffer::from_text("hello");
        buf.insert_char('!');
        buf.mark_clean();
        assert!(!buf.is_dirty());
        buf.delete_forward();
        assert!(buf.is_dirty());
    }

    #[test]
    fn test_whitespace_only_is_blank() {
        assert!(EditorBuffer::from_text(" \n\t\n").is_blank());
        assert!(!EditorBuffer::from_text("  pass\n").is_blank());
    }

    #[test]
    fn test_insert_char_in_middle() {
        let mut buf = EditorBuffer::from_text("hllo");
        buf.move_cursor(Direction::Right);
        buf.insert_char('e');
        assert_eq!(buf.line_at(0), Some("hello".to_string()));
        assert_eq!(buf.cursor(), Cursor::at(0, 2));
    }

    #[test]
    fn test_insert_multibyte_char_advances_by_bytes() {
        let mut buf = EditorBuffer::from_text("x");
        buf.move_end();
        buf.insert_char('²');
        assert_eq!(buf.text(), "x²");
        assert_eq!(buf.cursor().col, 3);
        assert_eq!(buf.cursor_display_col(), 2);
    }

    #[test]
    fn test_insert_str_multiline_moves_cursor() {
        let mut buf = EditorBuffer::from_text("");
        buf.insert_str("import numpy\nx = 1");
        assert_eq!(buf.cursor(), Cursor::at(1, 5));
        assert_eq!(buf.line_count(), 2);
    }

    #[test]
    fn test_insert_str_empty_is_noop() {
        let mut buf = EditorBuffer::from_text("hello");
        buf.insert_str("");
        assert_eq!(buf.revision(), 0);
    }

    #[test]
    fn test_split_line_keeps_indent() {
        let mut buf = EditorBuffer::from_text("def f():\n    x = 1");
        buf.move_to(1, 9);
        buf.split_line();
        assert_eq!(buf.text(), "def f():\n    x = 1\n    ");
        assert_eq!(buf.cursor(), Cursor::at(2, 4));
    }

    #[test]
    fn test_split_line_at_start_has_no_indent() {
        let mut buf = EditorBuffer::from_text("    x");
        buf.split_line();
        assert_eq!(buf.text(), "\n    x");
        assert_eq!(buf.cursor(), Cursor::at(1, 0));
    }

    #[test]
    fn test_insert_indent_aligns_to_stop() {
        let mut buf = EditorBuffer::from_text("ab");
        buf.move_end();
        buf.insert_indent();
        assert_eq!(buf.text(), "ab  ");
        buf.insert_indent();
        assert_eq!(buf.text(), "ab      ");
    }

    #[test]
    fn test_delete_back_at_start_is_noop() {
        let mut buf = EditorBuffer::from_text("hello");
        assert!(!buf.delete_back());
    }

    #[test]
    fn test_delete_back_joins_crlf_lines() {
        let mut buf = EditorBuffer::from_text("ab\r\ncd");
        buf.move_to(1, 0);
        assert!(buf.delete_back());
        assert_eq!(buf.text(), "abcd");
        assert_eq!(buf.cursor(), Cursor::at(0, 2));
    }

    #[test]
    fn test_delete_forward_joins_lines() {
        let mut buf = EditorBuffer::from_text("ab\ncd");
        buf.move_end();
        assert!(buf.delete_forward());
        assert_eq!(buf.text(), "abcd");
    }

    #[test]
    fn test_delete_forward_at_end_is_noop() {
        let mut buf = EditorBuffer::from_text("ab");
        buf.move_end();
        assert!(!buf.delete_forward());
    }

    #[test]
    fn test_column_memory_across_short_line() {
        let mut buf = EditorBuffer::from_text("long line\nab\nanother long");
        buf.move_to(0, 8);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 2);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 8);
    }

    #[test]
    fn test_move_vertical_clamps() {
        let mut buf = EditorBuffer::from_text("a\nb\nc");
        buf.move_vertical(10);
        assert_eq!(buf.cursor().line, 2);
        buf.move_vertical(-10);
        assert_eq!(buf.cursor().line, 0);
    }

    #[test]
    fn test_vertical_move_lands_on_char_boundary() {
        let mut buf = EditorBuffer::from_text("abcd\nαβ");
        buf.move_to(0, 3);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 2);
    }

    #[test]
    fn test_move_home_toggles_indent() {
        let mut buf = EditorBuffer::from_text("    return x");
        buf.move_end();
        buf.move_home();
        assert_eq!(buf.cursor().col, 4);
        buf.move_home();
        assert_eq!(buf.cursor().col, 0);
    }

    #[test]
    fn test_move_word_left_and_right() {
        let mut buf = EditorBuffer::from_text("np.dot(a, b)");
        buf.move_word_right();
        assert_eq!(buf.cursor().col, 3);
        buf.move_end();
        buf.move_word_left();
        assert_eq!(buf.cursor().col, 10);
    }

    #[test]
    fn test_move_to_end_and_start() {
        let mut buf = EditorBuffer::from_text("a\nbcd");
        buf.move_to_end();
        assert_eq!(buf.cursor(), Cursor::at(1, 3));
        buf.move_to_start();
        assert_eq!(buf.cursor(), Cursor::at(0, 0));
    }
}
