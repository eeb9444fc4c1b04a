//! # TextField Component
//!
//! Editable text with a bordered block. Used for the compose box (multi-line,
//! grows up to [`MAX_VISIBLE_LINES`]), the login/register fields (single line,
//! optionally masked) and the new-chat topic prompt.
//!
//! The buffer and cursor are internal state; `focused` and `title` are props
//! the parent sets before rendering. Enter never clears the buffer: whoever
//! consumes [`TextFieldEvent::Submit`] decides whether the text was accepted.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2) consumed horizontally.
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders.
pub const VERTICAL_OVERHEAD: u16 = 2;
/// Compose box lines shown before it starts scrolling internally.
pub const MAX_VISIBLE_LINES: u16 = 5;
const MASK: char = '•';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFieldEvent {
    Submit(String),
    Changed,
}

pub struct TextField {
    buffer: String,
    /// Cursor as a byte offset into `buffer`, always on a char boundary.
    pos: usize,
    /// First wrapped line shown when content is taller than the box.
    scroll_offset: u16,
    multiline: bool,
    masked: bool,
    pub title: String,
    pub focused: bool,
}

impl TextField {
    pub fn single_line(title: impl Into<String>) -> Self {
        Self {
            buffer: String::new(),
            pos: 0,
            scroll_offset: 0,
            multiline: false,
            masked: false,
            title: title.into(),
            focused: false,
        }
    }

    pub fn multi_line(title: impl Into<String>) -> Self {
        Self {
            multiline: true,
            ..Self::single_line(title)
        }
    }

    /// Single line shown as bullets.
    pub fn masked(title: impl Into<String>) -> Self {
        Self {
            masked: true,
            ..Self::single_line(title)
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Replace the content and put the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = if self.multiline {
            text.to_string()
        } else {
            text.replace('\n', " ")
        };
        self.pos = self.buffer.len();
        self.scroll_offset = 0;
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }

    /// Box height for the given outer width, including borders.
    pub fn calculate_height(&self, width: u16) -> u16 {
        if !self.multiline {
            return 1 + VERTICAL_OVERHEAD;
        }
        let lines = wrap_line_count(&self.buffer, inner_width(width));
        lines.min(MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    fn display_text(&self) -> String {
        if self.masked {
            MASK.to_string().repeat(self.buffer.chars().count())
        } else {
            self.buffer.clone()
        }
    }

    fn insert(&mut self, text: &str) {
        let text = if self.multiline {
            text.to_string()
        } else {
            text.replace(['\r', '\n'], " ")
        };
        self.buffer.insert_str(self.pos, &text);
        self.pos += text.len();
    }

    /// Wrapped line (0-based) the cursor sits on.
    fn cursor_line(&self, width: u16) -> u16 {
        if width == 0 || !self.multiline {
            return 0;
        }
        let before = &self.buffer[..self.pos];
        let lines = textwrap::wrap(before, wrap_options(width));
        let mut line = lines.len().saturating_sub(1) as u16;
        // textwrap drops the empty line after a trailing newline.
        if before.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
            line += 1;
        }
        line
    }

    /// Display column of the cursor within its wrapped line.
    fn cursor_column(&self, width: u16) -> u16 {
        if self.masked {
            return self.buffer[..self.pos].chars().count() as u16;
        }
        let before = &self.buffer[..self.pos];
        let logical = &before[before.rfind('\n').map_or(0, |i| i + 1)..];
        if !self.multiline || width == 0 {
            return logical.width() as u16;
        }
        // Wrapped segments lose trailing spaces, so measure what the last
        // segment leaves over instead of the segment itself.
        let segments = textwrap::wrap(logical, wrap_options(width));
        let consumed: usize = segments
            .iter()
            .take(segments.len().saturating_sub(1))
            .map(|s| s.width())
            .sum();
        logical.width().saturating_sub(consumed) as u16
    }

    fn update_scroll_offset(&mut self, width: u16) {
        let total = wrap_line_count(&self.buffer, width);
        if !self.multiline || total <= MAX_VISIBLE_LINES {
            self.scroll_offset = 0;
            return;
        }
        let line = self.cursor_line(width);
        if line < self.scroll_offset {
            self.scroll_offset = line;
        } else if line >= self.scroll_offset + MAX_VISIBLE_LINES {
            self.scroll_offset = line + 1 - MAX_VISIBLE_LINES;
        }
    }

    fn visible_text(&self, width: u16) -> String {
        let text = self.display_text();
        if self.scroll_offset == 0 || width == 0 {
            return text;
        }
        let lines = textwrap::wrap(&text, wrap_options(width));
        let start = (self.scroll_offset as usize).min(lines.len());
        let end = (start + MAX_VISIBLE_LINES as usize).min(lines.len());
        lines[start..end].join("\n")
    }
}

impl Component for TextField {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = inner_width(area.width);
        self.update_scroll_offset(width);

        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(self.title.as_str())
            .title_style(border_style.add_modifier(Modifier::BOLD))
            .padding(Padding::horizontal(1));

        let paragraph = Paragraph::new(self.visible_text(width)).block(block);
        let paragraph = if self.multiline {
            paragraph.wrap(ratatui::widgets::Wrap { trim: false })
        } else {
            paragraph
        };
        frame.render_widget(paragraph, area);

        if self.focused {
            let row = self.cursor_line(width).saturating_sub(self.scroll_offset);
            let col = self.cursor_column(width).min(width);
            frame.set_cursor_position((area.x + 2 + col, area.y + 1 + row));
        }
    }
}

impl EventHandler for TextField {
    type Event = TextFieldEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.insert(c.encode_utf8(&mut [0; 4]));
                Some(TextFieldEvent::Changed)
            }
            TuiEvent::Paste(text) => {
                self.insert(text);
                Some(TextFieldEvent::Changed)
            }
            TuiEvent::Backspace => {
                let prev = prev_char_boundary(&self.buffer, self.pos)?;
                self.buffer.drain(prev..self.pos);
                self.pos = prev;
                Some(TextFieldEvent::Changed)
            }
            TuiEvent::Delete => {
                let next = next_char_boundary(&self.buffer, self.pos)?;
                self.buffer.drain(self.pos..next);
                Some(TextFieldEvent::Changed)
            }
            TuiEvent::CursorLeft => {
                self.pos = prev_char_boundary(&self.buffer, self.pos)?;
                Some(TextFieldEvent::Changed)
            }
            TuiEvent::CursorRight => {
                self.pos = next_char_boundary(&self.buffer, self.pos)?;
                Some(TextFieldEvent::Changed)
            }
            TuiEvent::CursorHome => {
                let line_start = self.buffer[..self.pos].rfind('\n').map_or(0, |i| i + 1);
                (self.pos != line_start).then(|| {
                    self.pos = line_start;
                    TextFieldEvent::Changed
                })
            }
            TuiEvent::CursorEnd => {
                let line_end = self.buffer[self.pos..]
                    .find('\n')
                    .map_or(self.buffer.len(), |i| self.pos + i);
                (self.pos != line_end).then(|| {
                    self.pos = line_end;
                    TextFieldEvent::Changed
                })
            }
            TuiEvent::Submit => Some(TextFieldEvent::Submit(self.buffer.clone())),
            _ => None,
        }
    }
}

// ============================================================================
// Wrapping helpers
// ============================================================================

fn inner_width(outer: u16) -> u16 {
    outer.saturating_sub(HORIZONTAL_OVERHEAD)
}

fn wrap_options(width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

fn wrap_line_count(text: &str, width: u16) -> u16 {
    if width == 0 || text.is_empty() {
        return 1;
    }
    let lines = textwrap::wrap(text, wrap_options(width));
    let mut count = (lines.len() as u16).max(1);
    if text.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
        count += 1;
    }
    count
}

fn prev_char_boundary(text: &str, pos: usize) -> Option<usize> {
    text[..pos].char_indices().next_back().map(|(i, _)| i)
}

fn next_char_boundary(text: &str, pos: usize) -> Option<usize> {
    text[pos..].chars().next().map(|c| pos + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn type_str(field: &mut TextField, text: &str) {
        for c in text.chars() {
            field.handle_event(&TuiEvent::InputChar(c));
        }
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut field = TextField::single_line("Email");
        type_str(&mut field, "ab");
        assert_eq!(field.text(), "ab");
        assert_eq!(
            field.handle_event(&TuiEvent::Backspace),
            Some(TextFieldEvent::Changed)
        );
        assert_eq!(field.text(), "a");
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut field = TextField::single_line("Email");
        assert_eq!(field.handle_event(&TuiEvent::Backspace), None);
    }

    #[test]
    fn test_multibyte_editing() {
        let mut field = TextField::single_line("Topic");
        type_str(&mut field, "héllo");
        field.handle_event(&TuiEvent::CursorLeft);
        field.handle_event(&TuiEvent::CursorLeft);
        field.handle_event(&TuiEvent::CursorLeft);
        field.handle_event(&TuiEvent::Backspace);
        assert_eq!(field.text(), "hllo");
        field.handle_event(&TuiEvent::Delete);
        assert_eq!(field.text(), "hlo");
    }

    #[test]
    fn test_submit_keeps_buffer() {
        let mut field = TextField::multi_line("Message");
        type_str(&mut field, "hello");
        assert_eq!(
            field.handle_event(&TuiEvent::Submit),
            Some(TextFieldEvent::Submit("hello".into()))
        );
        assert_eq!(field.text(), "hello");
    }

    #[test]
    fn test_single_line_flattens_newlines() {
        let mut field = TextField::single_line("Topic");
        field.handle_event(&TuiEvent::Paste("a\nb".into()));
        assert_eq!(field.text(), "a b");
    }

    #[test]
    fn test_multi_line_keeps_newlines() {
        let mut field = TextField::multi_line("Message");
        field.handle_event(&TuiEvent::Paste("a\nb".into()));
        assert_eq!(field.text(), "a\nb");
        assert_eq!(field.calculate_height(40), 2 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn test_height_is_capped() {
        let mut field = TextField::multi_line("Message");
        field.set_text("1\n2\n3\n4\n5\n6\n7\n8");
        assert_eq!(
            field.calculate_height(40),
            MAX_VISIBLE_LINES + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn test_set_text_moves_cursor_to_end() {
        let mut field = TextField::multi_line("Message");
        field.set_text("seed");
        type_str(&mut field, "!");
        assert_eq!(field.text(), "seed!");
    }

    #[test]
    fn test_home_and_end() {
        let mut field = TextField::single_line("Email");
        type_str(&mut field, "abc");
        assert_eq!(
            field.handle_event(&TuiEvent::CursorHome),
            Some(TextFieldEvent::Changed)
        );
        assert_eq!(field.handle_event(&TuiEvent::CursorHome), None);
        type_str(&mut field, ">");
        assert_eq!(field.text(), ">abc");
        field.handle_event(&TuiEvent::CursorEnd);
        type_str(&mut field, "<");
        assert_eq!(field.text(), ">abc<");
    }

    #[test]
    fn test_masked_field_hides_password() {
        let mut field = TextField::masked("Password");
        type_str(&mut field, "secret");
        let mut terminal = Terminal::new(TestBackend::new(30, 3)).unwrap();
        terminal.draw(|f| field.render(f, f.area())).unwrap();
        let text = screen_text(&terminal);
        assert!(!text.contains("secret"));
        assert!(text.contains("••••••"));
        assert_eq!(field.text(), "secret");
    }

    #[test]
    fn test_render_shows_title_and_text() {
        let mut field = TextField::multi_line("Message");
        field.set_text("hello there");
        let mut terminal = Terminal::new(TestBackend::new(30, 3)).unwrap();
        terminal.draw(|f| field.render(f, f.area())).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Message"));
        assert!(text.contains("hello there"));
    }

    #[test]
    fn test_cursor_column_counts_trailing_space() {
        let mut field = TextField::multi_line("Message");
        type_str(&mut field, "ab ");
        assert_eq!(field.cursor_column(20), 3);
    }
}
