use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::api::{Message, Role};
use crate::core::thread::SEND_FAILED;
use crate::tui::markdown;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// Pulse intensity above which the placeholder border turns bold.
const PULSE_BOLD_THRESHOLD: f32 = 0.5;

/// How a message bubble relates to the edit state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMarker {
    #[default]
    None,
    /// Last user message, edit available (Ctrl+E).
    Editable,
    /// This message is being rewritten in the compose box.
    Editing,
}

/// One chat bubble. Transient: built each frame from a borrowed message.
///
/// User text is shown verbatim; assistant replies are rendered as markdown.
/// The "Thinking…" placeholder pulses while the reply is outstanding and a
/// failed send shows in red.
#[derive(Clone, Copy)]
pub struct MessageView<'a> {
    pub message: &'a Message,
    pub marker: EditMarker,
    pub pulse: f32,
}

impl<'a> MessageView<'a> {
    pub fn new(message: &'a Message, marker: EditMarker, pulse: f32) -> Self {
        Self {
            message,
            marker,
            pulse,
        }
    }

    /// Rows this message needs at `width`, borders included.
    ///
    /// Measured with `Paragraph::line_count` on the exact text that
    /// [`render`](Widget::render) draws, so the scroll canvas and the drawing
    /// never disagree.
    pub fn calculate_height(message: &Message, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let body = body_text(message);
        if body.lines.is_empty() {
            return VERTICAL_OVERHEAD;
        }
        let lines = Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .line_count(content_width);
        (lines as u16).max(1) + VERTICAL_OVERHEAD
    }
}

pub fn role_label(message: &Message) -> &'static str {
    match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    }
}

pub fn role_style(message: &Message) -> Style {
    if message.transient {
        return Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);
    }
    match message.role {
        Role::User => Style::default().fg(Color::Green),
        Role::Assistant if is_failure(message) => Style::default().fg(Color::Red),
        Role::Assistant => Style::default().fg(Color::Blue),
    }
}

fn is_failure(message: &Message) -> bool {
    message.role == Role::Assistant && message.message == SEND_FAILED
}

fn body_text(message: &Message) -> Text<'static> {
    let content = message.message.trim();
    if content.is_empty() {
        return Text::default();
    }
    match message.role {
        Role::Assistant if !message.transient && !is_failure(message) => {
            markdown::render(content, Color::Blue)
        }
        _ => Text::from(
            content
                .lines()
                .map(|l| Line::from(l.to_string()))
                .collect::<Vec<_>>(),
        )
        .style(role_style(message)),
    }
}

impl<'a> Widget for MessageView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = role_style(self.message);

        let mut border_style = match self.marker {
            EditMarker::Editing => Style::default().fg(Color::Yellow),
            _ => style.add_modifier(Modifier::DIM),
        };
        if self.message.transient && self.pulse > PULSE_BOLD_THRESHOLD {
            border_style = border_style
                .remove_modifier(Modifier::DIM)
                .add_modifier(Modifier::BOLD);
        }

        let title = match self.marker {
            EditMarker::Editing => format!("{} (editing)", role_label(self.message)),
            _ => role_label(self.message).to_string(),
        };

        let mut block = Block::bordered()
            .title(title)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        if self.marker == EditMarker::Editable {
            block = block.title_bottom(Line::from(" Ctrl+E edit ").right_aligned());
        }

        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(body_text(self.message))
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
