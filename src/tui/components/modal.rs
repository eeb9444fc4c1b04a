//! # Modal Overlay
//!
//! Draws the single [`Modal`] the app may be showing on top of everything
//! else: the new-chat topic prompt, the delete confirmation, a one-line alert
//! and the post-registration notice. Which keys do what is decided by the
//! event loop; this file only draws.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap};

use crate::core::account::{REGISTER_SUCCESS_BODY, REGISTER_SUCCESS_TITLE};
use crate::core::state::Modal;
use crate::tui::component::Component;
use crate::tui::components::text_field::TextField;

pub const NEW_CHAT_TITLE: &str = " New chat ";
pub const DELETE_TITLE: &str = "Delete this session?";

const OVERLAY_WIDTH: u16 = 64;

/// Body of the delete confirmation; a blank topic leaves out the quote.
pub fn confirm_delete_body(topic: &str) -> String {
    if topic.trim().is_empty() {
        "Delete this session? This cannot be undone.".to_string()
    } else {
        format!("Delete this session (“{}”)? This cannot be undone.", topic.trim())
    }
}

/// A `width` x `height` box centered in `outer`, shrunk to fit.
pub fn centered_rect(width: u16, height: u16, outer: Rect) -> Rect {
    let [_, row, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(outer.height)),
        Constraint::Fill(1),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(outer.width)),
        Constraint::Fill(1),
    ])
    .areas(row);
    center
}

pub struct ModalView<'a> {
    pub modal: &'a Modal,
    /// Topic input; only drawn for [`Modal::NewChat`].
    pub topic: &'a mut TextField,
}

impl<'a> ModalView<'a> {
    fn frame_block(title: &str, accent: Color, hint: &str) -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent))
            .title(Line::from(title.to_string()).centered())
            .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
            .title_bottom(Line::from(format!(" {hint} ")).centered())
            .padding(Padding::new(2, 2, 1, 0))
    }

    fn render_message(frame: &mut Frame, area: Rect, block: Block<'static>, body: String) {
        let overlay = centered_rect(OVERLAY_WIDTH, 7, area);
        frame.render_widget(Clear, overlay);
        let paragraph = Paragraph::new(body)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, overlay);
    }
}

impl<'a> Component for ModalView<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        match self.modal {
            Modal::NewChat => {
                let overlay = centered_rect(OVERLAY_WIDTH, 7, area);
                frame.render_widget(Clear, overlay);
                let block = Self::frame_block(NEW_CHAT_TITLE, Color::Cyan, "Enter create · Esc cancel");
                let inner = block.inner(overlay);
                frame.render_widget(block, overlay);

                self.topic.title = " Topic ".to_string();
                self.topic.focused = true;
                let field_area = Rect {
                    height: inner.height.min(3),
                    ..inner
                };
                self.topic.render(frame, field_area);
            }
            Modal::ConfirmDelete { topic, .. } => Self::render_message(
                frame,
                area,
                Self::frame_block(DELETE_TITLE, Color::Red, "y delete · n/Esc cancel"),
                confirm_delete_body(topic),
            ),
            Modal::Alert(message) => Self::render_message(
                frame,
                area,
                Self::frame_block("Error", Color::Red, "Enter OK"),
                message.clone(),
            ),
            Modal::RegisterSuccess => Self::render_message(
                frame,
                area,
                Self::frame_block(REGISTER_SUCCESS_TITLE, Color::Green, "Enter continue to login"),
                REGISTER_SUCCESS_BODY.to_string(),
            ),
        }
    }
}
