//! # MessageList Component
//!
//! Scrollable view of the open chat thread.
//!
//! `MessageList` is transient (built each frame) and borrows
//! `&mut MessageListState`, which lives in `TuiState` and carries the scroll
//! position and measured heights between frames. Heights are re-measured
//! only when the width or the thread content changes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect, Size};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::api::Message;
use crate::core::thread::ChatThread;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::{EditMarker, MessageView};
use crate::tui::event::TuiEvent;

pub const EMPTY_THREAD: &str = "No messages yet. Ask the assistant anything.";

pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    /// Follow new messages until the user scrolls up.
    pub stick_to_bottom: bool,
    pub viewport_height: u16,
    heights: Vec<u16>,
    measured_width: u16,
    measured_content: u64,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            stick_to_bottom: true,
            viewport_height: 0,
            heights: Vec::new(),
            measured_width: 0,
            measured_content: 0,
        }
    }

    /// Back to the bottom with nothing measured; used when another thread opens.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn heights(&self) -> &[u16] {
        &self.heights
    }

    fn content_height(&self) -> u16 {
        self.heights.iter().sum()
    }

    fn max_offset(&self) -> u16 {
        self.content_height().saturating_sub(self.viewport_height)
    }

    /// Keep the offset inside the content.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Scrolling down to the end re-attaches to the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    fn measure(&mut self, messages: &[Message], width: u16) {
        let fingerprint = fingerprint(messages);
        if width == self.measured_width
            && fingerprint == self.measured_content
            && self.heights.len() == messages.len()
        {
            return;
        }
        self.heights = messages
            .iter()
            .map(|m| MessageView::calculate_height(m, width))
            .collect();
        self.measured_width = width;
        self.measured_content = fingerprint;
    }
}

fn fingerprint(messages: &[Message]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for message in messages {
        message.role.hash(&mut hasher);
        message.message.hash(&mut hasher);
        message.transient.hash(&mut hasher);
    }
    hasher.finish()
}

pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub thread: &'a ChatThread,
    pub pulse: f32,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut MessageListState, thread: &'a ChatThread, pulse: f32) -> Self {
        Self {
            state,
            thread,
            pulse,
        }
    }

    fn marker_for(&self, index: usize) -> EditMarker {
        if self.thread.editing_index() == Some(index) {
            EditMarker::Editing
        } else if self.thread.can_edit() && self.thread.last_user_index() == Some(index) {
            EditMarker::Editable
        } else {
            EditMarker::None
        }
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let messages = self.thread.messages();
        if messages.is_empty() {
            let hint = Paragraph::new(EMPTY_THREAD)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            let middle = Rect {
                y: area.y + area.height / 2,
                height: area.height.min(1),
                ..area
            };
            frame.render_widget(hint, middle);
            return;
        }

        // One column stays free for the scrollbar.
        let content_width = area.width.saturating_sub(1);
        self.state.measure(messages, content_width);
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let total = self.state.content_height();
        let mut scroll_view = ScrollView::new(Size::new(content_width, total))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y = 0u16;
        for (index, message) in messages.iter().enumerate() {
            let height = self.state.heights[index];
            let pulse = if message.transient { self.pulse } else { 0.0 };
            let view = MessageView::new(message, self.marker_for(index), pulse);
            scroll_view.render_widget(view, Rect::new(0, y, content_width, height));
            y = y.saturating_add(height);
        }

        if self.state.stick_to_bottom {
            let bottom = self.state.max_offset();
            self.state.scroll_state.set_offset(Position { x: 0, y: bottom });
        }
        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// Scrolling is the only input the list reacts to.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}
