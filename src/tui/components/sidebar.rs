//! # Sidebar Component
//!
//! The signed-in user's sessions, newest first as the server returns them.
//! Up/Down moves the selection, Enter opens the selected session. The
//! active session is marked so it stays visible while focus is elsewhere.
//!
//! `SidebarState` lives in `TuiState`; `Sidebar` is built each frame.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, List, ListItem, ListState, Padding, Paragraph};

use crate::api::Session;
use crate::tui::component::Component;
use crate::tui::event::TuiEvent;

const NO_SESSIONS: &str = "No chats yet.\nCtrl+N starts one.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarEvent {
    Open(String),
}

#[derive(Default)]
pub struct SidebarState {
    pub list_state: ListState,
    pub selected: usize,
}

impl SidebarState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session under the cursor.
    pub fn selected_session<'a>(&self, sessions: &'a [Session]) -> Option<&'a Session> {
        sessions.get(self.selected)
    }

    /// Move the cursor onto `session_id` if it is listed.
    pub fn select_id(&mut self, sessions: &[Session], session_id: &str) {
        if let Some(index) = sessions.iter().position(|s| s.session_id == session_id) {
            self.selected = index;
        }
    }

    /// Keep the cursor inside the list after it shrinks or grows.
    pub fn sync(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
            self.list_state.select(None);
        } else {
            self.selected = self.selected.min(len - 1);
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn handle_event(&mut self, event: &TuiEvent, sessions: &[Session]) -> Option<SidebarEvent> {
        if sessions.is_empty() {
            return None;
        }
        match event {
            TuiEvent::CursorUp => {
                self.selected = self.selected.saturating_sub(1);
                self.sync(sessions.len());
                None
            }
            TuiEvent::CursorDown => {
                self.selected = (self.selected + 1).min(sessions.len() - 1);
                self.sync(sessions.len());
                None
            }
            TuiEvent::Submit => self
                .selected_session(sessions)
                .map(|s| SidebarEvent::Open(s.session_id.clone())),
            _ => None,
        }
    }
}

pub struct Sidebar<'a> {
    pub state: &'a mut SidebarState,
    pub sessions: &'a [Session],
    pub active_id: Option<&'a str>,
    pub focused: bool,
}

impl<'a> Component for Sidebar<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.state.sync(self.sessions.len());

        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(" Chats ")
            .title_bottom(Line::from(" Ctrl+N new  Ctrl+D delete ").centered())
            .padding(Padding::horizontal(1));

        if self.sessions.is_empty() {
            let empty = Paragraph::new(NO_SESSIONS)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .sessions
            .iter()
            .enumerate()
            .map(|(i, session)| {
                let is_active = self.active_id == Some(session.session_id.as_str());
                let mut style = if is_active {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                if self.focused && i == self.state.selected {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                let marker = if is_active { "● " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, style),
                    Span::styled(session.display_topic().to_string(), style),
                ]))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, area, &mut self.state.list_state);
    }
}
