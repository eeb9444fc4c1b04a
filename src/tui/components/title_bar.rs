//! # TitleBar Component
//!
//! One line at the top: app name, the server in use, and the status message.
//! Purely presentational; every field is a prop.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

pub const APP_TITLE: &str = "Support Chat";

pub struct TitleBar<'a> {
    pub server: &'a str,
    pub signed_in: bool,
    pub status_message: &'a str,
}

impl<'a> Component for TitleBar<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let (badge, badge_style) = if self.signed_in {
            ("● signed in", Style::default().fg(Color::Green))
        } else {
            ("○ signed out", Style::default().fg(Color::DarkGray))
        };

        let mut spans = vec![
            Span::styled(APP_TITLE, Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!(" ({})", self.server), Style::default().fg(Color::DarkGray)),
            Span::raw(" "),
            Span::styled(badge, badge_style),
        ];
        if !self.status_message.is_empty() {
            spans.push(Span::raw(" | "));
            spans.push(Span::raw(self.status_message.to_string()));
        }
        frame.render_widget(Line::from(spans), area);
    }
}
