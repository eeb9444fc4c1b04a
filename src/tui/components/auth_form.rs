//! # Auth Form Component
//!
//! Email + password form shared by the login and register screens. Enter on
//! the email field moves to the password; Enter on the password submits.
//! Validation and error text come from the reducer via [`FormState`].

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap};

use crate::core::action::Credentials;
use crate::core::state::FormState;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::modal::centered_rect;
use crate::tui::components::text_field::{TextField, TextFieldEvent};
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Email,
    Password,
}

pub struct AuthFormState {
    pub email: TextField,
    pub password: TextField,
    focus: Field,
}

impl Default for AuthFormState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthFormState {
    pub fn new() -> Self {
        Self {
            email: TextField::single_line(" Email "),
            password: TextField::masked(" Password "),
            focus: Field::Email,
        }
    }

    /// Empty both fields; called when switching screens or signing out.
    pub fn reset(&mut self) {
        self.email.clear();
        self.password.clear();
        self.focus = Field::Email;
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.text().to_string(),
            password: self.password.text().to_string(),
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::Email => Field::Password,
            Field::Password => Field::Email,
        };
    }
}

impl EventHandler for AuthFormState {
    type Event = Credentials;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::FocusNext | TuiEvent::FocusPrev | TuiEvent::CursorUp | TuiEvent::CursorDown => {
                self.toggle_focus();
                None
            }
            _ => {
                let field = match self.focus {
                    Field::Email => &mut self.email,
                    Field::Password => &mut self.password,
                };
                match field.handle_event(event) {
                    Some(TextFieldEvent::Submit(_)) if self.focus == Field::Email => {
                        self.focus = Field::Password;
                        None
                    }
                    Some(TextFieldEvent::Submit(_)) => Some(self.credentials()),
                    _ => None,
                }
            }
        }
    }
}

pub struct AuthForm<'a> {
    pub state: &'a mut AuthFormState,
    pub mode: AuthMode,
    pub form: &'a FormState,
    pub email_domain: &'a str,
}

impl<'a> Component for AuthForm<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let (title, switch_hint) = match self.mode {
            AuthMode::Login => (" Sign in ", " Ctrl+R create an account "),
            AuthMode::Register => (" Create account ", " Ctrl+R back to sign in "),
        };

        let overlay = centered_rect(56, 14, area);
        frame.render_widget(Clear, overlay);
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(Line::from(title).centered())
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .title_bottom(Line::from(switch_hint).centered())
            .padding(Padding::horizontal(2));
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let [hint_area, email_area, password_area, feedback_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .areas(inner);

        frame.render_widget(
            Paragraph::new(format!("Use your @{} email address.", self.email_domain))
                .style(Style::default().fg(Color::DarkGray)),
            hint_area,
        );

        let editing = !self.form.busy;
        self.state.email.focused = editing && self.state.focus == Field::Email;
        self.state.password.focused = editing && self.state.focus == Field::Password;
        self.state.email.render(frame, email_area);
        self.state.password.render(frame, password_area);

        let feedback = if self.form.busy {
            let busy = match self.mode {
                AuthMode::Login => "Signing in…",
                AuthMode::Register => "Creating account…",
            };
            Paragraph::new(busy).style(Style::default().fg(Color::Yellow))
        } else if let Some(error) = &self.form.error {
            Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red))
        } else {
            Paragraph::new("Enter to submit · Tab to switch field")
                .style(Style::default().fg(Color::DarkGray))
        };
        frame.render_widget(feedback.wrap(Wrap { trim: true }), feedback_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn type_str(state: &mut AuthFormState, text: &str) {
        for c in text.chars() {
            state.handle_event(&TuiEvent::InputChar(c));
        }
    }

    fn draw(form: &mut AuthForm<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| form.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_enter_moves_to_password_then_submits() {
        let mut state = AuthFormState::new();
        type_str(&mut state, "a@binus.ac.id");
        assert_eq!(state.handle_event(&TuiEvent::Submit), None);
        type_str(&mut state, "Secret1!");
        let submitted = state.handle_event(&TuiEvent::Submit).unwrap();
        assert_eq!(submitted.email, "a@binus.ac.id");
        assert_eq!(submitted.password, "Secret1!");
    }

    #[test]
    fn test_tab_switches_field() {
        let mut state = AuthFormState::new();
        state.handle_event(&TuiEvent::FocusNext);
        type_str(&mut state, "pw");
        assert_eq!(state.password.text(), "pw");
        assert_eq!(state.email.text(), "");
    }

    #[test]
    fn test_reset_clears_fields() {
        let mut state = AuthFormState::new();
        type_str(&mut state, "me");
        state.handle_event(&TuiEvent::FocusNext);
        type_str(&mut state, "pw");
        state.reset();
        assert_eq!(state.email.text(), "");
        assert_eq!(state.password.text(), "");
        type_str(&mut state, "x");
        assert_eq!(state.email.text(), "x");
    }

    #[test]
    fn test_render_login_with_error() {
        let mut state = AuthFormState::new();
        let form = FormState {
            error: Some("Invalid email or password".into()),
            busy: false,
        };
        let text = draw(&mut AuthForm {
            state: &mut state,
            mode: AuthMode::Login,
            form: &form,
            email_domain: "binus.ac.id",
        });
        assert!(text.contains("Sign in"));
        assert!(text.contains("@binus.ac.id"));
        assert!(text.contains("Invalid email or password"));
    }

    #[test]
    fn test_render_register_busy() {
        let mut state = AuthFormState::new();
        let form = FormState {
            error: None,
            busy: true,
        };
        let text = draw(&mut AuthForm {
            state: &mut state,
            mode: AuthMode::Register,
            form: &form,
            email_domain: "binus.ac.id",
        });
        assert!(text.contains("Create account"));
        assert!(text.contains("Creating account"));
    }
}
