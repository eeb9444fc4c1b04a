//! Frame layout: title bar, the screen for the current route, a key-hint
//! line, and the modal overlay on top.
//!
//! ```text
//! ┌ title bar ───────────────────────────────────────────┐
//! │ ┌ Chats ─────┐ ┌ message list ──────────────────────┐ │
//! │ │ sessions   │ │                                    │ │
//! │ │            │ ├ compose ───────────────────────────┤ │
//! │ └────────────┘ └────────────────────────────────────┘ │
//! └ key hints ───────────────────────────────────────────┘
//! ```

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;

use crate::core::state::{App, Route};
use crate::core::thread::ThreadState;
use crate::tui::component::Component;
use crate::tui::components::{
    AuthForm, AuthMode, MessageList, ModalView, Sidebar, TitleBar,
};
use crate::tui::{Focus, TuiState};

pub const HOME_HINT: &str = "Select or create a chat to begin";
const SIDEBAR_WIDTH: u16 = 30;

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState) {
    use Constraint::{Length, Min};
    let [title_area, body_area, help_area] =
        Layout::vertical([Length(1), Min(0), Length(1)]).areas(frame.area());

    TitleBar {
        server: &tui.server,
        signed_in: app.auth.is_authenticated(),
        status_message: &app.status_message,
    }
    .render(frame, title_area);

    match &app.route {
        Route::Login | Route::Register => {
            let mode = if app.route == Route::Login {
                AuthMode::Login
            } else {
                AuthMode::Register
            };
            AuthForm {
                state: &mut tui.auth_form,
                mode,
                form: &app.form,
                email_domain: app.email_policy.domain(),
            }
            .render(frame, body_area);
        }
        Route::Home | Route::Chat(_) => draw_main(frame, body_area, app, tui),
    }

    frame.render_widget(
        Paragraph::new(key_hints(app)).style(Style::default().fg(Color::DarkGray)),
        help_area,
    );

    if let Some(modal) = &app.modal {
        ModalView {
            modal,
            topic: &mut tui.topic,
        }
        .render(frame, frame.area());
    }
}

fn draw_main(frame: &mut Frame, area: Rect, app: &App, tui: &mut TuiState) {
    let [sidebar_area, main_area] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)]).areas(area);

    let modal_open = app.modal.is_some();
    Sidebar {
        state: &mut tui.sidebar,
        sessions: app.sessions.sessions(),
        active_id: app.active_session_id(),
        focused: !modal_open && tui.focus == Focus::Sidebar,
    }
    .render(frame, sidebar_area);

    let Some(thread) = app.thread.as_ref() else {
        let [_, middle, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(main_area);
        frame.render_widget(
            Paragraph::new(HOME_HINT)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            middle,
        );
        return;
    };

    tui.compose.title = match thread.state() {
        ThreadState::Editing => " Editing last message (Esc to cancel) ",
        ThreadState::Sending => " Message (waiting for reply…) ",
        ThreadState::Idle => " Message ",
    }
    .to_string();
    tui.compose.focused = !modal_open && tui.focus == Focus::Compose;

    let compose_height = tui.compose.calculate_height(main_area.width);
    let [list_area, compose_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(compose_height)])
            .areas(main_area);

    MessageList::new(&mut tui.message_list, thread, tui.pulse_value).render(frame, list_area);
    tui.compose.render(frame, compose_area);
}

fn key_hints(app: &App) -> &'static str {
    if app.modal.is_some() {
        return " Enter confirm · Esc cancel";
    }
    match app.route {
        Route::Login | Route::Register => {
            " Enter next/submit · Tab switch field · Ctrl+R login/register · Ctrl+C quit"
        }
        Route::Home => " ↑↓ select · Enter open · Ctrl+N new · Ctrl+D delete · Ctrl+L logout · Ctrl+C quit",
        Route::Chat(_) => {
            " Enter send · Ctrl+J newline · Ctrl+E edit last · Tab focus · Esc back · PgUp/PgDn scroll"
        }
    }
}
