//! # TUI Adapter
//!
//! The ratatui-specific layer. Reads the terminal, turns keys into
//! `core::Action`s, runs `update()`, and performs the returned `Effect`:
//! network calls are spawned on tokio tasks that send their result back as
//! another `Action` over an mpsc channel.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! - **Waiting** (a reply or a login is in flight): draws every ~80ms so the
//!   "Thinking…" placeholder can pulse.
//! - **Idle**: sleeps up to 500ms and only redraws on input, resize or a
//!   finished background task.
//!
//! A `SteadyBlock` cursor is used because `set_cursor_position` resets the
//! blink timer on every `draw()`, which makes blinking cursors flicker.

mod component;
mod components;
mod event;
pub mod markdown;
mod ui;

use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};

use crate::api::{ChatApi, HttpApi};
use crate::core::account;
use crate::core::action::{Action, Effect, update};
use crate::core::auth::{AuthContext, TokenStore};
use crate::core::config::ResolvedConfig;
use crate::core::state::{App, Modal, Route};
use crate::core::validation::EmailPolicy;
use crate::tui::component::EventHandler;
use crate::tui::components::{
    AuthFormState, MessageListState, SidebarEvent, SidebarState, TextField, TextFieldEvent,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Which pane receives typing on the home/chat screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Compose,
}

/// Presentation state that `App` does not need to know about.
pub struct TuiState {
    pub focus: Focus,
    pub compose: TextField,
    pub auth_form: AuthFormState,
    /// Topic input of the new-chat modal.
    pub topic: TextField,
    pub sidebar: SidebarState,
    pub message_list: MessageListState,
    pub pulse_value: f32,
    /// Base URL shown in the title bar.
    pub server: String,
}

impl TuiState {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            focus: Focus::Sidebar,
            compose: TextField::multi_line(" Message "),
            auth_form: AuthFormState::new(),
            topic: TextField::single_line(" Topic "),
            sidebar: SidebarState::new(),
            message_list: MessageListState::new(),
            pulse_value: 0.0,
            server: server.into(),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // The kitty protocol is pushed unconditionally; terminals without it
        // ignore the sequence.
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let auth = AuthContext::new(TokenStore::default_location());
    let api: Arc<dyn ChatApi> = Arc::new(HttpApi::new(config.base_url.clone(), auth.clone()));
    let mut app = App::new(auth, EmailPolicy::new(&config.email_domain));
    let mut tui = TuiState::new(config.base_url.clone());
    let mut auth_rx = app.auth.subscribe();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let (tx, rx) = mpsc::channel();

    if app.auth.is_authenticated() {
        info!("Stored token found, loading sessions");
        perform(Effect::LoadSessions, &app, &mut tui, &api, &tx);
    }

    let start_time = Instant::now();
    let mut needs_redraw = true;

    'main: loop {
        let waiting = app.form.busy || app.thread.as_ref().is_some_and(|t| t.is_pending());
        if waiting {
            needs_redraw = true;
        }

        if needs_redraw {
            let elapsed = start_time.elapsed().as_secs_f32();
            tui.pulse_value = (elapsed * 5.0).sin() * 0.5 + 0.5;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui))?;
            needs_redraw = false;
        }

        let timeout = if waiting {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Each event is applied before the next is mapped, so keys typed
        // right after Ctrl+N already land in the modal.
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if let Some(action) = map_event(&app, &mut tui, &event)
                && apply(action, &mut app, &mut tui, &api, &tx)
            {
                break 'main;
            }
        }

        // A 401 inside a background task shows up here as `Expired`.
        if auth_rx.has_changed().unwrap_or(false) {
            let status = *auth_rx.borrow_and_update();
            debug!("Auth status changed: {:?}", status);
            needs_redraw = true;
            apply(Action::AuthChanged(status), &mut app, &mut tui, &api, &tx);
        }

        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            if apply(action, &mut app, &mut tui, &api, &tx) {
                break 'main;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

/// Run one action through the reducer and carry out its effect. Returns
/// true when the app should exit.
fn apply(
    action: Action,
    app: &mut App,
    tui: &mut TuiState,
    api: &Arc<dyn ChatApi>,
    tx: &mpsc::Sender<Action>,
) -> bool {
    debug!("Event loop applying: {:?}", action);
    let was_public = app.route.is_public();
    let effect = update(app, action);
    sync_route(was_public, app, tui);
    perform(effect, app, tui, api, tx)
}

/// Reset presentation state when crossing the sign-in boundary.
fn sync_route(was_public: bool, app: &App, tui: &mut TuiState) {
    let is_public = app.route.is_public();
    if was_public != is_public {
        tui.auth_form.reset();
        tui.compose.clear();
        tui.message_list.reset();
        tui.sidebar = SidebarState::new();
        tui.focus = Focus::Sidebar;
    }
    if app.route == Route::Home && tui.focus == Focus::Compose {
        tui.focus = Focus::Sidebar;
    }
}

/// Translate one terminal event into at most one action, updating
/// presentation state on the way.
pub fn map_event(app: &App, tui: &mut TuiState, event: &TuiEvent) -> Option<Action> {
    match event {
        TuiEvent::ForceQuit => return Some(Action::Quit),
        TuiEvent::Resize => return None,
        _ => {}
    }

    if let Some(modal) = &app.modal {
        return map_modal_event(modal, tui, event);
    }

    match &app.route {
        Route::Login | Route::Register => map_auth_event(&app.route, tui, event),
        Route::Home | Route::Chat(_) => map_main_event(app, tui, event),
    }
}

fn map_modal_event(modal: &Modal, tui: &mut TuiState, event: &TuiEvent) -> Option<Action> {
    match modal {
        Modal::NewChat => match event {
            TuiEvent::Escape => Some(Action::DismissModal),
            _ => match tui.topic.handle_event(event) {
                Some(TextFieldEvent::Submit(topic)) => Some(Action::CreateSession(topic)),
                _ => None,
            },
        },
        Modal::ConfirmDelete { .. } => match event {
            TuiEvent::InputChar('y') | TuiEvent::InputChar('Y') | TuiEvent::Submit => {
                Some(Action::ConfirmDelete)
            }
            TuiEvent::InputChar('n') | TuiEvent::InputChar('N') | TuiEvent::Escape => {
                Some(Action::DismissModal)
            }
            _ => None,
        },
        Modal::Alert(_) | Modal::RegisterSuccess => match event {
            TuiEvent::Submit | TuiEvent::Escape => Some(Action::DismissModal),
            _ => None,
        },
    }
}

fn map_auth_event(route: &Route, tui: &mut TuiState, event: &TuiEvent) -> Option<Action> {
    match event {
        TuiEvent::ToggleAuthMode => {
            tui.auth_form.reset();
            Some(if *route == Route::Login {
                Action::ShowRegister
            } else {
                Action::ShowLogin
            })
        }
        _ => {
            let credentials = tui.auth_form.handle_event(event)?;
            Some(if *route == Route::Login {
                Action::SubmitLogin(credentials)
            } else {
                Action::SubmitRegister(credentials)
            })
        }
    }
}

fn map_main_event(app: &App, tui: &mut TuiState, event: &TuiEvent) -> Option<Action> {
    let in_chat = matches!(app.route, Route::Chat(_));
    match event {
        TuiEvent::Logout => Some(Action::Logout),
        TuiEvent::NewChat => {
            tui.topic.clear();
            Some(Action::OpenNewChat)
        }
        TuiEvent::DeleteSession => {
            let target = match (tui.focus, app.active_session_id()) {
                (Focus::Compose, Some(active)) => Some(active.to_string()),
                _ => tui
                    .sidebar
                    .selected_session(app.sessions.sessions())
                    .map(|s| s.session_id.clone()),
            };
            target.map(Action::RequestDelete)
        }
        TuiEvent::EditLast => {
            if in_chat {
                tui.focus = Focus::Compose;
            }
            Some(Action::StartEdit)
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown => {
            tui.message_list.handle_event(event);
            None
        }
        TuiEvent::FocusNext | TuiEvent::FocusPrev => {
            tui.focus = match tui.focus {
                Focus::Sidebar if in_chat => Focus::Compose,
                _ => Focus::Sidebar,
            };
            None
        }
        TuiEvent::Escape => {
            if app.thread.as_ref().is_some_and(|t| t.is_editing()) {
                Some(Action::CancelEdit)
            } else if in_chat {
                Some(Action::GoHome)
            } else {
                None
            }
        }
        _ => match tui.focus {
            Focus::Sidebar => match tui.sidebar.handle_event(event, app.sessions.sessions())? {
                SidebarEvent::Open(session_id) => Some(Action::SelectSession(session_id)),
            },
            Focus::Compose => match tui.compose.handle_event(event)? {
                TextFieldEvent::Submit(text) => Some(Action::Submit(text)),
                TextFieldEvent::Changed => None,
            },
        },
    }
}

/// Carry out an effect. Returns true when the app should exit.
fn perform(
    effect: Effect,
    app: &App,
    tui: &mut TuiState,
    api: &Arc<dyn ChatApi>,
    tx: &mpsc::Sender<Action>,
) -> bool {
    match effect {
        Effect::None => {}
        Effect::Quit => return true,
        Effect::SeedInput(text) => {
            tui.compose.set_text(&text);
            tui.focus = Focus::Compose;
        }
        Effect::ClearInput => tui.compose.clear(),
        Effect::Login(credentials) => {
            let auth = app.auth.clone();
            let policy = app.email_policy.clone();
            spawn(api, tx, move |api| async move {
                let result = account::login(
                    api.as_ref(),
                    &auth,
                    &policy,
                    &credentials.email,
                    &credentials.password,
                )
                .await;
                Action::LoginFinished(result)
            });
        }
        Effect::Register(credentials) => {
            let policy = app.email_policy.clone();
            spawn(api, tx, move |api| async move {
                let result =
                    account::register(api.as_ref(), &policy, &credentials.email, &credentials.password)
                        .await;
                Action::RegisterFinished(result)
            });
        }
        Effect::LoadSessions => {
            spawn(api, tx, |api| async move {
                Action::SessionsLoaded(api.list_sessions().await)
            });
        }
        Effect::CreateSession(topic) => {
            spawn(api, tx, move |api| async move {
                Action::SessionCreated(api.create_session(&topic).await)
            });
        }
        Effect::DeleteSession(session_id) => {
            spawn(api, tx, move |api| async move {
                let result = api.delete_session(&session_id).await;
                Action::SessionDeleted { session_id, result }
            });
        }
        Effect::LoadHistory(session_id) => {
            tui.message_list.reset();
            tui.compose.clear();
            tui.focus = Focus::Compose;
            tui.sidebar.select_id(app.sessions.sessions(), &session_id);
            spawn(api, tx, move |api| async move {
                let result = api.history(&session_id).await;
                Action::HistoryLoaded { session_id, result }
            });
        }
        Effect::Dispatch(request) => {
            tui.compose.clear();
            tui.message_list.stick_to_bottom = true;
            spawn(api, tx, move |api| async move {
                let result = request.dispatch(api.as_ref()).await;
                Action::SubmitFinished {
                    session_id: request.session_id,
                    request_id: request.id,
                    result,
                }
            });
        }
    }
    false
}

/// Run `task` on the runtime and send its resulting action back to the loop.
fn spawn<F, Fut>(api: &Arc<dyn ChatApi>, tx: &mpsc::Sender<Action>, task: F)
where
    F: FnOnce(Arc<dyn ChatApi>) -> Fut,
    Fut: Future<Output = Action> + Send + 'static,
{
    let tx = tx.clone();
    let future = task(api.clone());
    tokio::spawn(async move {
        let action = future.await;
        if tx.send(action).is_err() {
            warn!("Failed to deliver background result: receiver dropped");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Session;
    use crate::core::thread::ChatThread;
    use crate::test_support::{four_turn_thread, signed_in_app, test_app};

    fn type_str(app: &App, tui: &mut TuiState, text: &str) {
        for c in text.chars() {
            map_event(app, tui, &TuiEvent::InputChar(c));
        }
    }

    fn chatting() -> (App, TuiState) {
        let mut app = signed_in_app();
        app.sessions.replace(vec![
            Session {
                session_id: "s1".into(),
                topic: Some("Fees".into()),
            },
            Session {
                session_id: "s2".into(),
                topic: None,
            },
        ]);
        app.route = Route::Chat("s1".into());
        let mut thread = ChatThread::new("s1");
        thread.replace_history(four_turn_thread());
        app.thread = Some(thread);
        let mut tui = TuiState::new("http://localhost:8000");
        tui.focus = Focus::Compose;
        (app, tui)
    }

    #[test]
    fn test_ctrl_c_quits_everywhere() {
        let app = test_app();
        let mut tui = TuiState::new("x");
        assert_eq!(map_event(&app, &mut tui, &TuiEvent::ForceQuit), Some(Action::Quit));
    }

    #[test]
    fn test_login_form_submits_credentials() {
        let app = test_app();
        let mut tui = TuiState::new("x");
        type_str(&app, &mut tui, "me@binus.ac.id");
        assert_eq!(map_event(&app, &mut tui, &TuiEvent::Submit), None);
        type_str(&app, &mut tui, "pw");
        match map_event(&app, &mut tui, &TuiEvent::Submit) {
            Some(Action::SubmitLogin(c)) => {
                assert_eq!(c.email, "me@binus.ac.id");
                assert_eq!(c.password, "pw");
            }
            other => panic!("expected SubmitLogin, got {other:?}"),
        }
    }

    #[test]
    fn test_toggle_auth_mode() {
        let mut app = test_app();
        let mut tui = TuiState::new("x");
        assert_eq!(
            map_event(&app, &mut tui, &TuiEvent::ToggleAuthMode),
            Some(Action::ShowRegister)
        );
        app.route = Route::Register;
        type_str(&app, &mut tui, "a");
        assert!(matches!(
            map_event(&app, &mut tui, &TuiEvent::ToggleAuthMode),
            Some(Action::ShowLogin)
        ));
        assert_eq!(tui.auth_form.email.text(), "");
    }

    #[test]
    fn test_compose_enter_submits() {
        let (app, mut tui) = chatting();
        type_str(&app, &mut tui, "When is the deadline?");
        assert_eq!(
            map_event(&app, &mut tui, &TuiEvent::Submit),
            Some(Action::Submit("When is the deadline?".into()))
        );
    }

    #[test]
    fn test_escape_cancels_edit_before_leaving_chat() {
        let (mut app, mut tui) = chatting();
        app.thread.as_mut().unwrap().start_edit();
        assert_eq!(
            map_event(&app, &mut tui, &TuiEvent::Escape),
            Some(Action::CancelEdit)
        );
        app.thread.as_mut().unwrap().cancel_edit();
        assert_eq!(map_event(&app, &mut tui, &TuiEvent::Escape), Some(Action::GoHome));
    }

    #[test]
    fn test_delete_targets_active_session_from_compose() {
        let (app, mut tui) = chatting();
        assert_eq!(
            map_event(&app, &mut tui, &TuiEvent::DeleteSession),
            Some(Action::RequestDelete("s1".into()))
        );
    }

    #[test]
    fn test_delete_targets_sidebar_selection() {
        let (app, mut tui) = chatting();
        tui.focus = Focus::Sidebar;
        map_event(&app, &mut tui, &TuiEvent::CursorDown);
        assert_eq!(
            map_event(&app, &mut tui, &TuiEvent::DeleteSession),
            Some(Action::RequestDelete("s2".into()))
        );
    }

    #[test]
    fn test_sidebar_enter_selects_session() {
        let (mut app, mut tui) = chatting();
        app.route = Route::Home;
        app.thread = None;
        tui.focus = Focus::Sidebar;
        map_event(&app, &mut tui, &TuiEvent::CursorDown);
        assert_eq!(
            map_event(&app, &mut tui, &TuiEvent::Submit),
            Some(Action::SelectSession("s2".into()))
        );
    }

    #[test]
    fn test_tab_only_reaches_compose_in_chat() {
        let (mut app, mut tui) = chatting();
        map_event(&app, &mut tui, &TuiEvent::FocusNext);
        assert_eq!(tui.focus, Focus::Sidebar);
        map_event(&app, &mut tui, &TuiEvent::FocusNext);
        assert_eq!(tui.focus, Focus::Compose);

        app.route = Route::Home;
        tui.focus = Focus::Sidebar;
        map_event(&app, &mut tui, &TuiEvent::FocusNext);
        assert_eq!(tui.focus, Focus::Sidebar);
    }

    #[test]
    fn test_new_chat_modal_routes_typing_to_topic() {
        let (mut app, mut tui) = chatting();
        assert_eq!(
            map_event(&app, &mut tui, &TuiEvent::NewChat),
            Some(Action::OpenNewChat)
        );
        app.modal = Some(Modal::NewChat);
        type_str(&app, &mut tui, "Library");
        assert_eq!(tui.compose.text(), "");
        assert_eq!(
            map_event(&app, &mut tui, &TuiEvent::Submit),
            Some(Action::CreateSession("Library".into()))
        );
        assert_eq!(
            map_event(&app, &mut tui, &TuiEvent::Escape),
            Some(Action::DismissModal)
        );
    }

    #[test]
    fn test_confirm_delete_keys() {
        let (mut app, mut tui) = chatting();
        app.modal = Some(Modal::ConfirmDelete {
            session_id: "s1".into(),
            topic: "Fees".into(),
        });
        assert_eq!(
            map_event(&app, &mut tui, &TuiEvent::InputChar('y')),
            Some(Action::ConfirmDelete)
        );
        assert_eq!(
            map_event(&app, &mut tui, &TuiEvent::InputChar('n')),
            Some(Action::DismissModal)
        );
        assert_eq!(map_event(&app, &mut tui, &TuiEvent::InputChar('x')), None);
    }

    #[test]
    fn test_edit_seeds_compose_through_effect() {
        let (mut app, mut tui) = chatting();
        tui.focus = Focus::Sidebar;
        let action = map_event(&app, &mut tui, &TuiEvent::EditLast).unwrap();
        assert_eq!(tui.focus, Focus::Compose);
        let effect = update(&mut app, action);
        assert_eq!(effect, Effect::SeedInput("C".into()));
    }

    #[test]
    fn test_leaving_signed_in_area_resets_fields() {
        let (mut app, mut tui) = chatting();
        tui.compose.set_text("draft");
        update(&mut app, Action::Logout);
        sync_route(false, &app, &mut tui);
        assert_eq!(tui.compose.text(), "");
        assert_eq!(tui.focus, Focus::Sidebar);
        assert!(app.thread.is_none());
    }
}
