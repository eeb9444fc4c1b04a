//! # Actions
//!
//! Everything that can happen in the client becomes an `Action`.
//! User presses Enter in the compose box? That's `Action::Submit(text)`.
//! The server answers? That's `Action::SubmitFinished { .. }`.
//!
//! `update()` applies an action to the [`App`] and returns an [`Effect`]
//! describing the I/O the event loop should start. No network calls happen
//! here; results come back later as more actions.
//!
//! ```text
//! App + Action  →  update()  →  App' + Effect
//!                                   │
//!                      event loop spawns the call
//!                                   │
//!                     Action::*Finished / *Loaded ──► update()
//! ```
//!
//! Every result action carries the session id it was issued for, so a reply
//! that lands after the user navigated elsewhere is dropped instead of being
//! written into the wrong thread. Chat replies also carry their request id:
//! reopening a session builds a new thread, and only the request that thread
//! is waiting on may finish it. Session results that arrive after sign-out
//! are dropped.

use std::fmt;

use log::{debug, info};

use crate::api::{ApiError, Message, Session};
use crate::core::account::AccountError;
use crate::core::auth::AuthStatus;
use crate::core::state::{App, FormState, Modal, Route};
use crate::core::thread::{ChatThread, SubmitRequest};

pub const CREATE_FAILED: &str = "Failed to create session.";
pub const DELETE_FAILED: &str = "Failed to delete session.";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Login or registration form contents. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Auth
    ShowLogin,
    ShowRegister,
    SubmitLogin(Credentials),
    LoginFinished(Result<(), AccountError>),
    SubmitRegister(Credentials),
    RegisterFinished(Result<(), AccountError>),
    Logout,
    AuthChanged(AuthStatus),

    // Sessions
    SessionsLoaded(Result<Vec<Session>, ApiError>),
    OpenNewChat,
    CreateSession(String),
    SessionCreated(Result<Session, ApiError>),
    RequestDelete(String),
    ConfirmDelete,
    SessionDeleted {
        session_id: String,
        result: Result<(), ApiError>,
    },
    SelectSession(String),
    GoHome,

    // Thread
    HistoryLoaded {
        session_id: String,
        result: Result<Vec<Message>, ApiError>,
    },
    StartEdit,
    CancelEdit,
    Submit(String),
    SubmitFinished {
        session_id: String,
        request_id: u64,
        result: Result<Vec<Message>, ApiError>,
    },

    DismissModal,
    Quit,
}

/// I/O requested by `update()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Quit,
    Login(Credentials),
    Register(Credentials),
    LoadSessions,
    CreateSession(String),
    DeleteSession(String),
    LoadHistory(String),
    /// Run the request and clear the compose input.
    Dispatch(SubmitRequest),
    /// Replace the compose input with this text.
    SeedInput(String),
    ClearInput,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Quit => Effect::Quit,

        // ====================================================================
        // Auth
        // ====================================================================
        Action::ShowLogin => {
            if app.route == Route::Register {
                app.route = Route::Login;
                app.form = FormState::default();
            }
            Effect::None
        }
        Action::ShowRegister => {
            if app.route == Route::Login {
                app.route = Route::Register;
                app.form = FormState::default();
            }
            Effect::None
        }
        Action::SubmitLogin(credentials) => {
            if app.form.busy || app.route != Route::Login {
                return Effect::None;
            }
            let email = credentials.email.trim();
            if let Err(e) = app.email_policy.validate_login(email) {
                app.form.error = Some(e.to_string());
                return Effect::None;
            }
            app.form = FormState {
                error: None,
                busy: true,
            };
            Effect::Login(credentials)
        }
        Action::LoginFinished(result) => {
            app.form.busy = false;
            match result {
                Ok(()) => {
                    app.form.error = None;
                    app.route = Route::Home;
                    app.status_message = String::from("Signed in");
                    Effect::LoadSessions
                }
                Err(e) => {
                    app.form.error = Some(e.to_string());
                    Effect::None
                }
            }
        }
        Action::SubmitRegister(credentials) => {
            if app.form.busy || app.route != Route::Register {
                return Effect::None;
            }
            let email = credentials.email.trim();
            if let Err(e) = app
                .email_policy
                .validate_registration(email, &credentials.password)
            {
                app.form.error = Some(e.to_string());
                return Effect::None;
            }
            app.form = FormState {
                error: None,
                busy: true,
            };
            Effect::Register(credentials)
        }
        Action::RegisterFinished(result) => {
            app.form.busy = false;
            match result {
                Ok(()) => {
                    app.form.error = None;
                    app.modal = Some(Modal::RegisterSuccess);
                }
                Err(e) => app.form.error = Some(e.to_string()),
            }
            Effect::None
        }
        Action::Logout => {
            info!("Logging out");
            app.auth.clear();
            sign_out(app);
            app.status_message = String::from("Logged out");
            Effect::ClearInput
        }
        Action::AuthChanged(status) => match status {
            AuthStatus::SignedIn => Effect::None,
            AuthStatus::SignedOut | AuthStatus::Expired => {
                if app.route.is_public() {
                    return Effect::None;
                }
                sign_out(app);
                if status == AuthStatus::Expired {
                    app.form.error = Some(SESSION_EXPIRED.to_string());
                    app.status_message = String::from("Session expired");
                }
                Effect::ClearInput
            }
        },

        // ====================================================================
        // Sessions
        // ====================================================================
        Action::SessionsLoaded(result) if outlived_sign_in(app, &result) => Effect::None,
        Action::SessionsLoaded(result) => match result {
            Ok(sessions) => {
                app.sessions.replace(sessions);
                Effect::None
            }
            Err(e) => request_failed(app, e, |app, e| {
                app.status_message = format!("Could not load sessions: {e}");
            }),
        },
        Action::OpenNewChat => {
            if app.auth.is_authenticated() && !app.route.is_public() && app.modal.is_none() {
                app.modal = Some(Modal::NewChat);
            }
            Effect::None
        }
        Action::CreateSession(topic) => {
            let topic = topic.trim();
            if topic.is_empty() || app.modal != Some(Modal::NewChat) {
                return Effect::None;
            }
            app.modal = None;
            Effect::CreateSession(topic.to_string())
        }
        Action::SessionCreated(result) if outlived_sign_in(app, &result) => Effect::None,
        Action::SessionCreated(result) => match result {
            Ok(session) => {
                let session_id = session.session_id.clone();
                app.sessions.insert(session);
                open_session(app, session_id)
            }
            Err(e) => request_failed(app, e, |app, _| {
                app.modal = Some(Modal::Alert(CREATE_FAILED.to_string()));
            }),
        },
        Action::RequestDelete(session_id) => {
            if app.modal.is_some() {
                return Effect::None;
            }
            let Some(session) = app.sessions.get(&session_id) else {
                return Effect::None;
            };
            let topic = session
                .topic
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or_default()
                .to_string();
            app.modal = Some(Modal::ConfirmDelete { session_id, topic });
            Effect::None
        }
        Action::ConfirmDelete => match app.modal.take() {
            Some(Modal::ConfirmDelete { session_id, .. }) => Effect::DeleteSession(session_id),
            other => {
                app.modal = other;
                Effect::None
            }
        },
        Action::SessionDeleted { result, .. } if outlived_sign_in(app, &result) => Effect::None,
        Action::SessionDeleted { session_id, result } => match result {
            Ok(()) => {
                app.sessions.remove(&session_id);
                if app.active_session_id() == Some(session_id.as_str()) {
                    app.route = Route::Home;
                    app.thread = None;
                    return Effect::ClearInput;
                }
                Effect::None
            }
            Err(e) => request_failed(app, e, |app, _| {
                app.modal = Some(Modal::Alert(DELETE_FAILED.to_string()));
            }),
        },
        Action::SelectSession(session_id) => {
            if app.route.is_public() || app.active_session_id() == Some(session_id.as_str()) {
                return Effect::None;
            }
            open_session(app, session_id)
        }
        Action::GoHome => {
            if !app.route.is_public() {
                app.route = Route::Home;
                app.thread = None;
            }
            Effect::None
        }

        // ====================================================================
        // Thread
        // ====================================================================
        Action::HistoryLoaded { session_id, result } => {
            if app.thread_for(&session_id).is_none() {
                debug!("Dropping history for inactive session {}", session_id);
                return Effect::None;
            }
            match result {
                Ok(messages) => {
                    // A pending reply brings the whole thread with it.
                    if let Some(thread) = app.thread_for(&session_id)
                        && !thread.is_pending()
                    {
                        thread.replace_history(messages);
                    }
                    Effect::None
                }
                Err(e) => request_failed(app, e, |app, e| {
                    app.status_message = format!("Could not load messages: {e}");
                }),
            }
        }
        Action::StartEdit => match app.thread.as_mut().and_then(ChatThread::start_edit) {
            Some(text) => Effect::SeedInput(text),
            None => Effect::None,
        },
        Action::CancelEdit => match app.thread.as_mut().map(ChatThread::cancel_edit) {
            Some(true) => Effect::ClearInput,
            _ => Effect::None,
        },
        Action::Submit(text) => match app.thread.as_mut().and_then(|t| t.begin_submit(&text)) {
            Some(request) => Effect::Dispatch(request),
            None => Effect::None,
        },
        Action::SubmitFinished {
            session_id,
            request_id,
            result,
        } => {
            let Some(thread) = app
                .thread_for(&session_id)
                .filter(|thread| thread.awaits(request_id))
            else {
                debug!(
                    "Dropping reply {} for session {}: not the request in flight",
                    request_id, session_id
                );
                return Effect::None;
            };
            match thread.finish_submit(result) {
                Ok(()) => Effect::None,
                Err(e) => request_failed(app, e, |_, _| {}),
            }
        }

        Action::DismissModal => {
            if app.modal.take() == Some(Modal::RegisterSuccess) {
                app.route = Route::Login;
                app.form = FormState::default();
            }
            Effect::None
        }
    }
}

fn open_session(app: &mut App, session_id: String) -> Effect {
    debug!("Opening session {}", session_id);
    app.route = Route::Chat(session_id.clone());
    app.thread = Some(ChatThread::new(session_id.clone()));
    Effect::LoadHistory(session_id)
}

/// Drop everything that belongs to the signed-in user and go to login.
fn sign_out(app: &mut App) {
    app.route = Route::Login;
    app.sessions.clear();
    app.thread = None;
    app.modal = None;
    app.form = FormState::default();
}

/// A session result issued for a user who has since signed out. A 401 still
/// goes through so the sign-out it implies is never lost.
fn outlived_sign_in<T>(app: &App, result: &Result<T, ApiError>) -> bool {
    let signed_in = app.auth.is_authenticated() && !app.route.is_public();
    !signed_in && !matches!(result, Err(e) if e.is_unauthorized())
}

/// A 401 means auth was lost: the watch channel already carries `Expired`, but
/// the reducer signs out directly so the order of the two signals never
/// matters. Anything else is handed to `on_error`.
fn request_failed(app: &mut App, error: ApiError, on_error: impl FnOnce(&mut App, &ApiError)) -> Effect {
    if error.is_unauthorized() {
        app.auth.expire();
        return update(app, Action::AuthChanged(AuthStatus::Expired));
    }
    on_error(app, &error);
    Effect::None
}
