//! # Application State
//!
//! Everything the client knows, in one struct. No terminal types here;
//! presentation-only state (focus, scroll offsets, input buffers) lives in the
//! `tui` module.
//!
//! ```text
//! App
//! ├── auth: AuthContext          // shared token + status channel
//! ├── email_policy: EmailPolicy  // which addresses may sign in
//! ├── route: Route               // login / register / home / chat(id)
//! ├── sessions: SessionStore     // sidebar list
//! ├── thread: Option<ChatThread> // messages of the open session
//! ├── modal: Option<Modal>       // at most one overlay
//! ├── form: FormState            // auth form feedback
//! └── status_message: String     // status bar text
//! ```
//!
//! State only changes through `update(app, action)` in action.rs.

use crate::core::auth::AuthContext;
use crate::core::session_store::SessionStore;
use crate::core::thread::ChatThread;
use crate::core::validation::EmailPolicy;

/// Which screen is showing. `Chat` carries the active session id, so "the
/// active session" is always derived from navigation and never stored twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Home,
    Chat(String),
}

impl Route {
    /// Screens reachable without a token.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    /// Ask for the topic of a new session.
    NewChat,
    ConfirmDelete {
        session_id: String,
        topic: String,
    },
    /// One-button notice.
    Alert(String),
    RegisterSuccess,
}

/// Feedback shown under the login/register form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub error: Option<String>,
    /// A login or register request is in flight.
    pub busy: bool,
}

pub struct App {
    pub auth: AuthContext,
    pub email_policy: EmailPolicy,
    pub route: Route,
    pub sessions: SessionStore,
    pub thread: Option<ChatThread>,
    pub modal: Option<Modal>,
    pub form: FormState,
    pub status_message: String,
}

impl App {
    /// A stored token means we start on the home screen.
    pub fn new(auth: AuthContext, email_policy: EmailPolicy) -> Self {
        let route = if auth.is_authenticated() {
            Route::Home
        } else {
            Route::Login
        };
        Self {
            auth,
            email_policy,
            route,
            sessions: SessionStore::new(),
            thread: None,
            modal: None,
            form: FormState::default(),
            status_message: String::from("Welcome!"),
        }
    }

    pub fn active_session_id(&self) -> Option<&str> {
        match &self.route {
            Route::Chat(id) => Some(id),
            _ => None,
        }
    }

    /// The open thread, only if it belongs to `session_id`.
    pub fn thread_for(&mut self, session_id: &str) -> Option<&mut ChatThread> {
        self.thread
            .as_mut()
            .filter(|thread| thread.session_id() == session_id)
    }
}
