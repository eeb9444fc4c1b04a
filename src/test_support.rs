//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{ApiError, ChatApi, Message, RegisteredUser, Role, Session};
use crate::core::auth::AuthContext;
use crate::core::state::App;
use crate::core::validation::EmailPolicy;

/// Token handed out by [`FakeApi::login`].
pub const FAKE_TOKEN: &str = "fake-token";

/// In-memory stand-in for the support-bot server.
///
/// Behaves like the real service (server-assigned ids, full-thread replies,
/// edit-last truncation) and records every call so tests can assert that no
/// request was made. Queued failures are returned by the next calls in order.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    sessions: Vec<Session>,
    threads: HashMap<String, Vec<Message>>,
    next_id: usize,
    failures: VecDeque<ApiError>,
    calls: Vec<String>,
}

pub fn reply_to(text: &str) -> String {
    format!("Echo: {text}")
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(self, session_id: &str, topic: Option<&str>) -> Self {
        self.state.lock().unwrap().sessions.push(Session {
            session_id: session_id.to_string(),
            topic: topic.map(str::to_string),
        });
        self
    }

    pub fn with_thread(self, session_id: &str, messages: Vec<Message>) -> Self {
        self.state
            .lock()
            .unwrap()
            .threads
            .insert(session_id.to_string(), messages);
        self
    }

    pub fn fail_next(&self, error: ApiError) {
        self.state.lock().unwrap().failures.push_back(error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn thread(&self, session_id: &str) -> Vec<Message> {
        self.state
            .lock()
            .unwrap()
            .threads
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatApi for FakeApi {
    async fn register(
        &self,
        username: &str,
        _password: &str,
    ) -> Result<RegisteredUser, ApiError> {
        self.record(format!("register {username}"))?;
        Ok(RegisteredUser {
            message: Some("User created".to_string()),
            username: Some(username.to_string()),
        })
    }

    async fn login(&self, username: &str, _password: &str) -> Result<String, ApiError> {
        self.record(format!("login {username}"))?;
        Ok(FAKE_TOKEN.to_string())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError> {
        self.record("list_sessions".to_string())?;
        Ok(self.state.lock().unwrap().sessions.clone())
    }

    async fn create_session(&self, topic: &str) -> Result<Session, ApiError> {
        self.record(format!("create_session {topic}"))?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let session = Session {
            session_id: format!("session-{}", state.next_id),
            topic: Some(topic.to_string()),
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ApiError> {
        self.record(format!("delete_session {session_id}"))?;
        let mut state = self.state.lock().unwrap();
        state.sessions.retain(|s| s.session_id != session_id);
        state.threads.remove(session_id);
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Message>, ApiError> {
        self.record(format!("history {session_id}"))?;
        Ok(self.thread(session_id))
    }

    async fn send_message(&self, session_id: &str, text: &str) -> Result<Vec<Message>, ApiError> {
        self.record(format!("send_message {session_id} {text}"))?;
        let mut state = self.state.lock().unwrap();
        let thread = state.threads.entry(session_id.to_string()).or_default();
        thread.push(Message::user(text));
        thread.push(Message::assistant(reply_to(text)));
        Ok(thread.clone())
    }

    async fn edit_last_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<Vec<Message>, ApiError> {
        self.record(format!("edit_last_message {session_id} {text}"))?;
        let mut state = self.state.lock().unwrap();
        let thread = state.threads.entry(session_id.to_string()).or_default();
        let Some(last_user) = thread.iter().rposition(|m| m.role == Role::User) else {
            return Err(ApiError::Api {
                status: 400,
                message: "No user message found to edit.".to_string(),
            });
        };
        thread.truncate(last_user);
        thread.push(Message::user(text));
        thread.push(Message::assistant(reply_to(text)));
        Ok(thread.clone())
    }
}

/// Creates a signed-out App with an in-memory token store.
pub fn test_app() -> App {
    App::new(AuthContext::in_memory(), EmailPolicy::default())
}

/// Creates an App that already holds a token.
pub fn signed_in_app() -> App {
    let auth = AuthContext::in_memory();
    auth.set(FAKE_TOKEN.to_string());
    App::new(auth, EmailPolicy::default())
}

/// A four-turn thread: user A, assistant B, user C, assistant D.
pub fn four_turn_thread() -> Vec<Message> {
    vec![
        Message::user("A"),
        Message::assistant("B"),
        Message::user("C"),
        Message::assistant("D"),
    ]
}
