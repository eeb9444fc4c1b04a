//! Wire types for the support-bot REST API.
//!
//! Field names follow the server's JSON exactly (`session_id`, `user_input`,
//! `message`), so these structs serialize straight onto the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Label shown for sessions created without a topic.
pub const UNTITLED_SESSION: &str = "Untitled Session";

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of a conversation thread.
///
/// Messages have no identifier of their own; their position in the thread is
/// their identity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub message: String,
    /// Locally inserted placeholder awaiting the real reply. Never on the wire.
    #[serde(skip)]
    pub transient: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            message: text.into(),
            transient: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            message: text.into(),
            transient: false,
        }
    }

    /// An assistant entry shown while the server reply is outstanding.
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self {
            transient: true,
            ..Self::assistant(text)
        }
    }
}

/// A conversation owned by the signed-in user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub topic: Option<String>,
}

impl Session {
    /// Topic for display, falling back to a fixed label when absent or blank.
    pub fn display_topic(&self) -> &str {
        match self.topic.as_deref() {
            Some(topic) if !topic.trim().is_empty() => topic,
            _ => UNTITLED_SESSION,
        }
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize, Debug)]
pub struct CreateSessionRequest<'a> {
    pub topic: &'a str,
}

#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub user_input: &'a str,
}

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Payload returned by `/register`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredUser {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Full thread as returned by history, send and edit calls.
#[derive(Deserialize, Debug)]
pub struct ThreadResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}
