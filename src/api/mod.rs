//! # Remote API
//!
//! Everything that talks to the support-bot server lives behind the
//! [`ChatApi`] trait. Controllers in `core` only ever see the trait, so tests
//! can swap in an in-memory fake and the HTTP details stay in `client`.
//!
//! | Operation          | Endpoint                     | Auth   |
//! |--------------------|------------------------------|--------|
//! | register           | `POST /register`             | none   |
//! | login              | `POST /token` (form-encoded) | none   |
//! | list sessions      | `GET /sessions`              | bearer |
//! | create session     | `POST /session`              | bearer |
//! | delete session     | `DELETE /session/{id}`       | bearer |
//! | history            | `GET /history/{id}`          | bearer |
//! | send message       | `POST /chat/{id}`            | bearer |
//! | edit last message  | `POST /chat/{id}/edit_last`  | bearer |

pub mod client;
pub mod error;
pub mod types;

pub use client::{DEFAULT_BASE_URL, HttpApi};
pub use error::ApiError;
pub use types::{Message, RegisteredUser, Role, Session};

use async_trait::async_trait;

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Create an account. Does not sign in.
    async fn register(&self, username: &str, password: &str)
    -> Result<RegisteredUser, ApiError>;

    /// Exchange credentials for a bearer token. The caller decides whether to keep it.
    async fn login(&self, username: &str, password: &str) -> Result<String, ApiError>;

    async fn list_sessions(&self) -> Result<Vec<Session>, ApiError>;

    /// Create a session; the server assigns its id.
    async fn create_session(&self, topic: &str) -> Result<Session, ApiError>;

    async fn delete_session(&self, session_id: &str) -> Result<(), ApiError>;

    async fn history(&self, session_id: &str) -> Result<Vec<Message>, ApiError>;

    /// Append a user turn and return the full updated thread.
    async fn send_message(&self, session_id: &str, text: &str) -> Result<Vec<Message>, ApiError>;

    /// Replace the last user turn, drop everything after it, and return the
    /// full regenerated thread.
    async fn edit_last_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<Vec<Message>, ApiError>;
}
