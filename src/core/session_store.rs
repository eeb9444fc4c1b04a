//! # Session Store
//!
//! In-memory list of the signed-in user's sessions, in the order the server
//! returns them. Mutations only happen after the server confirms them, so
//! local ids are always server-assigned ids.
//!
//! The async methods call the API and apply the result. The plain `replace` /
//! `insert` / `remove` appliers are what the event loop uses when the call ran
//! on a background task.

use log::debug;

use crate::api::{ApiError, ChatApi, Session};

#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    sessions: Vec<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }

    /// Fetch the full list, replacing what we had.
    pub async fn load(&mut self, api: &dyn ChatApi) -> Result<(), ApiError> {
        let sessions = api.list_sessions().await?;
        self.replace(sessions);
        Ok(())
    }

    /// Create a session and append it once the server has assigned its id.
    pub async fn create(&mut self, api: &dyn ChatApi, topic: &str) -> Result<Session, ApiError> {
        let session = api.create_session(topic).await?;
        self.insert(session.clone());
        Ok(session)
    }

    /// Delete on the server, then drop the local entry.
    /// Navigating away from a deleted active session is the caller's job.
    pub async fn delete(&mut self, api: &dyn ChatApi, session_id: &str) -> Result<(), ApiError> {
        api.delete_session(session_id).await?;
        self.remove(session_id);
        Ok(())
    }

    pub fn replace(&mut self, sessions: Vec<Session>) {
        debug!("Session list replaced ({} sessions)", sessions.len());
        self.sessions = sessions;
    }

    pub fn insert(&mut self, session: Session) {
        self.sessions.push(session);
    }

    /// Returns whether anything was removed.
    pub fn remove(&mut self, session_id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.session_id != session_id);
        self.sessions.len() != before
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
