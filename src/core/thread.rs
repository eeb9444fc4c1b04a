//! # Chat Thread
//!
//! The ordered message list of the active session, plus the "edit last
//! message" state machine.
//!
//! ```text
//!            start_edit              submit
//!   Idle ───────────────► Editing ───────────► Sending
//!    ▲  ◄─────────────────   │                    │
//!    │      cancel_edit      │                    │
//!    │                       └──── submit ───────►│
//!    └──────────────── finish (ok or error) ◄─────┘
//! ```
//!
//! Submitting is split in two halves so the event loop never holds the thread
//! across a network await:
//!
//! - [`ChatThread::begin_submit`] applies the optimistic update and returns the
//!   [`SubmitRequest`] to dispatch.
//! - [`ChatThread::finish_submit`] reconciles with the outcome. On success the
//!   server's thread replaces ours wholesale; on failure the placeholder turns
//!   into an error bubble and the user's own text stays visible.
//!
//! [`ChatThread::submit`] runs both halves for callers that can await in place.

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};

use crate::api::{ApiError, ChatApi, Message, Role};

/// Text of the assistant placeholder shown while a reply is outstanding.
pub const THINKING_PLACEHOLDER: &str = "Thinking…";
/// Text that replaces the placeholder when a send or edit fails.
pub const SEND_FAILED: &str = "Error: failed to send message.";

/// Request ids are unique for the whole process, so a reply can never be
/// mistaken for one issued by a later thread of the same session.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    Idle,
    Editing,
    Sending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitKind {
    /// Append a new user turn.
    Send,
    /// Replace the last user turn and regenerate the reply.
    EditLast,
}

/// A network call produced by [`ChatThread::begin_submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub id: u64,
    pub session_id: String,
    pub kind: SubmitKind,
    pub text: String,
}

impl SubmitRequest {
    pub async fn dispatch(&self, api: &dyn ChatApi) -> Result<Vec<Message>, ApiError> {
        match self.kind {
            SubmitKind::Send => api.send_message(&self.session_id, &self.text).await,
            SubmitKind::EditLast => api.edit_last_message(&self.session_id, &self.text).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatThread {
    session_id: String,
    messages: Vec<Message>,
    /// Position of the user message being edited.
    editing_index: Option<usize>,
    /// Full thread as it was when editing started; restored on cancel.
    backup: Vec<Message>,
    /// Id of the send or edit request in flight.
    in_flight: Option<u64>,
}

impl ChatThread {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            editing_index: None,
            backup: Vec::new(),
            in_flight: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.editing_index
    }

    pub fn is_editing(&self) -> bool {
        self.editing_index.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether `request_id` is the request this thread is waiting on.
    pub fn awaits(&self, request_id: u64) -> bool {
        self.in_flight == Some(request_id)
    }

    pub fn state(&self) -> ThreadState {
        if self.is_pending() {
            ThreadState::Sending
        } else if self.editing_index.is_some() {
            ThreadState::Editing
        } else {
            ThreadState::Idle
        }
    }

    /// Most recent message written by the user.
    pub fn last_user_index(&self) -> Option<usize> {
        self.messages.iter().rposition(|m| m.role == Role::User)
    }

    /// Whether the edit affordance should be offered right now.
    pub fn can_edit(&self) -> bool {
        !self.is_pending() && self.editing_index.is_none() && self.last_user_index().is_some()
    }

    /// Fetch the session's full thread and replace local state with it.
    pub async fn load_history(&mut self, api: &dyn ChatApi) -> Result<(), ApiError> {
        let messages = api.history(&self.session_id).await?;
        self.replace_history(messages);
        Ok(())
    }

    /// Adopt a freshly fetched thread. Any edit in progress is abandoned.
    pub fn replace_history(&mut self, messages: Vec<Message>) {
        debug!(
            "Loaded {} messages for session {}",
            messages.len(),
            self.session_id
        );
        self.messages = messages;
        self.editing_index = None;
        self.backup.clear();
    }

    /// Begin editing the last user message.
    ///
    /// Hides everything after that message and returns its text so the caller
    /// can seed the compose input. Returns `None` (and changes nothing) when
    /// there is no user message, an edit is already open, or a request is
    /// pending.
    pub fn start_edit(&mut self) -> Option<String> {
        if self.editing_index.is_some() || self.is_pending() {
            return None;
        }
        let index = self.last_user_index()?;

        self.backup = self.messages.clone();
        self.editing_index = Some(index);
        self.messages.truncate(index + 1);
        Some(self.messages[index].message.clone())
    }

    /// Abandon the edit and restore the exact pre-edit thread.
    /// Returns `false` if no edit was open.
    pub fn cancel_edit(&mut self) -> bool {
        if self.editing_index.take().is_none() {
            return false;
        }
        self.messages = std::mem::take(&mut self.backup);
        true
    }

    /// Optimistic half of a submit. See the module docs.
    ///
    /// Blank text, or a request already in flight, makes this a no-op.
    pub fn begin_submit(&mut self, text: &str) -> Option<SubmitRequest> {
        let text = text.trim();
        if text.is_empty() || self.is_pending() {
            return None;
        }
        let id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        self.in_flight = Some(id);

        let kind = match self.editing_index.take() {
            Some(index) => {
                self.messages.truncate(index + 1);
                match self.messages.get_mut(index) {
                    Some(slot) => *slot = Message::user(text),
                    None => self.messages.push(Message::user(text)),
                }
                self.backup.clear();
                SubmitKind::EditLast
            }
            None => {
                self.messages.push(Message::user(text));
                SubmitKind::Send
            }
        };
        self.messages.push(Message::placeholder(THINKING_PLACEHOLDER));

        Some(SubmitRequest {
            id,
            session_id: self.session_id.clone(),
            kind,
            text: text.to_string(),
        })
    }

    /// Reconciling half of a submit. Always clears the in-flight request;
    /// passes the error through so the caller can react to auth loss.
    ///
    /// Callers holding results from a background task check [`Self::awaits`]
    /// first.
    pub fn finish_submit(
        &mut self,
        outcome: Result<Vec<Message>, ApiError>,
    ) -> Result<(), ApiError> {
        self.in_flight = None;
        match outcome {
            Ok(messages) => {
                self.messages = messages;
                Ok(())
            }
            Err(err) => {
                warn!("Submit failed for session {}: {}", self.session_id, err);
                for message in self.messages.iter_mut().filter(|m| m.transient) {
                    *message = Message::assistant(SEND_FAILED);
                }
                Err(err)
            }
        }
    }

    /// Send (or edit-resend) `text` and reconcile with the server's reply.
    pub async fn submit(&mut self, api: &dyn ChatApi, text: &str) -> Result<(), ApiError> {
        let Some(request) = self.begin_submit(text) else {
            return Ok(());
        };
        let outcome = request.dispatch(api).await;
        self.finish_submit(outcome)
    }
}
