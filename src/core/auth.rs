//! # Auth Context
//!
//! The bearer token is the only piece of process-wide state. It lives here,
//! behind explicit `set` / `clear` / `expire` operations, and every change is
//! published on a `watch` channel so the view layer reacts to "auth lost" in one
//! place instead of checking after each call.
//!
//! ```text
//!   login ok ──► set()    ──► SignedIn
//!   logout   ──► clear()  ──► SignedOut
//!   any 401  ──► expire() ──► Expired
//! ```
//!
//! The token is persisted to `~/.supportchat/access_token` so a restart keeps
//! the user signed in. It is never logged.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info, warn};
use tokio::sync::watch;

use crate::core::config;

/// File name of the persisted token inside the app directory.
pub const TOKEN_FILE: &str = "access_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    SignedIn,
    /// Explicit logout.
    SignedOut,
    /// The server rejected the token (401).
    Expired,
}

// ============================================================================
// Token Store
// ============================================================================

/// Durable storage for the bearer token. `path: None` keeps nothing on disk.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    path: Option<PathBuf>,
}

impl TokenStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// `~/.supportchat/access_token`, or in-memory if there is no home directory.
    pub fn default_location() -> Self {
        match config::app_dir() {
            Some(dir) => Self::at(dir.join(TOKEN_FILE)),
            None => {
                warn!("Could not determine home directory, token will not be persisted");
                Self::in_memory()
            }
        }
    }

    /// Read the stored token. Missing, unreadable or blank files mean "no token".
    pub fn load(&self) -> Option<String> {
        let path = self.path.as_ref()?;
        match fs::read_to_string(path) {
            Ok(contents) => {
                let token = contents.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read token file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write the token with owner-only permissions.
    pub fn save(&self, token: &str) -> io::Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)?;
            file.write_all(token.as_bytes())?;
        }

        #[cfg(not(unix))]
        {
            let mut file = fs::File::create(path)?;
            file.write_all(token.as_bytes())?;
        }

        Ok(())
    }

    pub fn remove(&self) -> io::Result<()> {
        match self.path.as_ref() {
            Some(path) if path.exists() => fs::remove_file(path),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Auth Context
// ============================================================================

struct Inner {
    token: RwLock<Option<String>>,
    store: TokenStore,
    status: watch::Sender<AuthStatus>,
}

/// Shared handle to the current credentials. Clones refer to the same state.
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<Inner>,
}

impl AuthContext {
    /// Build a context, restoring any token already on disk.
    pub fn new(store: TokenStore) -> Self {
        let token = store.load();
        let initial = if token.is_some() {
            AuthStatus::SignedIn
        } else {
            AuthStatus::SignedOut
        };
        if token.is_some() {
            info!("Restored stored credentials");
        }
        let (status, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                token: RwLock::new(token),
                store,
                status,
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(TokenStore::in_memory())
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn status(&self) -> AuthStatus {
        *self.inner.status.borrow()
    }

    /// Receive every status change from now on.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.inner.status.subscribe()
    }

    /// Adopt a freshly issued token and persist it.
    pub fn set(&self, token: String) {
        if let Err(e) = self.inner.store.save(&token) {
            warn!("Failed to persist token: {}", e);
        }
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
        self.publish(AuthStatus::SignedIn);
    }

    /// Logout.
    pub fn clear(&self) {
        self.drop_token();
        self.publish(AuthStatus::SignedOut);
    }

    /// The server no longer accepts the token. Safe to call repeatedly.
    pub fn expire(&self) {
        self.drop_token();
        self.publish(AuthStatus::Expired);
    }

    fn drop_token(&self) {
        let previous = self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            debug!("Dropping credentials");
        }
        if let Err(e) = self.inner.store.remove() {
            warn!("Failed to remove token file: {}", e);
        }
    }

    fn publish(&self, next: AuthStatus) {
        self.inner.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
