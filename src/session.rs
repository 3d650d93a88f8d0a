//! Session persistence
//!
//! The session is the one piece of shared mutable state in the client: read
//! by every outgoing request, written on login and cleared on logout or on a
//! 401 response. It is injected into [`crate::ApiClient`] rather than looked
//! up globally.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Persisted credential plus the serialized identity it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Bearer credential
    pub token: String,
    /// Serialized user identity (JSON text), cleared alongside the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl StoredSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Storage for the current session
pub trait SessionStore: Send + Sync {
    /// Current session, if any
    fn get(&self) -> Option<StoredSession>;

    /// Replace the current session
    fn set(&self, session: StoredSession) -> Result<()>;

    /// Remove token and user together
    fn clear(&self) -> Result<()>;

    /// Current bearer token, if any
    fn token(&self) -> Option<String> {
        self.get().map(|s| s.token)
    }
}

/// In-process session store
#[derive(Debug, Default)]
pub struct MemorySession {
    inner: RwLock<Option<StoredSession>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(Some(StoredSession::new(token))),
        }
    }
}

impl SessionStore for MemorySession {
    fn get(&self) -> Option<StoredSession> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    fn set(&self, session: StoredSession) -> Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| ClientError::Session("session lock poisoned".to_string()))?;
        *guard = Some(session);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| ClientError::Session("session lock poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Session persisted as a JSON file with `token` and `user` keys
///
/// A missing or empty file means "no session". An unreadable file is treated
/// the same way so a corrupted session never blocks unauthenticated calls.
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
}

impl FileSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<StoredSession>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let session: StoredSession = serde_json::from_str(&raw)
            .map_err(|e| ClientError::Session(format!("{}: {}", self.path.display(), e)))?;
        Ok(Some(session))
    }
}

impl SessionStore for FileSession {
    fn get(&self) -> Option<StoredSession> {
        match self.load() {
            Ok(session) => session,
            Err(e) => {
                debug!("Ignoring unreadable session file: {}", e);
                None
            }
        }
    }

    fn set(&self, session: StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&session)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
