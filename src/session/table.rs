//! Session storage and read-cursor tracking.

use std::collections::HashMap;
use std::sync::RwLock;

use super::SessionId;
use crate::error::ChardevError;
use crate::Result;

/// One open handle to the device.
///
/// The read cursor is private to the session: it advances only through
/// that session's successful reads and is never shared or reset by
/// writes. A session whose cursor sits past the buffer's current valid
/// length reads end-of-stream until it is closed and reopened.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique identifier.
    pub id: SessionId,
    /// Position of the next read, in bytes from the start of the buffer.
    pub read_offset: usize,
}

impl Session {
    /// Create a new session with its cursor at the start of the buffer.
    pub fn new(id: SessionId) -> Self {
        Self { id, read_offset: 0 }
    }
}

/// Thread-safe table of open sessions.
///
/// The table length is the device's live-session count; removal-based
/// close means the count can never go negative.
#[derive(Debug)]
pub struct SessionTable {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionTable {
    /// Create a new empty session table.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a new session and return its ID.
    pub fn insert(&self) -> Result<SessionId> {
        let id = SessionId::new();
        let session = Session::new(id);

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| ChardevError::LockPoisoned)?;

        sessions.insert(id, session);
        Ok(id)
    }

    /// Remove a session from the table.
    ///
    /// Fails with [`ChardevError::SessionNotFound`] if the session is
    /// unknown or already closed.
    pub fn remove(&self, id: SessionId) -> Result<Session> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| ChardevError::LockPoisoned)?;

        sessions
            .remove(&id)
            .ok_or_else(|| ChardevError::SessionNotFound(id.to_string()))
    }

    /// Check if a session exists.
    pub fn contains(&self, id: SessionId) -> Result<bool> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| ChardevError::LockPoisoned)?;
        Ok(sessions.contains_key(&id))
    }

    /// Get the session's current read cursor.
    pub fn read_offset(&self, id: SessionId) -> Result<usize> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| ChardevError::LockPoisoned)?;

        sessions
            .get(&id)
            .map(|s| s.read_offset)
            .ok_or_else(|| ChardevError::SessionNotFound(id.to_string()))
    }

    /// Advance the session's read cursor by `n` bytes.
    pub fn advance(&self, id: SessionId, n: usize) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| ChardevError::LockPoisoned)?;

        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| ChardevError::SessionNotFound(id.to_string()))?;

        session.read_offset += n;
        Ok(())
    }

    /// Number of open sessions.
    pub fn count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}
