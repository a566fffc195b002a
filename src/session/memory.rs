use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::SessionStore;
use crate::models::Session;

/// In-process session store.
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(super::default_ttl())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: Uuid) -> Result<Option<Session>> {
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        let expired = match sessions.get(&id) {
            Some(session) => session.is_expired(Utc::now(), self.ttl),
            None => return Ok(None),
        };

        if expired {
            sessions.remove(&id);
            tracing::debug!("Session {} expired", id);
            return Ok(None);
        }

        Ok(sessions.get(&id).cloned())
    }

    fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn remove(&self, id: Uuid) -> Result<bool> {
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        Ok(sessions.remove(&id).is_some())
    }

    fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now, self.ttl));
        Ok(before - sessions.len())
    }
}
